//! Lookup, expansion and search-backed resource resolution.

mod test_support;

use serde_json::json;
use zunder_terminology::{ConceptProperty, Error, ExpansionOptions, ResourceResolver};

use test_support::{param, service, value_set, StubReply, StubTransport, SNOMED};

const VS_URL: &str = "https://fhir.nhs.uk/ValueSet/clinical-findings";

// ---------------------------------------------------------------------------
// $lookup
// ---------------------------------------------------------------------------

#[tokio::test]
async fn lookup_parses_known_fields_and_properties() {
    let transport = StubTransport::new();
    transport.reply(
        "CodeSystem",
        "lookup",
        StubReply::Ok(json!({
            "resourceType": "Parameters",
            "parameter": [
                {"name": "name", "valueString": "SNOMED CT"},
                {"name": "version", "valueString": "1.0"},
                {"name": "display", "valueString": "Foo"},
                {"name": "code", "valueCode": "present"},
                {"name": "customProp", "valueString": "bar"},
                {"name": "property", "part": [
                    {"name": "code", "valueCode": "parent"},
                    {"name": "value", "valueCode": "404684003"}
                ]}
            ]
        })),
    );

    let result = service(&transport)
        .lookup_code(SNOMED, "present", Some("en-GB"))
        .await
        .unwrap()
        .unwrap();

    assert!(result.found);
    assert_eq!(result.display.as_deref(), Some("Foo"));
    assert_eq!(result.code_system_version.as_deref(), Some("1.0"));
    assert_eq!(result.code_system_display_name.as_deref(), Some("SNOMED CT"));
    assert_eq!(
        result.properties,
        vec![
            ConceptProperty::String {
                name: "customProp".to_string(),
                value: "bar".to_string(),
            },
            ConceptProperty::Coding {
                name: "parent".to_string(),
                system: None,
                code: Some("404684003".to_string()),
                display: None,
            },
        ]
    );
    assert!(result.original_parameters.is_some());

    let call = transport.last_call();
    assert_eq!(call.resource_type, "CodeSystem");
    assert_eq!(call.operation_name, "lookup");
    assert_eq!(param(&call, "system").as_deref(), Some(SNOMED));
    assert_eq!(param(&call, "displayLanguage").as_deref(), Some("en-GB"));
    assert_eq!(param(&call, "property").as_deref(), Some("*"));
}

#[tokio::test]
async fn lookup_not_found_is_a_negative_result() {
    let transport = StubTransport::new();
    transport.reply(
        "CodeSystem",
        "lookup",
        StubReply::NotFound("HTTP 404 Not Found: no such code".to_string()),
    );

    let result = service(&transport)
        .lookup_code(SNOMED, "0000", None)
        .await
        .unwrap()
        .unwrap();

    assert!(!result.found);
    assert_eq!(result.searched_code.as_deref(), Some("0000"));
    assert_eq!(result.searched_system.as_deref(), Some(SNOMED));
}

#[tokio::test]
async fn lookup_propagates_other_failures() {
    let transport = StubTransport::new();
    transport.reply(
        "CodeSystem",
        "lookup",
        StubReply::InvalidRequest("HTTP 400 Bad Request".to_string()),
    );

    let err = service(&transport)
        .lookup_code(SNOMED, "22298006", None)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidRequest(_)));
}

#[tokio::test]
async fn lookup_of_blank_code_makes_no_call() {
    let transport = StubTransport::new();

    let result = service(&transport).lookup_code(SNOMED, "", None).await.unwrap();

    assert!(result.is_none());
    assert!(transport.calls().is_empty());
}

// ---------------------------------------------------------------------------
// $expand
// ---------------------------------------------------------------------------

#[tokio::test]
async fn expand_sends_filter_but_never_url() {
    let transport = StubTransport::new();
    let expanded = json!({
        "resourceType": "ValueSet",
        "url": VS_URL,
        "expansion": {"total": 1, "contains": [{"system": SNOMED, "code": "22298006"}]}
    });
    transport.reply(
        "ValueSet",
        "expand",
        StubReply::Ok(json!({
            "resourceType": "Parameters",
            "parameter": [{"name": "return", "resource": expanded.clone()}]
        })),
    );

    let options = ExpansionOptions {
        filter: Some("infarct".to_string()),
    };
    let outcome = service(&transport)
        .expand_value_set(&options, &value_set(VS_URL))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome.expanded_value_set, expanded);

    let call = transport.last_call();
    assert_eq!(call.parameters.names(), vec!["filter", "valueSet"]);
    assert_eq!(param(&call, "filter").as_deref(), Some("infarct"));
    assert!(call.parameters.get_parameter("url").is_none());
}

#[tokio::test]
async fn expand_without_value_set_in_reply_is_none() {
    let transport = StubTransport::new();
    transport.reply(
        "ValueSet",
        "expand",
        StubReply::Ok(json!({"resourceType": "Parameters", "parameter": []})),
    );

    let outcome = service(&transport)
        .expand_value_set(&ExpansionOptions::default(), &value_set(VS_URL))
        .await
        .unwrap();

    assert!(outcome.is_none());
}

#[tokio::test]
async fn expand_failure_propagates() {
    let transport = StubTransport::new();
    transport.reply(
        "ValueSet",
        "expand",
        StubReply::Unavailable("HTTP 503 Service Unavailable".to_string()),
    );

    let err = service(&transport)
        .expand_value_set(&ExpansionOptions::default(), &value_set(VS_URL))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
}

// ---------------------------------------------------------------------------
// Search-backed resolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_returns_first_match() {
    let transport = StubTransport::new();
    let first = value_set(VS_URL);
    let mut second = value_set(VS_URL);
    second["version"] = json!("2");
    transport.search_result("ValueSet", VS_URL, vec![first.clone(), second]);

    let svc = service(&transport);

    assert_eq!(svc.fetch_value_set(VS_URL).await.unwrap(), Some(first));
    assert!(svc.is_value_set_supported(VS_URL).await.unwrap());
    assert_eq!(
        transport.search_calls()[0],
        ("ValueSet".to_string(), VS_URL.to_string())
    );
}

#[tokio::test]
async fn unknown_code_system_is_unsupported() {
    let transport = StubTransport::new();
    let svc = service(&transport);

    assert_eq!(svc.fetch_code_system(SNOMED).await.unwrap(), None);
    assert!(!svc.is_code_system_supported(SNOMED).await.unwrap());
    assert_eq!(
        transport.search_calls()[0],
        ("CodeSystem".to_string(), SNOMED.to_string())
    );
}

#[tokio::test]
async fn service_acts_as_resolver() {
    let transport = StubTransport::new();
    transport.search_result("ValueSet", VS_URL, vec![value_set(VS_URL)]);
    let resolver: &dyn ResourceResolver = &service(&transport);

    assert!(resolver.fetch_value_set(VS_URL).await.unwrap().is_some());
}

#[tokio::test]
async fn fetch_resource_is_not_supported() {
    let transport = StubTransport::new();

    let resource = service(&transport)
        .fetch_resource("StructureDefinition", "http://hl7.org/fhir/StructureDefinition/Patient")
        .await
        .unwrap();

    assert!(resource.is_none());
    assert!(transport.search_calls().is_empty());
}
