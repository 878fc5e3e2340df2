//! Error message templates for failed validate-code calls.

/// Builds the user-facing message from the message the server returned.
pub type ErrorMessageBuilder<'a> = Box<dyn Fn(&str) -> String + Send + Sync + 'a>;

pub fn unknown_code_in_code_system(
    system: &str,
    code: &str,
    base_url: &str,
    server_message: &str,
) -> String {
    format!(
        "Unknown code \"{system}#{code}\". The Remote Terminology server {base_url} returned {server_message}"
    )
}

pub fn unknown_code_in_value_set(
    system: &str,
    code: &str,
    value_set: &str,
    base_url: &str,
    server_message: &str,
) -> String {
    format!(
        "Unknown code \"{system}#{code}\" for ValueSet with URL \"{value_set}\". The Remote Terminology server {base_url} returned {server_message}"
    )
}

/// Select the template for one call: the value-set form when a value set is
/// involved (`value_set` is its identifier), the code-system form otherwise.
pub fn error_message_builder<'a>(
    system: &'a str,
    code: &'a str,
    value_set: Option<&'a str>,
    base_url: &'a str,
) -> ErrorMessageBuilder<'a> {
    match value_set {
        None => Box::new(move |server_message| {
            unknown_code_in_code_system(system, code, base_url, server_message)
        }),
        Some(value_set) => Box::new(move |server_message| {
            unknown_code_in_value_set(system, code, value_set, base_url, server_message)
        }),
    }
}
