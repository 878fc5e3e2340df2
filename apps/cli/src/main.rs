use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use anyhow::{Context as AnyhowContext, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use serde_json::{json, Value};
use zunder_terminology::{
    ConceptValidationOptions, ExpansionOptions, RemoteTerminologyService, ValidationRequest,
    ValidationSupportContext,
};

mod config;
mod logging;

use crate::config::{Config, Overrides};

#[derive(Parser)]
#[command(
    name = "tx",
    about = "Validate, look up and expand codes on a remote FHIR terminology server",
    version,
    arg_required_else_help = true
)]
struct Cli {
    /// Path to a configuration file (TOML, YAML or JSON). Defaults to ./tx.* if present.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override `server.base_url`.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Override `loinc.base_url`.
    #[arg(long, global = true)]
    loinc_base_url: Option<String>,

    /// Pretty-print JSON output.
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a code against its code system or a value set.
    ValidateCode {
        /// Code system URI (e.g. http://snomed.info/sct).
        system: String,
        code: String,
        #[arg(long)]
        display: Option<String>,
        /// Canonical URL of the value set to validate against.
        #[arg(long)]
        value_set_url: Option<String>,
        /// Path to a ValueSet JSON file (or "-" for stdin). Supersedes --value-set-url.
        #[arg(long)]
        value_set: Option<PathBuf>,
        /// Leave system inference to the caller; the command then reports no result.
        #[arg(long, action = ArgAction::SetTrue)]
        infer_system: bool,
    },

    /// Look up a concept and its properties.
    Lookup {
        system: String,
        code: String,
        #[arg(long)]
        display_language: Option<String>,
    },

    /// Expand a value set.
    Expand {
        /// Path to a ValueSet JSON file (or "-" for stdin).
        value_set: PathBuf,
        /// Text filter applied by the server.
        #[arg(long)]
        filter: Option<String>,
    },

    /// Fetch a CodeSystem or ValueSet by canonical URL.
    Fetch {
        #[arg(value_enum)]
        kind: ResourceKind,
        url: String,
    },

    /// Check whether the server knows a CodeSystem or ValueSet.
    Supports {
        #[arg(value_enum)]
        kind: ResourceKind,
        url: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ResourceKind {
    CodeSystem,
    ValueSet,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(
        cli.config.as_deref(),
        Overrides {
            base_url: cli.base_url.as_deref(),
            loinc_base_url: cli.loinc_base_url.as_deref(),
        },
    )
    .context("Failed to load configuration")?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    logging::init_logging(&config.logging)?;

    let service = Arc::new(
        RemoteTerminologyService::from_config(&config.terminology())
            .context("Failed to build terminology client")?,
    );
    tracing::debug!(base_url = %service.base_url(), "Terminology client ready");

    match cli.command {
        Commands::ValidateCode {
            system,
            code,
            display,
            value_set_url,
            value_set,
            infer_system,
        } => {
            let mut request = ValidationRequest::new(system, code);
            request.display = display;
            request.value_set_url = value_set_url;
            if let Some(path) = value_set {
                request.inline_value_set = Some(read_json(&path)?);
            }

            let ctx = ValidationSupportContext::new(service.clone());
            let options = ConceptValidationOptions { infer_system };
            let result = service
                .validate_code(&ctx, &options, &request)
                .await
                .context("validate-code failed")?;

            write_output(&result, cli.pretty)?;
            if matches!(&result, Some(r) if !r.ok) {
                process::exit(1);
            }
        }
        Commands::Lookup {
            system,
            code,
            display_language,
        } => {
            let result = service
                .lookup_code(&system, &code, display_language.as_deref())
                .await
                .context("lookup failed")?;
            write_output(&result, cli.pretty)?;
        }
        Commands::Expand { value_set, filter } => {
            let value_set = read_json(&value_set)?;
            let result = service
                .expand_value_set(&ExpansionOptions { filter }, &value_set)
                .await
                .context("expand failed")?;
            write_output(&result.map(|r| r.expanded_value_set), cli.pretty)?;
        }
        Commands::Fetch { kind, url } => {
            let resource = match kind {
                ResourceKind::CodeSystem => service.fetch_code_system(&url).await,
                ResourceKind::ValueSet => service.fetch_value_set(&url).await,
            }
            .with_context(|| format!("Failed to fetch {url}"))?;
            write_output(&resource, cli.pretty)?;
        }
        Commands::Supports { kind, url } => {
            let supported = match kind {
                ResourceKind::CodeSystem => service.is_code_system_supported(&url).await,
                ResourceKind::ValueSet => service.is_value_set_supported(&url).await,
            }
            .with_context(|| format!("Failed to search for {url}"))?;
            write_output(&json!({ "url": url, "supported": supported }), cli.pretty)?;
        }
    }

    Ok(())
}

fn read_json(path: &Path) -> Result<Value> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read JSON resource from stdin")?;
        return serde_json::from_str(&buf).context("stdin resource is not valid JSON");
    }

    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("{:?} is not valid JSON", path))
}

fn write_output<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    if pretty {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", serde_json::to_string(value)?);
    }
    Ok(())
}
