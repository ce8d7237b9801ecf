//! token-vault - keep an API token encrypted at rest and use it for one call
//!
//! The token is encrypted with a key derived from your password and stored
//! in `~/.config/token-vault/api-token.enc`. Every API call asks for the
//! password again; nothing is cached between runs.

mod api;
mod prompt;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use tracing::{info, warn, Level};

use api::ApiClient;
use prompt::CliPrompt;
use vault_core::settings::DEFAULT_APP_NAME;
use vault_core::{
    CredentialManager, PromptBackend, SecureStore, SettingsManager, SetupOutcome, StoreFormat,
    VaultError,
};

const EXAMPLES: &str = "Examples:
  token-vault --setup
  token-vault v2/get-documents
  token-vault v1/get-document-panels --body '{\"document_id\": \"abc\"}'";

/// Query an API with a password-protected bearer token
#[derive(Parser, Debug)]
#[command(name = "token-vault")]
#[command(version)]
#[command(about = "Query an API with an encrypted, password-protected bearer token")]
#[command(after_help = EXAMPLES)]
struct Args {
    /// Encrypt and store your API token (one-time setup)
    #[arg(long, conflicts_with = "endpoint")]
    setup: bool,

    /// API endpoint including version, e.g. v2/get-documents
    #[arg(required_unless_present = "setup")]
    endpoint: Option<String>,

    /// JSON request body
    #[arg(long, default_value = "{}")]
    body: String,

    /// Token file location
    #[arg(long, env = "TOKEN_VAULT_STORE")]
    store: Option<PathBuf>,

    /// Settings file (default: settings.json in the config directory)
    #[arg(long, env = "TOKEN_VAULT_CONFIG")]
    config: Option<PathBuf>,

    /// Token file layout: legacy or v1
    #[arg(long)]
    format: Option<StoreFormat>,

    /// Password prompt: auto, zenity or terminal
    #[arg(long)]
    prompt: Option<PromptBackend>,

    /// API base URL, e.g. https://api.example.com
    #[arg(long, env = "TOKEN_VAULT_API_BASE")]
    base_url: Option<String>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr so stdout carries only the API response
    let level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", failure_message(&err));
            ExitCode::FAILURE
        }
    }
}

/// The single stderr line for a failed run
fn failure_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<VaultError>() {
        Some(VaultError::UserCancelled) => "Cancelled.".to_string(),
        _ => format!("Error: {:#}.", err),
    }
}

/// The stdout line for a finished setup; both outcomes exit successfully
fn setup_message(outcome: &SetupOutcome) -> String {
    match outcome {
        SetupOutcome::Created { path } => {
            format!("Token encrypted and saved to {}", path.display())
        }
        SetupOutcome::Declined => "Aborted.".to_string(),
    }
}

/// Remember the layout a new token file was written in so later unlocks read
/// it the same way. Only the settings-managed store is recorded: settings hold
/// one format, and an explicit `--store` must not change how the default
/// store is decoded. Returns whether settings now match `format`.
///
/// The token file is already on disk at this point, so a failed save is
/// reported and never turns the setup into a failure.
fn record_format(
    settings: &mut SettingsManager,
    format: StoreFormat,
    explicit_store: bool,
) -> bool {
    let previous = settings.get().format;
    if format == previous {
        return true;
    }

    if explicit_store {
        warn!(
            "Settings keep the {} format; pass --format {} when unlocking this token file",
            previous, format
        );
        return false;
    }

    settings.get_mut().format = format;
    match settings.save() {
        Ok(()) => {
            info!("Recorded {} format in {:?}", format, settings.settings_file());
            true
        }
        Err(err) => {
            settings.get_mut().format = previous;
            warn!(
                "Could not record {} format in {:?}: {}; pass --format {} when unlocking",
                format,
                settings.settings_file(),
                err,
                format
            );
            false
        }
    }
}

async fn run(args: Args) -> Result<ExitCode> {
    // Reject a bad body before anyone is asked for a password
    let body: serde_json::Value = if args.setup {
        serde_json::Value::Null
    } else {
        serde_json::from_str(&args.body).context("invalid JSON in --body")?
    };

    let config_dir = SettingsManager::default_config_dir(DEFAULT_APP_NAME)?;
    let mut settings = match &args.config {
        Some(file) => SettingsManager::from_file(&config_dir, file.clone())?,
        None => SettingsManager::new(&config_dir)?,
    };

    let format = args.format.unwrap_or(settings.get().format);
    let explicit_store = args
        .store
        .as_ref()
        .is_some_and(|path| *path != settings.store_path());
    let store_path = args.store.clone().unwrap_or_else(|| settings.store_path());
    let manager = CredentialManager::new(SecureStore::new(store_path).with_format(format));
    let mut prompt = CliPrompt::new(args.prompt.unwrap_or(settings.get().prompt));

    if args.setup {
        let outcome = manager.setup(&mut prompt)?;
        if matches!(outcome, SetupOutcome::Created { .. }) {
            record_format(&mut settings, format, explicit_store);
        }
        println!("{}", setup_message(&outcome));
        return Ok(ExitCode::SUCCESS);
    }

    let endpoint = args
        .endpoint
        .as_deref()
        .context("either --setup or an endpoint is required")?;
    let base_url = args
        .base_url
        .clone()
        .or_else(|| settings.get().api.base_url.clone())
        .context("no API base URL configured; pass --base-url or set api.baseUrl in settings")?;
    let client = ApiClient::new(&base_url, settings.get().api.client_version.clone())?;

    let token = manager.unlock(&mut prompt)?;
    let response = client.post(token.expose(), endpoint, &body).await?;
    drop(token);

    if !response.status.is_success() {
        eprintln!(
            "HTTP {}: {}",
            response.status.as_u16(),
            response.status.canonical_reason().unwrap_or("")
        );
        eprintln!("{}", response.body);
        return Ok(ExitCode::FAILURE);
    }

    println!("{}", response.body);
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tempfile::TempDir;
    use vault_core::ValidationError;

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_setup_flag() {
        let args = Args::try_parse_from(["token-vault", "--setup"]).unwrap();
        assert!(args.setup);
        assert_eq!(args.endpoint, None);
    }

    #[test]
    fn test_endpoint_with_body() {
        let args = Args::try_parse_from([
            "token-vault",
            "v1/get-document-panels",
            "--body",
            r#"{"document_id": "abc"}"#,
        ])
        .unwrap();

        assert!(!args.setup);
        assert_eq!(args.endpoint.as_deref(), Some("v1/get-document-panels"));
        assert_eq!(args.body, r#"{"document_id": "abc"}"#);
    }

    #[test]
    fn test_default_body() {
        let args = Args::try_parse_from(["token-vault", "v2/get-documents"]).unwrap();
        assert_eq!(args.body, "{}");
        assert_eq!(args.verbose, 0);
    }

    #[test]
    fn test_requires_setup_or_endpoint() {
        assert!(Args::try_parse_from(["token-vault"]).is_err());
        assert!(Args::try_parse_from(["token-vault", "--setup", "v2/get-documents"]).is_err());
    }

    #[test]
    fn test_format_and_prompt_values() {
        let args = Args::try_parse_from([
            "token-vault",
            "--setup",
            "--format",
            "v1",
            "--prompt",
            "terminal",
            "-vv",
        ])
        .unwrap();

        assert_eq!(args.format, Some(StoreFormat::Versioned));
        assert_eq!(args.prompt, Some(PromptBackend::Terminal));
        assert_eq!(args.verbose, 2);

        assert!(Args::try_parse_from(["token-vault", "--setup", "--format", "v9"]).is_err());
    }

    #[test]
    fn test_failure_messages() {
        let cancelled = anyhow::Error::from(VaultError::UserCancelled);
        assert_eq!(failure_message(&cancelled), "Cancelled.");

        let wrong = anyhow::Error::from(VaultError::AuthenticationFailed);
        assert_eq!(failure_message(&wrong), "Error: wrong password.");

        let empty = anyhow::Error::from(VaultError::from(ValidationError::EmptyPassword));
        assert_eq!(failure_message(&empty), "Error: empty password.");

        let mismatch = anyhow::Error::from(VaultError::from(ValidationError::PasswordMismatch));
        assert_eq!(failure_message(&mismatch), "Error: passwords do not match.");

        let missing = anyhow::Error::from(VaultError::NotFound {
            path: PathBuf::from("/tmp/api-token.enc"),
        });
        assert_eq!(
            failure_message(&missing),
            "Error: no token file at /tmp/api-token.enc. Run --setup first."
        );
    }

    #[test]
    fn test_failure_message_keeps_context() {
        let err = serde_json::from_str::<serde_json::Value>("{not json")
            .context("invalid JSON in --body")
            .unwrap_err();
        let message = failure_message(&err);

        assert!(message.starts_with("Error: invalid JSON in --body: "));
        assert!(message.ends_with('.'));
    }

    #[test]
    fn test_cancel_inside_context_is_still_cancelled() {
        let err = anyhow::Error::from(VaultError::UserCancelled).context("setup");
        assert_eq!(failure_message(&err), "Cancelled.");
    }

    #[test]
    fn test_setup_messages() {
        let created = SetupOutcome::Created {
            path: PathBuf::from("/tmp/api-token.enc"),
        };
        assert_eq!(
            setup_message(&created),
            "Token encrypted and saved to /tmp/api-token.enc"
        );
        assert_eq!(setup_message(&SetupOutcome::Declined), "Aborted.");
    }

    #[test]
    fn test_record_format_for_default_store() {
        let temp_dir = TempDir::new().unwrap();
        let mut settings = SettingsManager::new(temp_dir.path()).unwrap();

        assert!(record_format(&mut settings, StoreFormat::Versioned, false));

        let reloaded = SettingsManager::new(temp_dir.path()).unwrap();
        assert_eq!(reloaded.get().format, StoreFormat::Versioned);
    }

    #[test]
    fn test_record_format_unchanged_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut settings = SettingsManager::new(temp_dir.path()).unwrap();

        assert!(record_format(&mut settings, StoreFormat::Legacy, false));
        assert!(!settings.settings_file().exists());
    }

    #[test]
    fn test_explicit_store_leaves_settings_format_alone() {
        let temp_dir = TempDir::new().unwrap();
        let mut settings = SettingsManager::new(temp_dir.path()).unwrap();

        assert!(!record_format(&mut settings, StoreFormat::Versioned, true));
        assert_eq!(settings.get().format, StoreFormat::Legacy);
        assert!(!settings.settings_file().exists());

        // The default store is still decoded with its own layout
        let reloaded = SettingsManager::new(temp_dir.path()).unwrap();
        assert_eq!(reloaded.get().format, StoreFormat::Legacy);
    }

    #[test]
    fn test_failed_save_is_not_a_setup_failure() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();
        let mut settings =
            SettingsManager::from_file(temp_dir.path(), blocker.join("settings.json")).unwrap();

        assert!(!record_format(&mut settings, StoreFormat::Versioned, false));
        assert_eq!(settings.get().format, StoreFormat::Legacy);
    }
}
