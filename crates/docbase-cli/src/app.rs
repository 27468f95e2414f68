//! Command dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use docbase::{
    CallContext, Client, ClientConfig, MaybeCollection, MaybeDocument, Precondition, ReadSettings,
};
use tracing_subscriber::EnvFilter;

use crate::cli::{CliArgs, Command, ConfigAction};

/// Initialise tracing-based logging.
///
/// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
pub fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Ignore error if a subscriber is already set (e.g. in tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Loads the configuration and applies command-line overrides.
pub fn resolve_config(args: &CliArgs) -> Result<ClientConfig> {
    let mut config = ClientConfig::load(args.config.as_deref())?;
    if let Some(project) = &args.project {
        config.project_id = project.clone();
    }
    if let Some(database) = &args.database {
        config.database_id = database.clone();
    }
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = endpoint.clone();
    }
    Ok(config)
}

/// Run the CLI with the given arguments.
pub async fn run(args: CliArgs) -> Result<()> {
    init_logging(args.verbose, args.quiet);

    let command = match args.command {
        Some(ref command) => command,
        None => {
            println!(
                "docbase {} (use --help for usage)",
                env!("CARGO_PKG_VERSION")
            );
            return Ok(());
        }
    };

    match command {
        Command::Version => {
            println!("docbase {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Config(cmd) => handle_config(&args, &cmd.command),
        data_command => {
            let client = Client::new(resolve_config(&args)?).await?;
            let result = handle_data(&client, data_command).await;
            client.close()?;
            result
        }
    }
}

async fn handle_data(client: &Client, command: &Command) -> Result<()> {
    let ctx = CallContext::new();
    match command {
        Command::Add { collection, data } => {
            let data = parse_data(data)?;
            let (doc, result) = client
                .collection(collection)
                .add(&ctx, &data)
                .await
                .with_context(|| format!("adding to {collection}"))?;
            println!("{}\t{}", doc.short_path(), result.update_time.to_rfc3339());
        }
        Command::Set { document, data } => {
            let data = parse_data(data)?;
            let result = client.doc(document).set(&ctx, &data).await?;
            println!("{document}\t{}", result.update_time.to_rfc3339());
        }
        Command::Delete {
            document,
            must_exist,
        } => {
            let precondition = if *must_exist {
                Precondition::MustExist
            } else {
                Precondition::None
            };
            client.doc(document).delete(&ctx, precondition).await?;
            println!("deleted {document}");
        }
        Command::Get {
            document,
            read_time,
        } => {
            let settings = read_settings(read_time.as_deref())?;
            let snapshot = client
                .doc(document)
                .with_read_options(settings)
                .get(&ctx)
                .await?;
            let json: serde_json::Map<String, serde_json::Value> = snapshot
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Command::List {
            collection,
            read_time,
        } => {
            let settings = read_settings(read_time.as_deref())?;
            let refs = client
                .collection(collection)
                .with_read_options(settings)
                .document_refs(&ctx)
                .await?;
            for doc in refs {
                println!("{}", doc.short_path());
            }
        }
        Command::Version | Command::Config(_) => {}
    }
    Ok(())
}

fn handle_config(args: &CliArgs, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Path => match ClientConfig::resolve_config_path(args.config.as_deref()) {
            Some(path) => {
                println!("{}", path.display());
                if !path.exists() {
                    eprintln!("(file does not exist; run `docbase config init` to create it)");
                }
                Ok(())
            }
            None => bail!("Could not determine config directory for this platform"),
        },
        ConfigAction::Show => {
            let config = resolve_config(args)?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
        ConfigAction::Init {
            file,
            project,
            force,
        } => {
            let path = config_init(file.as_deref(), project.as_deref(), *force)?;
            println!("Config file created at {}", path.display());
            Ok(())
        }
    }
}

/// Writes a default configuration file and returns its path.
pub fn config_init(file: Option<&str>, project: Option<&str>, force: bool) -> Result<PathBuf> {
    let path = match file {
        Some(p) => PathBuf::from(p),
        None => ClientConfig::default_config_path()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?,
    };

    if path.exists() && !force {
        bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let config = ClientConfig::new(project.unwrap_or_default());
    std::fs::write(&path, config.to_toml_string()?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn parse_data(raw: &str) -> Result<serde_json::Value> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("document data must be valid JSON")?;
    if !value.is_object() {
        bail!("document data must be a JSON object");
    }
    Ok(value)
}

fn read_settings(read_time: Option<&str>) -> Result<ReadSettings> {
    match read_time {
        Some(raw) => {
            let time = DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("invalid read time {raw:?}"))?
                .with_timezone(&Utc);
            Ok(ReadSettings::read_time(time))
        }
        None => Ok(ReadSettings::Latest),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::Parser;

    #[test]
    fn test_parse_data() {
        assert!(parse_data(r#"{"a": 1}"#).is_ok());
        assert!(parse_data("[1]").is_err());
        assert!(parse_data("nope").is_err());
    }

    #[test]
    fn test_read_settings() {
        assert_eq!(read_settings(None).unwrap(), ReadSettings::Latest);
        assert_eq!(
            read_settings(Some("2021-02-20T00:00:00Z")).unwrap(),
            ReadSettings::read_time(Utc.with_ymd_and_hms(2021, 2, 20, 0, 0, 0).unwrap())
        );
        assert!(read_settings(Some("yesterday")).is_err());
    }

    #[test]
    fn test_config_init_and_resolve() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("docbase.toml");
        let file_str = file.to_string_lossy().to_string();

        config_init(Some(&file_str), Some("P"), false).unwrap();
        assert!(config_init(Some(&file_str), None, false).is_err());
        config_init(Some(&file_str), Some("Q"), true).unwrap();

        let args = CliArgs::parse_from(["docbase", "--config", &file_str, "-d", "orders"]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.project_id, "Q");
        assert_eq!(config.database_id, "orders");
    }
}
