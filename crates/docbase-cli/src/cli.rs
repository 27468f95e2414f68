//! CLI argument parsing and command definitions.

use clap::{Parser, Subcommand};

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "docbase", author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "DOCBASE_CONFIG")]
    pub config: Option<String>,

    /// Project ID, overriding the configuration.
    #[arg(short, long)]
    pub project: Option<String>,

    /// Database ID, overriding the configuration.
    #[arg(short, long)]
    pub database: Option<String>,

    /// REST endpoint, overriding the configuration.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a document with a generated ID.
    Add {
        /// Collection path, e.g. `cities` or `cities/oslo/districts`.
        collection: String,

        /// Document data as a JSON object.
        data: String,
    },

    /// Read a document.
    Get {
        /// Document path, e.g. `cities/oslo`.
        document: String,

        /// Read as of this RFC 3339 timestamp.
        #[arg(long)]
        read_time: Option<String>,
    },

    /// Write a document, replacing existing content.
    Set {
        /// Document path.
        document: String,

        /// Document data as a JSON object.
        data: String,
    },

    /// Delete a document.
    Delete {
        /// Document path.
        document: String,

        /// Fail if the document does not exist.
        #[arg(long)]
        must_exist: bool,
    },

    /// List the document names of a collection.
    List {
        /// Collection path.
        collection: String,

        /// Read as of this RFC 3339 timestamp.
        #[arg(long)]
        read_time: Option<String>,
    },

    /// Print version information.
    Version,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Show the effective configuration.
    Show,

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Project ID to write.
        #[arg(long)]
        project: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_args_default() {
        let args = CliArgs::parse_from(["docbase"]);
        assert!(args.project.is_none());
        assert!(!args.verbose);
        assert!(!args.quiet);
        assert!(args.command.is_none());
    }

    #[test]
    fn test_add_command() {
        let args = CliArgs::parse_from(["docbase", "-p", "P", "add", "cities", r#"{"a":1}"#]);
        assert_eq!(args.project.as_deref(), Some("P"));
        match args.command {
            Some(Command::Add { collection, data }) => {
                assert_eq!(collection, "cities");
                assert_eq!(data, r#"{"a":1}"#);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_get_with_read_time() {
        let args = CliArgs::parse_from([
            "docbase",
            "get",
            "cities/oslo",
            "--read-time",
            "2021-02-20T00:00:00Z",
        ]);
        assert!(matches!(
            args.command,
            Some(Command::Get { ref read_time, .. }) if read_time.as_deref() == Some("2021-02-20T00:00:00Z")
        ));
    }

    #[test]
    fn test_delete_must_exist() {
        let args = CliArgs::parse_from(["docbase", "delete", "cities/oslo", "--must-exist"]);
        assert!(matches!(
            args.command,
            Some(Command::Delete { must_exist: true, .. })
        ));
    }

    #[test]
    fn test_config_init() {
        let args = CliArgs::parse_from(["docbase", "config", "init", "--force", "--project", "P"]);
        match args.command {
            Some(Command::Config(cmd)) => assert!(matches!(
                cmd.command,
                ConfigAction::Init { force: true, ref project, .. } if project.as_deref() == Some("P")
            )),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
