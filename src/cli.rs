// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `scenewatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "scenewatch",
    version,
    about = "Development server that compiles scene bundles on demand and rebuilds them as sources change.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Scenewatch.toml` in the current working directory. A
    /// missing default file is not an error; built-in defaults apply.
    #[arg(long, value_name = "PATH", default_value = "Scenewatch.toml")]
    pub config: String,

    /// Override `[server].port`.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Compile a single scene, print the artifact to stdout and exit.
    #[arg(long, value_name = "SCENE")]
    pub once: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SCENEWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate the config, print it, but don't serve anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_no_flags_given() {
        let args = CliArgs::try_parse_from(["scenewatch"]).unwrap();
        assert_eq!(args.config, "Scenewatch.toml");
        assert!(args.port.is_none());
        assert!(args.once.is_none());
        assert!(!args.dry_run);
    }

    #[test]
    fn parses_once_and_port() {
        let args =
            CliArgs::try_parse_from(["scenewatch", "--once", "railroad", "--port", "9000"])
                .unwrap();
        assert_eq!(args.once.as_deref(), Some("railroad"));
        assert_eq!(args.port, Some(9000));
    }
}
