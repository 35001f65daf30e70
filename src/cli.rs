//! Clap adapter for yamlfig.
//!
//! This module is the **optional integration layer** between yamlfig's
//! framework-agnostic core and the [clap](https://docs.rs/clap) CLI parser.
//! It is compiled only when the `clap` Cargo feature is enabled (on by
//! default).
//!
//! [`ConfigArgs`] and [`ConfigSubcommand`] can be embedded directly into a
//! clap `#[derive(Parser)]` struct to get `config list|gen|get|reload`
//! subcommands. [`ConfigArgs::into_action()`] converts them into a
//! [`ConfigAction`](crate::ConfigAction), which
//! [`Config::handle()`](crate::Config::handle) executes.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::types::ConfigAction;

/// Clap-derived args for the `config` subcommand group.
///
/// Embed this into your app's clap derive:
/// ```ignore
/// #[derive(Parser)]
/// struct Cli {
///     #[command(subcommand)]
///     command: Commands,
/// }
///
/// #[derive(Subcommand)]
/// enum Commands {
///     Config(ConfigArgs),
/// }
/// ```
#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigSubcommand>,
}

/// Available config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show all live configuration key-value pairs.
    List,
    /// Generate the default configuration file with all comments.
    Gen {
        /// Write to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the live value and comments for a config key.
    Get {
        /// Dotted key path (e.g. "node-test.node-seq-map.b.some-string").
        key: String,
    },
    /// Reload the config file and write it back with current defaults.
    Reload,
}

impl ConfigArgs {
    /// Convert clap-parsed args into a framework-agnostic `ConfigAction`.
    ///
    /// Bare `config` (no subcommand) and explicit `config list` both map to
    /// `ConfigAction::List`.
    pub fn into_action(self) -> ConfigAction {
        match self.action {
            None | Some(ConfigSubcommand::List) => ConfigAction::List,
            Some(ConfigSubcommand::Gen { output }) => ConfigAction::Gen { output },
            Some(ConfigSubcommand::Get { key }) => ConfigAction::Get { key },
            Some(ConfigSubcommand::Reload) => ConfigAction::Reload,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    /// Wrapper so we can use `try_parse_from` on the subcommand.
    #[derive(Debug, Parser)]
    struct TestCli {
        #[command(flatten)]
        config: ConfigArgs,
    }

    fn parse(args: &[&str]) -> ConfigArgs {
        TestCli::try_parse_from(args).unwrap().config
    }

    #[test]
    fn parse_gen_no_output() {
        let action = parse(&["test", "gen"]).into_action();
        assert_eq!(action, ConfigAction::Gen { output: None });
    }

    #[test]
    fn parse_gen_with_output() {
        let action = parse(&["test", "gen", "-o", "out.yml"]).into_action();
        assert_eq!(
            action,
            ConfigAction::Gen {
                output: Some(PathBuf::from("out.yml"))
            }
        );
    }

    #[test]
    fn parse_gen_with_long_output() {
        let action = parse(&["test", "gen", "--output", "/etc/myapp.yml"]).into_action();
        assert_eq!(
            action,
            ConfigAction::Gen {
                output: Some(PathBuf::from("/etc/myapp.yml"))
            }
        );
    }

    #[test]
    fn parse_get() {
        let action = parse(&["test", "get", "prepend.string-field"]).into_action();
        assert_eq!(
            action,
            ConfigAction::Get {
                key: "prepend.string-field".into(),
            }
        );
    }

    #[test]
    fn parse_reload() {
        let action = parse(&["test", "reload"]).into_action();
        assert_eq!(action, ConfigAction::Reload);
    }

    #[test]
    fn invalid_subcommand_errors() {
        let result = TestCli::try_parse_from(["test", "nope"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_bare_config_is_list() {
        let action = parse(&["test"]).into_action();
        assert_eq!(action, ConfigAction::List);
    }

    #[test]
    fn parse_explicit_list() {
        let action = parse(&["test", "list"]).into_action();
        assert_eq!(action, ConfigAction::List);
    }
}
