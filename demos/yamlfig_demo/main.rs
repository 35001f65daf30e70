//! # yamlfig demo application
//!
//! A sample CLI tool that shows how to integrate yamlfig into a real
//! application. This is **not** a real app; it exists to demonstrate and
//! manually verify yamlfig's features.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example yamlfig_demo -- echo
//! cargo run --example yamlfig_demo -- config list
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature                  | How to exercise it                                                    |
//! |--------------------------|-----------------------------------------------------------------------|
//! | Defaults + file creation | `cargo run --example yamlfig_demo -- echo` (creates `yamlfig-demo.yml`) |
//! | Prefix substitution      | Edit `prefix:` in the file, then run `echo` twice                     |
//! | Hand edits preserved     | Change `greeting:` in the file, then run `config reload`              |
//! | Placeholders             | `cargo run --example yamlfig_demo -- welcome alice 3`                 |
//! | Diagnostics              | Add an unknown key, run with `RUST_LOG=yamlfig=debug`                 |
//! | `config gen`             | `cargo run --example yamlfig_demo -- config gen`                      |
//! | `config get`             | `cargo run --example yamlfig_demo -- config get server.port`          |
//! | `config list`            | `cargo run --example yamlfig_demo -- config list`                     |
//! | `config reload`          | `cargo run --example yamlfig_demo -- config reload`                   |

mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use yamlfig::{Config, ConfigArgs, SearchPath, Yamlfig};

use config::DemoConfig;

/// yamlfig demo: a sample CLI app for showcasing yamlfig integration.
#[derive(Parser, Debug)]
#[command(name = "yamlfig-demo")]
struct Cli {
    /// Use this config file instead of `yamlfig-demo.yml` in the cwd.
    #[arg(long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print resolved configuration values.
    Echo,
    /// Print the welcome message with its placeholders filled in.
    Welcome { user: String, count: u32 },
    /// Manage the configuration file (list, gen, get, reload).
    Config(ConfigArgs),
}

fn open(cli: &Cli) -> Result<Config, yamlfig::YamlfigError> {
    let builder = Yamlfig::builder(config::schema()).app_name("yamlfig-demo");
    let builder = match &cli.file {
        Some(path) => builder.path(path),
        None => builder.location(SearchPath::Cwd),
    };
    let mut config = builder.build()?;
    if let Some(path) = config.path().map(PathBuf::from) {
        config.reload(&path)?;
    }
    Ok(config)
}

fn echo(config: &Config) {
    let demo: DemoConfig = match config.extract() {
        Ok(demo) => demo,
        Err(e) => {
            eprintln!("Config error:\n{e}");
            std::process::exit(1);
        }
    };
    let mut entries = vec![
        ("prefix".to_string(), demo.prefix),
        ("greeting".to_string(), demo.greeting),
        ("tags".to_string(), demo.tags.join(", ")),
        ("server.host".to_string(), demo.server.host),
        ("server.port".to_string(), demo.server.port.to_string()),
        (
            "server.max_connections".to_string(),
            demo.server.max_connections.to_string(),
        ),
        ("display.color".to_string(), demo.display.color),
    ];
    for (name, profile) in demo.profiles {
        entries.push((format!("profiles.{name}.banner"), profile.banner));
        entries.push((format!("profiles.{name}.verbose"), profile.verbose.to_string()));
    }

    if demo.display.format == "PLAIN" {
        for (key, value) in &entries {
            println!("{key}={value}");
        }
    } else {
        let width = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (key, value) in &entries {
            println!("{key:<width$}  {value}");
        }
    }
    for diagnostic in config.diagnostics() {
        eprintln!("{diagnostic}");
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = open(&cli).unwrap_or_else(|e| {
        eprintln!("Failed to load config:\n{e}");
        std::process::exit(1);
    });

    match cli.command {
        Commands::Echo => echo(&config),
        Commands::Welcome { user, count } => {
            match config.replace("welcome", &[&user, &count]) {
                Ok(text) => println!("{text}"),
                Err(e) => {
                    eprintln!("Config error:\n{e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Config(args) => {
            let action = args.into_action();
            config.handle_and_print(&action).unwrap_or_else(|e| {
                eprintln!("Config error:\n{e}");
                std::process::exit(1);
            });
        }
    }
}
