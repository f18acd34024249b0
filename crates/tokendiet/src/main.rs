// SPDX-FileCopyrightText: 2026 Token-Diet Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token-Diet - answer questions over documents while spending fewer tokens.
//!
//! This is the binary entry point: a thin driver over the agent, retrieval,
//! and provider crates.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod doctor;
mod pipeline;
mod report;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokendiet_config::{ConfigError, TokenDietConfig};

/// Token-Diet - retrieve, route, generate, and evaluate with fewer tokens.
#[derive(Parser, Debug)]
#[command(name = "tokendiet", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract, chunk, and index a document.
    Ingest {
        /// PDF or plain-text document.
        file: PathBuf,
        /// Remove previously indexed chunks of the collection first.
        #[arg(long)]
        fresh: bool,
    },
    /// Answer a question using a document as context.
    ///
    /// The document is indexed into the configured collection, so chunks of
    /// documents ingested earlier remain retrievable. Pass --fresh to answer
    /// from this document alone.
    Ask {
        /// PDF or plain-text document.
        file: PathBuf,
        /// The question to answer.
        question: String,
        /// Print the final run state as JSON.
        #[arg(long)]
        json: bool,
        /// Remove previously indexed chunks of the collection first, so only
        /// this document can be retrieved.
        #[arg(long)]
        fresh: bool,
    },
    /// Check the provider, embedding model, and index.
    Doctor {
        /// Load the embedding model and run a test embedding.
        #[arg(long)]
        deep: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            tokendiet_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Some(Commands::Ingest { file, fresh }) => pipeline::run_ingest(&config, &file, fresh).await,
        Some(Commands::Ask {
            file,
            question,
            json,
            fresh,
        }) => pipeline::run_ask(&config, &file, &question, json, fresh).await,
        Some(Commands::Doctor { deep, plain }) => doctor::run_doctor(&config, deep, plain).await,
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("tokendiet: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<TokenDietConfig, Vec<ConfigError>> {
    match path {
        Some(path) => tokendiet_config::load_and_validate_path(path),
        None => tokendiet_config::load_and_validate(),
    }
}

/// Installs the stderr log subscriber.
///
/// `RUST_LOG` wins over `agent.log_level`. Logs go to stderr so `--json`
/// output on stdout stays machine-readable.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let level = log_level.to_ascii_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,tokendiet={level},tokendiet_agent={level},tokendiet_retrieval={level},\
             tokendiet_router={level},tokendiet_openai={level},tokendiet_cost={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

/// Prints the effective configuration as TOML with the API key masked.
fn print_config(config: &TokenDietConfig) -> Result<(), tokendiet_core::TokenDietError> {
    print!("{}", report::render_config(config)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Only jemalloc supports advancing the stats epoch.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn cli_parses_ask_with_json() {
        let cli = Cli::try_parse_from([
            "tokendiet",
            "ask",
            "doc.pdf",
            "What is the capital of France?",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Ask {
                file,
                question,
                json,
                fresh,
            }) => {
                assert_eq!(file, PathBuf::from("doc.pdf"));
                assert_eq!(question, "What is the capital of France?");
                assert!(json);
                assert!(!fresh);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn cli_accepts_global_config_flag() {
        let cli =
            Cli::try_parse_from(["tokendiet", "ingest", "notes.txt", "--config", "td.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("td.toml")));
        assert!(matches!(cli.command, Some(Commands::Ingest { fresh: false, .. })));
    }

    #[test]
    fn ask_help_explains_shared_collection() {
        use clap::CommandFactory;

        let mut cmd = Cli::command();
        let ask = cmd.find_subcommand_mut("ask").unwrap();
        let long_about = ask.get_long_about().unwrap().to_string();
        assert!(long_about.contains("--fresh"));
        let fresh = ask
            .get_arguments()
            .find(|arg| arg.get_id() == "fresh")
            .unwrap();
        let help = fresh.get_long_help().or(fresh.get_help()).unwrap().to_string();
        assert!(help.contains("only this document"));
    }

    #[test]
    fn cli_rejects_ask_without_question() {
        assert!(Cli::try_parse_from(["tokendiet", "ask", "doc.pdf"]).is_err());
    }

    #[test]
    fn explicit_config_path_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokendiet.toml");
        std::fs::write(&path, "[retrieval]\ntop_k = 5\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.retrieval.top_k, 5);
    }
}
