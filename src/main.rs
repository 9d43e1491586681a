//! history-mapper CLI - follow a method's name across git history

// CLI tools legitimately use print macros for user output
#![allow(clippy::print_stdout, clippy::print_stderr)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use history_mapper::{
    ArtifactQualifiedName, HistoryMapper, MapperConfig, MapperError, SyntaxTokenizer,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// history-mapper - track method identity across commits
#[derive(Parser)]
#[command(
    name = "history-mapper",
    version = env!("HISTORY_MAPPER_LONG_VERSION"),
    about = "Find the name a method carries at another commit",
    long_about = "history-mapper follows a method through renames and moves by comparing the\ntokens of method bodies between consecutive commits."
)]
struct Cli {
    /// Path to config file (default: platform config dir)
    #[arg(long, global = true, env = "HISTORY_MAPPER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map a method's qualified name from one commit to another
    Resolve {
        /// Path to the repository (default: current directory)
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Qualified method name, e.g. "GetterMethod.getStr()"
        #[arg(long)]
        method: String,

        /// Revision the name is valid at
        #[arg(long)]
        from: String,

        /// Revision to map the name to
        #[arg(long, default_value = "HEAD")]
        to: String,

        /// Return the last resolved name when the method is lost
        #[arg(long)]
        best_effort: bool,

        /// Override matching.min_similarity
        #[arg(long)]
        min_similarity: Option<f64>,

        /// Do not look for the method in other files when it leaves its own
        #[arg(long)]
        no_follow_moves: bool,

        /// Print JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// List the methods a file declares at a commit
    Methods {
        /// Path to the repository (default: current directory)
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Revision to read the file at
        #[arg(long, default_value = "HEAD")]
        commit: String,

        /// Path of the file inside the repository
        #[arg(long)]
        file: String,

        /// Print JSON instead of plain text
        #[arg(long)]
        json: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<MapperConfig> {
    let mut config = match path {
        Some(path) => MapperConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => MapperConfig::load_or_default()?,
    };
    config.apply_env_overrides();
    Ok(config)
}

fn run(command: Commands, mut config: MapperConfig) -> Result<ExitCode> {
    match command {
        Commands::Resolve {
            repo,
            method,
            from,
            to,
            best_effort,
            min_similarity,
            no_follow_moves,
            json,
        } => {
            if let Some(min_similarity) = min_similarity {
                config.matching.min_similarity = min_similarity;
            }
            if no_follow_moves {
                config.matching.follow_moves = false;
            }

            let mapper = HistoryMapper::initialize(&repo, SyntaxTokenizer::new(), config)?;
            let old = ArtifactQualifiedName::method(method, from);
            let result = mapper.get_method_qualified_name(&old, &to, best_effort);
            dispose(mapper);
            let resolved = result?;

            if json {
                let output = serde_json::json!({ "from": old, "to": resolved });
                println!("{}", serde_json::to_string_pretty(&output)?);
            }

            match resolved {
                Some(name) => {
                    if !json {
                        println!("{}\t{}", name.identifier, name.commit_id);
                    }
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    if !json {
                        eprintln!("No match for {} at {}", old.identifier, to);
                    }
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Commands::Methods {
            repo,
            commit,
            file,
            json,
        } => {
            let mapper = HistoryMapper::initialize(&repo, SyntaxTokenizer::new(), config)?;
            let result = mapper.methods_at(&commit, &file);
            dispose(mapper);
            let methods = result?;

            if json {
                println!("{}", serde_json::to_string_pretty(&methods)?);
            } else {
                for method in &methods {
                    let tokens = if method.is_degenerate() { 0 } else { method.tokens.len() };
                    println!("{}\t{} tokens", method.identifier(), tokens);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn dispose(mapper: HistoryMapper<SyntaxTokenizer>) {
    if let Err(e) = mapper.dispose() {
        tracing::warn!("Failed to remove mirror: {}", e);
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    // libgit2 and tree-sitter work is blocking
    let outcome = tokio::task::spawn_blocking(move || run(cli.command, config))
        .await
        .context("Mapper task panicked")?;

    match outcome {
        Ok(code) => Ok(code),
        Err(e) => match e.downcast_ref::<MapperError>() {
            Some(mapper_error) if mapper_error.is_user_error() => {
                eprintln!("Error: {}", mapper_error);
                Ok(ExitCode::from(2))
            }
            _ => Err(e),
        },
    }
}
