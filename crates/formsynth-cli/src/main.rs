//! formsynth CLI entry point.

use std::time::Duration;

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use formsynth::http_client::DEFAULT_TIMEOUT_MS;
use formsynth::{HttpClient, LocatorConfig, DEFAULT_MARKER};
use formsynth_cli::commands;
use formsynth_cli::config::{resolve_rules_path, resolve_schema_path};
use formsynth_cli::DocumentPaths;

#[derive(Parser)]
#[command(
    name = "formsynth",
    about = "Extract a survey form's schema, generate rule-driven responses, and submit them",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct DocumentArgs {
    /// Schema document path. Also reads FORMSYNTH_SCHEMA.
    #[arg(long)]
    schema: Option<String>,

    /// Rules document path. Also reads FORMSYNTH_RULES.
    #[arg(long)]
    rules: Option<String>,
}

impl DocumentArgs {
    fn resolve(&self) -> DocumentPaths {
        DocumentPaths {
            schema: resolve_schema_path(self.schema.as_deref()),
            rules: resolve_rules_path(self.rules.as_deref()),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a form, save its schema, and create a rules template if none exists.
    Extract {
        /// Form view URL (ends in /viewform).
        url: String,

        #[command(flatten)]
        docs: DocumentArgs,

        /// Script variable holding the form data.
        #[arg(long, default_value = DEFAULT_MARKER)]
        marker: String,

        /// Request timeout in milliseconds.
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
        timeout_ms: u64,
    },

    /// Create a rules template from the saved schema if none exists.
    Template {
        #[command(flatten)]
        docs: DocumentArgs,
    },

    /// Print generated payloads as JSON lines.
    Generate {
        #[command(flatten)]
        docs: DocumentArgs,

        /// Number of payloads.
        #[arg(long, default_value_t = 1)]
        count: u32,
    },

    /// Generate and submit responses.
    ///
    /// Rejected submissions are counted in the final tally and do not change
    /// the exit status; generation and network errors do.
    Submit {
        /// Form view URL (ends in /viewform).
        url: String,

        #[command(flatten)]
        docs: DocumentArgs,

        /// Number of responses, submitted one after another.
        #[arg(long, default_value_t = 1)]
        count: u32,

        /// Pause between submissions in milliseconds.
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,

        /// Request timeout in milliseconds.
        #[arg(long, default_value_t = DEFAULT_TIMEOUT_MS)]
        timeout_ms: u64,
    },

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   formsynth completions bash > ~/.local/share/bash-completion/completions/formsynth
    ///   formsynth completions zsh > ~/.zfunc/_formsynth
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Extract {
            url,
            docs,
            marker,
            timeout_ms,
        } => {
            let client = HttpClient::new(timeout_ms).context("build HTTP client")?;
            let paths = docs.resolve();
            let schema =
                commands::extract(&client, &url, &paths, &LocatorConfig { marker }).await?;
            println!(
                "Saved {} questions to {}",
                schema.len(),
                paths.schema.display()
            );
        }

        Commands::Template { docs } => {
            let paths = docs.resolve();
            if commands::template(&paths)? {
                println!("Created {}", paths.rules.display());
            } else {
                println!("{} already exists; left unchanged", paths.rules.display());
            }
        }

        Commands::Generate { docs, count } => {
            let paths = docs.resolve();
            let stdout = std::io::stdout();
            commands::generate(&paths, count, &mut stdout.lock())?;
        }

        Commands::Submit {
            url,
            docs,
            count,
            delay_ms,
            timeout_ms,
        } => {
            let client = HttpClient::new(timeout_ms).context("build HTTP client")?;
            let paths = docs.resolve();
            let tally = commands::submit(
                &client,
                &url,
                &paths,
                count,
                Duration::from_millis(delay_ms),
            )
            .await?;
            println!("Accepted: {}  Rejected: {}", tally.accepted, tally.rejected);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "formsynth", &mut std::io::stdout());
        }
    }

    Ok(())
}
