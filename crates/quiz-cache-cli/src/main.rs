//! quiz-cache — entry point.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use quiz_cache::{CancelToken, ConfigOverrides, QuizCacheSync, SyncConfig};
use quiz_cache_cli::commands;

#[derive(Parser)]
#[command(
    name = "quiz-cache",
    about = "Keep a local, versioned copy of the remote quiz document",
    version
)]
struct Cli {
    /// Directory holding the cached document and version.
    /// Also reads from QUIZ_CACHE_DIR.
    #[arg(long, global = true)]
    cache_dir: Option<String>,

    /// URL of the remote quiz document.
    /// Also reads from QUIZ_SOURCE_URL.
    #[arg(long, global = true)]
    url: Option<String>,

    /// Network timeout in seconds.
    /// Also reads from QUIZ_SYNC_TIMEOUT_SECS.
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the remote document and apply it if newer. Ctrl-C cancels.
    Sync,

    /// Print the persisted version (0 if none).
    Version,

    /// Summarise the cached document.
    Show,

    /// Print a random playable quiz from a category.
    Pick {
        /// Category name, matched case-insensitively.
        category: String,
    },

    /// Print a diagnostic report of the cache as JSON.
    Inspect,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   quiz-cache completions bash > ~/.local/share/bash-completion/completions/quiz-cache
    ///   quiz-cache completions zsh > ~/.zfunc/_quiz-cache
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

    let overrides = ConfigOverrides {
        source_url: cli.url,
        cache_dir: cli.cache_dir,
        timeout_secs: cli.timeout_secs,
    };

    let output = match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "quiz-cache", &mut std::io::stdout());
            return Ok(());
        }
        Commands::Sync => {
            let (config, service) = open(&overrides)?;
            let cancel = CancelToken::new();
            let trigger = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupt received, cancelling sync");
                    trigger.cancel();
                }
            });
            commands::sync(&service, config.timeout, &cancel).await?
        }
        Commands::Version => commands::version(&open(&overrides)?.1).await?,
        Commands::Show => commands::show(&open(&overrides)?.1).await?,
        Commands::Pick { category } => commands::pick(&open(&overrides)?.1, &category).await?,
        Commands::Inspect => commands::inspect(&open(&overrides)?.1).await?,
    };

    println!("{output}");
    Ok(())
}

fn open(overrides: &ConfigOverrides) -> anyhow::Result<(SyncConfig, QuizCacheSync)> {
    let config = SyncConfig::resolve(overrides)?;
    let service = QuizCacheSync::from_config(&config)?;
    Ok((config, service))
}
