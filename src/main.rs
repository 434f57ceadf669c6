use anyhow::{Context, Result};
use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use tracing::{error, info};

use chatgate::answerer::CombineStrategy;
use chatgate::constants::{DEFAULT_API_BASE, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL, DEFAULT_TOP_K};
use chatgate::web_server::{self, AppState};
use chatgate::{build_bot, chat, AppKind, Gatekeeper, Settings};

// Define the command-line interface structure using clap
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path of the .env file to load before reading the environment.
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    /// Chat-completion model.
    #[arg(long, global = true, env = "OPENAI_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    model: String,

    /// Embedding model used by the docs bot.
    #[arg(long, global = true, env = "OPENAI_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, global = true, env = "OPENAI_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Documents placed in the answer prompt by the docs bot.
    #[arg(long, global = true, default_value_t = DEFAULT_TOP_K)]
    top_k: NonZeroUsize,

    /// How retrieved documents are combined into the prompt.
    #[arg(long, global = true, value_enum, default_value_t = CombineStrategy::Stuff)]
    combine: CombineStrategy,

    #[command(subcommand)]
    command: Commands,
}

// Define the available subcommands
#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Start the login-gated chat web server.
    Start {
        #[arg(value_enum, help = "Which chatbot to serve.")]
        app: AppKind,
        #[arg(long, default_value = "127.0.0.1", help = "Address to bind.")]
        host: IpAddr,
        #[arg(long, default_value_t = 7860, help = "Port for the web server.")]
        port: u16,
        #[arg(long, default_value = "static", help = "Directory served under /static.")]
        static_dir: PathBuf,
    },
    /// Log in and chat with a bot in the terminal.
    Chat {
        #[arg(value_enum, help = "Which chatbot to talk to.")]
        app: AppKind,
    },
}

// The main entry point of the application, using tokio's async runtime
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Reads log level from RUST_LOG environment variable (e.g., RUST_LOG=info,chatgate=debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // API key and login credentials: process env first, then the .env file
    let mut settings = Settings::load(&cli.env_file)
        .with_context(|| format!("Failed to load settings from {}", cli.env_file.display()))?;
    settings.chat_model = cli.model;
    settings.embedding_model = cli.embedding_model;
    settings.api_base = cli.api_base;
    settings.top_k = cli.top_k;
    settings.combine = cli.combine;
    info!("chatgate starting with command: {:?}", cli.command);

    match cli.command {
        Commands::Start { app, host, port, static_dir } => {
            let bot = build_bot(app, &settings)
                .await
                .context("Failed to initialize chat bot")?;
            let gatekeeper = Gatekeeper::new(settings.credentials.clone());
            let state = AppState::new(app, bot, gatekeeper)?;
            let addr = SocketAddr::new(host, port);

            let server = web_server::start_web_server(addr, state, &static_dir);
            tokio::select! {
                res = server => {
                    if let Err(e) = &res {
                        error!("Web server failed: {:?}", e);
                    }
                    res?;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Ctrl-C received, shutting down.");
                }
            }
        }
        Commands::Chat { app } => {
            let bot = build_bot(app, &settings)
                .await
                .context("Failed to initialize chat bot")?;
            let gatekeeper = Gatekeeper::new(settings.credentials.clone());
            println!("## {}", app.title());
            let stdin = std::io::stdin();
            chat::run_terminal_chat(bot.as_ref(), &gatekeeper, stdin.lock(), std::io::stdout())
                .await
                .context("Chat session failed")?;
            info!("Chat session finished.");
        }
    }

    Ok(())
}
