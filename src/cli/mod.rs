use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::core::AppConfig;

pub mod chat;
pub mod history;
pub mod init;
pub mod serve;

#[derive(Subcommand)]
enum Command {
    /// Create the chat history db schema
    Init {},
    /// Run the API server
    Serve {
        /// Set the server host address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Set the server port
        #[arg(long, default_value = "8000")]
        port: String,
    },
    /// Start an interactive chat session in the terminal
    Chat {
        /// Continue an existing session instead of starting a new one
        #[arg(long)]
        session_id: Option<String>,

        /// Keep the conversation in memory only, nothing is written to
        /// the db
        #[arg(long, default_value_t = false)]
        ephemeral: bool,
    },
    /// Print the transcript of a chat session
    History {
        #[arg(long)]
        session_id: String,

        /// Number of most recent messages to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

pub async fn run() -> Result<()> {
    let args = Cli::parse();

    // A missing .env file is fine, everything can come from the
    // environment
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    // Handle each sub command
    match args.command {
        Some(Command::Init {}) => {
            init::run(&config.db_path).await?;
        }
        Some(Command::Serve { host, port }) => {
            serve::run(host, port, config).await?;
        }
        Some(Command::Chat {
            session_id,
            ephemeral,
        }) => {
            chat::run(config, session_id, ephemeral).await?;
        }
        Some(Command::History { session_id, limit }) => {
            history::run(&config.db_path, &session_id, limit).await?;
        }
        None => {}
    }

    Ok(())
}
