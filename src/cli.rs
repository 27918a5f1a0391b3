use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "workouts-bot")]
#[command(author, version, about = "Telegram bot for planning and tracking workouts", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot
    Run {
        /// Use webhook mode instead of long polling
        #[arg(long)]
        webhook: bool,
    },

    /// Apply pending database migrations and exit
    Migrate,

    /// Query the health endpoint of a running webhook listener
    HealthCheck {
        /// Listener port (defaults to PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
