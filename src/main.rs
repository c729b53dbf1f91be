use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use rupitz::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Quote an exchange between TZS and IDR
    Convert {
        /// Amount in the source currency
        amount: String,
        /// TZS_TO_IDR or IDR_TO_TZS
        direction: String,
        /// Print a prefilled chat message to confirm the exchange
        #[arg(long)]
        confirm: bool,
    },
    /// Fetch the current USDT→IDR market price
    Market,
    /// Inspect or change administrator settings
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Show the current settings (password masked)
    Show,
    /// Set the USDT→TZS rate
    SetRate {
        /// New USDT→TZS rate
        rate: String,
        /// Administrator password
        #[arg(short, long)]
        secret: String,
    },
}

impl Commands {
    fn into_app_command(self, json: bool) -> rupitz::AppCommand {
        match self {
            Commands::Convert {
                amount,
                direction,
                confirm,
            } => rupitz::AppCommand::Convert {
                amount,
                direction,
                json,
                confirm,
            },
            Commands::Market => rupitz::AppCommand::Market { json },
            Commands::Admin {
                command: AdminCommands::Show,
            } => rupitz::AppCommand::AdminShow { json },
            Commands::Admin {
                command: AdminCommands::SetRate { rate, secret },
            } => rupitz::AppCommand::AdminSetRate { secret, rate, json },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => rupitz::cli::setup::setup(),
        Some(cmd) => {
            rupitz::run_command(cmd.into_app_command(cli.json), cli.config_path.as_deref()).await
        }
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
