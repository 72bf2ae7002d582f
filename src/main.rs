use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use cnb_rates::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for cnb_rates::AppCommand {
    fn from(cmd: Commands) -> cnb_rates::AppCommand {
        match cmd {
            Commands::Serve => cnb_rates::AppCommand::Serve,
            Commands::List => cnb_rates::AppCommand::List,
            Commands::Show { code } => cnb_rates::AppCommand::Show { code },
            Commands::Convert { currency, amount } => {
                cnb_rates::AppCommand::Convert { currency, amount }
            }
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Serve exchange rates over HTTP
    Serve,
    /// Display all exchange rates
    List,
    /// Display the exchange rate for one currency
    Show {
        /// Currency code, e.g. EUR
        code: String,
    },
    /// Convert an amount of a currency into CZK
    Convert {
        /// Currency code, e.g. EUR
        #[arg(long)]
        currency: String,
        /// Amount to convert
        #[arg(long)]
        amount: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => cnb_rates::cli::setup::setup(),
        Some(cmd) => cnb_rates::run_command(cmd.into(), cli.config_path.as_deref()).await,
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
