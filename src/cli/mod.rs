use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod agenda;
pub mod assist;
pub mod slots;

#[derive(Subcommand)]
enum Command {
    /// Start an interactive scheduling session
    Assist {
        /// Type instead of talking, using the terminal for both sides
        #[arg(long, action, default_value = "false")]
        text: bool,
    },
    /// List open meeting slots for a day
    Slots {
        /// Day to search, in natural language or YYYY-MM-DD
        #[arg(long, default_value = "tomorrow")]
        date: String,

        /// Meeting length in minutes
        #[arg(long, default_value = "30")]
        duration: i64,

        /// Earliest hour to consider (24h clock, fractional allowed)
        #[arg(long)]
        from: Option<f64>,

        /// Latest hour to consider (24h clock, fractional allowed)
        #[arg(long)]
        to: Option<f64>,
    },
    /// Print the agenda for a day
    Agenda {
        /// Day to summarize, in natural language or YYYY-MM-DD
        #[arg(long, default_value = "today")]
        date: String,
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

    match args.command {
        Some(Command::Assist { text }) => {
            assist::run(text).await?;
        }
        Some(Command::Slots {
            date,
            duration,
            from,
            to,
        }) => {
            slots::run(&date, duration, from, to).await?;
        }
        Some(Command::Agenda { date }) => {
            agenda::run(&date).await?;
        }
        None => {}
    }

    Ok(())
}
