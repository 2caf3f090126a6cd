use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = env!("CARGO_PKG_NAME"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = env!("CARGO_PKG_DESCRIPTION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    /// Directory holding the agenda files, overrides the config file
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone)]
pub enum Command {
    /// Add an appointment
    Add {
        /// Date as YYYY-MM-DD
        date: String,
        /// Time as HH:MM
        time: String,
        /// What the appointment is about
        #[arg(default_value = "")]
        description: String,
    },
    /// Replace an appointment's date, time and description
    Edit {
        /// Appointment id, or its position as shown by `list`
        target: String,
        /// Date as YYYY-MM-DD
        date: String,
        /// Time as HH:MM
        time: String,
        /// What the appointment is about
        #[arg(default_value = "")]
        description: String,
    },
    /// Remove an appointment by id
    Remove {
        /// Appointment id
        id: uuid::Uuid,
    },
    /// Remove every appointment with exactly this date, time and description
    RemoveMatching {
        /// Date as YYYY-MM-DD
        date: String,
        /// Time as HH:MM
        time: String,
        /// Description to match
        #[arg(default_value = "")]
        description: String,
    },
    /// Select a day and list its appointments
    Day {
        /// Date as YYYY-MM-DD, today when omitted
        date: Option<String>,
    },
    /// List today's appointments
    Today,
    /// List all appointments
    List,
    /// Show marked calendar days
    Marks {
        /// Only show this month, as YYYY-MM
        #[arg(long, short)]
        month: Option<String>,
    },
    /// List pending reminders
    Reminders,
    /// Show every reminder that is due as a desktop notification
    Notify,
}
