use clap::{Parser, Subcommand};

/// Command-line interface definition for rAttendance
/// Offline-first attendance client: check in/out locally, sync when online
#[derive(Parser)]
#[command(
    name = "rattendance",
    version = env!("CARGO_PKG_VERSION"),
    about = "An offline-first attendance CLI: check in/out locally and sync with the server when online",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Override the attendance API endpoint
    #[arg(global = true, long = "endpoint")]
    pub endpoint: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Check in now
    In,

    /// Check out now
    Out,

    /// Show session state, connectivity and today's totals
    Status {
        #[arg(long, default_value_t = 5, help = "Number of recent records to show")]
        recent: usize,
    },

    /// List attendance records
    List {
        #[arg(long, value_name = "YYYY-MM-DD", conflicts_with_all = ["from", "to"], help = "Only records of this day")]
        date: Option<String>,

        #[arg(long, value_name = "YYYY-MM-DD", requires = "to", help = "Start of an inclusive date range")]
        from: Option<String>,

        #[arg(long, value_name = "YYYY-MM-DD", requires = "from", help = "End of an inclusive date range")]
        to: Option<String>,

        #[arg(long, help = "Maximum number of records")]
        limit: Option<usize>,

        #[arg(long, help = "Newest records first")]
        desc: bool,
    },

    /// Worked time today and this week
    Stats,

    /// Synchronize with the server
    Sync {
        #[arg(long, conflicts_with_all = ["download", "replay"], help = "Download then upload; abort on the first failure")]
        full: bool,

        #[arg(long, conflicts_with = "replay", help = "Only download records newer than the last sync")]
        download: bool,

        #[arg(long, help = "Only replay queued offline requests")]
        replay: bool,
    },

    /// Show queued offline requests
    Queue,

    /// Check whether the server is reachable
    Health,

    /// Keep running and sync whenever the server becomes reachable
    Daemon {
        #[arg(long, default_value_t = 60, help = "Connectivity probe interval in seconds")]
        interval: u64,
    },

    /// Delete a record by ID
    Del {
        id: i64,

        #[arg(long, help = "Confirm the deletion without prompting")]
        yes: bool,
    },

    /// Delete every record and queued request
    Reset {
        #[arg(long, help = "Confirm the reset without prompting")]
        yes: bool,
    },

    /// Manage the configuration file (view or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Print or manage the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },
}
