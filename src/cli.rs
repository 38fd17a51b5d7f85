use clap::{Args, Parser, Subcommand};

/// SOCIO campus events client
#[derive(Parser)]
#[command(name = "socio", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub auth: AuthArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args)]
pub struct AuthArgs {
    /// Signed-in user's email
    #[arg(long, global = true, env = "SOCIO_EMAIL")]
    pub email: Option<String>,

    /// Access token sent as a bearer token
    #[arg(long, global = true, env = "SOCIO_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Detect and save your campus
    Campus {
        #[command(subcommand)]
        command: CampusCommands,
    },

    /// Read and manage notifications
    Notifications {
        #[command(subcommand)]
        command: NotificationCommands,
    },

    /// List the events you registered for
    Registrations,

    /// Show your profile
    Profile,
}

#[derive(Subcommand)]
pub enum CampusCommands {
    /// Run campus detection from a position fix
    Detect {
        #[arg(long, allow_hyphen_values = true, requires = "lng")]
        lat: Option<f64>,
        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lng: Option<f64>,
        /// Prompt even if it was dismissed recently
        #[arg(long)]
        force: bool,
    },
    /// Show saved campus and prompt cooldown
    Status,
    /// List known campuses and the detection radius
    List,
}

#[derive(Subcommand)]
pub enum NotificationCommands {
    /// Print one page of the feed
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Mark one notification read
    Read { id: String },
    /// Mark every notification read
    ReadAll,
    /// Delete one notification
    Dismiss { id: String },
    /// Delete every notification
    DismissAll,
    /// Keep the feed open, polling and accepting commands on stdin
    Watch,
}
