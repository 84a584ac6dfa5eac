mod commands;
mod dashboard;
mod mailto;
mod render;

use clap::{Parser, Subcommand, ValueEnum};
use leadgen_core::{Bucket, DraftKind, FollowUpKind, TargetFilter, TargetPreference};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "leadgen")]
#[command(about = "Find recently launched brands and manage outreach to them")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Sign in; leads are synced to this user's document
    Login {
        /// Opaque user id that keys the remote document
        uid: String,
        /// Display name used when drafting emails
        #[arg(long)]
        name: Option<String>,
    },
    /// Sign out (local data is kept)
    Logout,
    /// Search for new brands and add the unique ones
    Discover {
        /// Free-text query (ignored when --segment is given)
        query: Option<String>,
        /// Use a configured quick segment instead of a query
        #[arg(long, conflicts_with = "query")]
        segment: Option<String>,
        #[arg(long, value_enum, default_value = "both")]
        target: TargetArg,
        /// Niche focus (defaults to LEADGEN_DEFAULT_NICHE)
        #[arg(long)]
        niche: Option<String>,
    },
    /// Look up one specific brand by name
    Lookup { brand: String },
    /// List leads in a bucket
    List {
        #[arg(long, default_value = "active")]
        bucket: Bucket,
        #[arg(long, default_value = "all")]
        target: TargetFilter,
    },
    /// Show one lead (defaults to the selected lead)
    Show { id: Option<String> },
    /// Select a lead for later commands
    Select { id: String },
    /// Find the decision maker for a lead, or for every new lead with --all
    Investigate {
        #[arg(required_unless_present = "all")]
        id: Option<String>,
        #[arg(long, conflicts_with = "id")]
        all: bool,
    },
    Archive { id: Option<String> },
    Unarchive { id: Option<String> },
    /// Toggle a follow-up asset by list position or URL
    Asset {
        selector: String,
        #[arg(long)]
        id: Option<String>,
    },
    /// Generate a draft email
    Draft {
        #[arg(long, default_value = "initial")]
        kind: DraftKind,
        id: Option<String>,
    },
    /// Replace a draft email's text
    EditDraft {
        #[arg(long, default_value = "initial")]
        kind: DraftKind,
        #[arg(long)]
        id: Option<String>,
        text: String,
    },
    /// Print the initial-email mailto link and mark the lead contacted
    Send {
        id: Option<String>,
        /// Open the link with the system mail client
        #[arg(long)]
        open: bool,
    },
    /// Print a follow-up mailto link and record the touch
    FollowUp {
        id: Option<String>,
        #[arg(long, value_enum, default_value = "email")]
        kind: FollowUpArg,
        #[arg(long)]
        note: Option<String>,
        #[arg(long)]
        open: bool,
    },
    /// List quick segments and follow-up assets
    Segments,
    /// Keep syncing and reprint a bucket whenever it changes
    Watch {
        #[arg(long, default_value = "active")]
        bucket: Bucket,
        #[arg(long, default_value = "all")]
        target: TargetFilter,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TargetArg {
    B2b,
    D2c,
    Both,
}

impl From<TargetArg> for TargetPreference {
    fn from(arg: TargetArg) -> Self {
        match arg {
            TargetArg::B2b => TargetPreference::B2b,
            TargetArg::D2c => TargetPreference::D2c,
            TargetArg::Both => TargetPreference::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FollowUpArg {
    Email,
    Video,
    Mixed,
}

impl From<FollowUpArg> for FollowUpKind {
    fn from(arg: FollowUpArg) -> Self {
        match arg {
            FollowUpArg::Email => FollowUpKind::Email,
            FollowUpArg::Video => FollowUpKind::Video,
            FollowUpArg::Mixed => FollowUpKind::Mixed,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = leadgen_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("leadgen ready; run `leadgen --help` for commands");
        return Ok(());
    };

    commands::run(&config, command).await
}
