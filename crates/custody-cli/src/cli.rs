use clap::{Args, Parser, Subcommand};

use custody_core::custody::Role;
use custody_core::VERSION;

/// Custody - chain-of-custody tracking with sealed signatures
#[derive(Parser)]
#[command(name = "custody")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the custody database
    #[arg(short, long, global = true, env = "CUSTODY_DB")]
    pub db: Option<String>,

    /// Acting user ID
    #[arg(long = "as", global = true, env = "CUSTODY_USER", default_value = "cli")]
    pub user: String,

    /// Role of the acting user (admin, user)
    #[arg(long, global = true, env = "CUSTODY_ROLE", default_value = "user")]
    pub role: Role,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Use ASCII symbols instead of Unicode
    #[arg(long, global = true)]
    pub ascii: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new custody database and config file
    Init(InitArgs),

    /// Seal a value with ENCRYPTION_KEY and print the base64 blob
    Seal(SealArgs),

    /// Open a base64 blob sealed with ENCRYPTION_KEY
    Open(OpenArgs),

    /// Manage samples
    #[command(subcommand)]
    Sample(SampleSubcommand),

    /// Record a custody transfer
    Transfer(TransferArgs),

    /// Show the custody history of a sample
    History(HistoryArgs),

    /// Record the final pass/fail result of a sample (admin)
    Result(ResultArgs),

    /// Decrypt the signature on a transfer (admin)
    Signature(SignatureArgs),

    /// Check database integrity
    Check,
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Path where the database will be created
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Config path override
    #[arg(long)]
    pub config_path: Option<String>,

    /// Do not write a config file
    #[arg(long)]
    pub no_config: bool,
}

/// Arguments for the `seal` command
#[derive(Args)]
pub struct SealArgs {
    /// Value to seal (reads stdin when omitted)
    #[arg(long)]
    pub text: Option<String>,
}

/// Arguments for the `open` command
#[derive(Args)]
pub struct OpenArgs {
    /// Base64 blob (reads stdin when omitted)
    #[arg(value_name = "BLOB")]
    pub blob: Option<String>,

    /// Print the plaintext as hex
    #[arg(long)]
    pub hex: bool,
}

#[derive(Subcommand)]
pub enum SampleSubcommand {
    /// Register a new sample
    Create {
        /// Sample label
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// Show a sample
    Show {
        /// Sample ID
        #[arg(value_name = "ID")]
        id: String,
    },

    /// List samples
    List {
        /// Filter by status
        #[arg(long)]
        status: Option<String>,

        /// Include deleted samples
        #[arg(long)]
        all: bool,

        /// Limit number of results
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Hand a sample in for testing
    Submit {
        /// Sample ID
        #[arg(value_name = "ID")]
        id: String,
    },

    /// Soft-delete a sample
    Delete {
        /// Sample ID
        #[arg(value_name = "ID")]
        id: String,
    },
}

/// Arguments for the `transfer` command
#[derive(Args)]
pub struct TransferArgs {
    /// Sample ID
    #[arg(value_name = "SAMPLE_ID")]
    pub sample_id: String,

    /// User handing the sample over (defaults to --as)
    #[arg(long)]
    pub from: Option<String>,

    /// User receiving the sample
    #[arg(long)]
    pub to: Option<String>,

    /// Receiver's signature as text
    #[arg(long, conflicts_with_all = ["signature_hex", "signature_file"])]
    pub signature: Option<String>,

    /// Receiver's signature as hex bytes
    #[arg(long, conflicts_with = "signature_file")]
    pub signature_hex: Option<String>,

    /// File containing the receiver's signature
    #[arg(long)]
    pub signature_file: Option<String>,

    /// Latitude of the handoff
    #[arg(long, requires = "longitude", allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    /// Longitude of the handoff
    #[arg(long, requires = "latitude", allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    /// Time of the handoff (ISO-8601, defaults to now)
    #[arg(long)]
    pub at: Option<String>,
}

/// Arguments for the `history` command
#[derive(Args)]
pub struct HistoryArgs {
    /// Sample ID
    #[arg(value_name = "SAMPLE_ID")]
    pub sample_id: String,
}

/// Arguments for the `result` command
#[derive(Args)]
pub struct ResultArgs {
    /// Sample ID
    #[arg(value_name = "SAMPLE_ID")]
    pub sample_id: String,

    /// Outcome: pass or fail
    #[arg(value_name = "STATUS")]
    pub status: String,

    /// Reviewer notes
    #[arg(long)]
    pub notes: Option<String>,
}

/// Arguments for the `signature` command
#[derive(Args)]
pub struct SignatureArgs {
    /// Transfer ID
    #[arg(value_name = "TRANSFER_ID")]
    pub transfer_id: String,

    /// Print the signature as hex
    #[arg(long)]
    pub hex: bool,
}
