//! Configuration for the sponsor tree
//!
//! CLI arguments and environment variable handling using clap, plus the
//! `NetworkPolicy` that gathers every scoring and ledger constant in one place.

use clap::{Parser, Subcommand, ValueEnum};

use crate::tree::Mode;
use crate::types::{Result, TreeError};

/// Sponsor tree - placement, balance scoring and point ledger
#[derive(Parser, Debug, Clone)]
#[command(name = "sponsor-tree")]
#[command(about = "Maintenance tool for the sponsor tree and its point ledger")]
pub struct Args {
    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "sponsor_tree")]
    pub mongodb_db: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Scoring and ledger policy
    #[command(flatten)]
    pub policy: PolicyArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Recompute the points of a node's ancestors (or of the node itself if it is a root)
    Recompute {
        /// Node id (hex ObjectId)
        node_id: String,
    },
    /// Per-generation census under a root, bucketed by inherited position
    Report { root_id: String },
    /// Raw node count per generation under a root
    Headcount {
        root_id: String,
        /// Number of generations to count
        #[arg(long)]
        depth: Option<usize>,
    },
    /// Effective ledger balance of a node
    Balance { node_id: String },
    /// Recompute the points of every node
    Reconcile,
}

/// Policy arguments, flattened into `Args`
#[derive(Parser, Debug, Clone)]
pub struct PolicyArgs {
    /// Number of generations counted below an evaluation root
    #[arg(long, env = "GENERATION_HORIZON", default_value = "5")]
    pub generation_horizon: usize,

    /// Points awarded per balanced pair
    #[arg(long, env = "PAIR_REWARD", default_value = "90")]
    pub pair_reward: i64,

    /// Weight of a premium node in the premium generation report
    #[arg(long, env = "PREMIUM_REPORT_WEIGHT", default_value = "3")]
    pub premium_report_weight: u64,

    /// Transferable points a sponsor pays to the admin per registration
    #[arg(long, env = "REGISTRATION_FEE", default_value = "150")]
    pub registration_fee: i64,

    /// Points a new node starts with
    #[arg(long, env = "INITIAL_POINTS", default_value = "0")]
    pub initial_points: i64,

    /// Transferable points a new node starts with
    #[arg(long, env = "INITIAL_POINTS_TO_SEND", default_value = "0")]
    pub initial_points_to_send: i64,

    /// Ledger baseline of normal accounts
    #[arg(long, env = "NORMAL_BASE_OFFSET", default_value = "0", allow_hyphen_values = true)]
    pub normal_base_offset: i64,

    /// Ledger baseline of premium accounts
    #[arg(long, env = "PREMIUM_BASE_OFFSET", default_value = "-1000", allow_hyphen_values = true)]
    pub premium_base_offset: i64,

    /// Generations reported by the raw headcount
    #[arg(long, env = "HEADCOUNT_DEPTH", default_value = "6")]
    pub headcount_depth: usize,

    /// Attempts made when a transfer hits a version conflict
    #[arg(long, env = "TRANSFER_RETRIES", default_value = "3")]
    pub transfer_retries: u32,
}

impl Args {
    /// Build the policy from the parsed arguments
    pub fn policy(&self) -> NetworkPolicy {
        self.policy.clone().into()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.policy().validate()
    }
}

/// Scoring and ledger constants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkPolicy {
    /// Generations below an evaluation root that contribute to its score
    pub generation_horizon: usize,
    /// Points per balanced pair
    pub pair_reward: i64,
    /// Weight of premium contributions in the premium generation report
    pub premium_report_weight: u64,
    /// Transferable points paid to the admin by the sponsor of a registration
    pub registration_fee: i64,
    pub initial_points: i64,
    pub initial_points_to_send: i64,
    /// Ledger baseline of normal accounts
    pub normal_base_offset: i64,
    /// Ledger baseline of premium accounts
    pub premium_base_offset: i64,
    /// Generations reported by the raw headcount
    pub headcount_depth: usize,
    pub transfer_retries: u32,
}

impl Default for NetworkPolicy {
    fn default() -> Self {
        Self {
            generation_horizon: 5,
            pair_reward: 90,
            premium_report_weight: 3,
            registration_fee: 150,
            initial_points: 0,
            initial_points_to_send: 0,
            normal_base_offset: 0,
            premium_base_offset: -1000,
            headcount_depth: 6,
            transfer_retries: 3,
        }
    }
}

impl NetworkPolicy {
    /// Ledger baseline for `mode`
    pub fn base_offset(&self, mode: Mode) -> i64 {
        match mode {
            Mode::Normal => self.normal_base_offset,
            Mode::Premium => self.premium_base_offset,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| -> Result<()> { Err(TreeError::Config(msg.to_string())) };
        if self.generation_horizon == 0 {
            return invalid("GENERATION_HORIZON must be at least 1");
        }
        if self.pair_reward < 0 {
            return invalid("PAIR_REWARD must not be negative");
        }
        if self.registration_fee < 0 {
            return invalid("REGISTRATION_FEE must not be negative");
        }
        if self.transfer_retries == 0 {
            return invalid("TRANSFER_RETRIES must be at least 1");
        }
        Ok(())
    }
}

impl From<PolicyArgs> for NetworkPolicy {
    fn from(args: PolicyArgs) -> Self {
        Self {
            generation_horizon: args.generation_horizon,
            pair_reward: args.pair_reward,
            premium_report_weight: args.premium_report_weight,
            registration_fee: args.registration_fee,
            initial_points: args.initial_points,
            initial_points_to_send: args.initial_points_to_send,
            normal_base_offset: args.normal_base_offset,
            premium_base_offset: args.premium_base_offset,
            headcount_depth: args.headcount_depth,
            transfer_retries: args.transfer_retries,
        }
    }
}
