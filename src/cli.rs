use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pgforge")]
#[command(version)]
#[command(about = "Configure and provision multi-node Postgres clusters", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Derive a cluster configuration and write it to a cluster directory
    Configure(ConfigureArgs),

    /// Print a previously written cluster configuration
    Show {
        /// Cluster directory (or config.yml path)
        cluster: PathBuf,
    },

    /// Encode a password as a Postgres verifier string
    EncryptPassword(EncryptPasswordArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Configure
// ============================================================================

#[derive(Parser)]
pub struct ConfigureArgs {
    /// Cluster directory to create
    pub cluster: PathBuf,

    /// Replication architecture
    #[arg(short, long, default_value = "bdr")]
    pub architecture: String,

    /// Platform the instances run on
    #[arg(short, long, default_value = "aws")]
    pub platform: String,

    /// Major version of Postgres required
    #[arg(long, value_name = "VER")]
    pub postgres_version: Option<String>,

    /// Major version of BDR required
    #[arg(long, value_name = "VER")]
    pub bdr_version: Option<String>,

    /// Postgres flavour: postgresql, pgextended, or epas
    #[arg(long, default_value = "postgresql")]
    pub postgresql_flavour: String,

    /// Failover manager (harp enables its repository channel)
    #[arg(long, default_value = "none")]
    pub failover_manager: String,

    /// Package repositories to use; always take precedence over derived ones
    #[arg(long = "2q-repositories", value_name = "PATH", num_args = 1..)]
    pub repositories: Vec<String>,

    /// Name of the BDR node group
    #[arg(long, value_name = "NAME", default_value = "bdrgroup")]
    pub bdr_node_group: String,

    /// Name of the BDR-enabled database
    #[arg(long, value_name = "NAME", default_value = "bdrdb")]
    pub bdr_database: String,

    /// Assign instances pairwise as CAMO partners
    #[arg(long)]
    pub enable_camo: bool,

    /// Add pem-agent roles and a dedicated pemserver instance
    #[arg(long)]
    pub enable_pem: bool,

    /// Also run pem-agent on backup instances
    #[arg(long)]
    pub enable_pg_backup_api: bool,

    /// Number of data nodes
    #[arg(long, value_name = "N", default_value = "3")]
    pub data_nodes: u32,

    /// Number of locations to spread the cluster over
    #[arg(long, value_name = "N", default_value = "1",
          value_parser = clap::value_parser!(u32).range(1..))]
    pub locations: u32,

    /// Single region to deploy into
    #[arg(long, value_name = "REGION", conflicts_with = "regions")]
    pub region: Option<String>,

    /// Regions to deploy into, assigned to locations round-robin
    #[arg(long, value_name = "REGION", num_args = 1..)]
    pub regions: Vec<String>,

    /// Instance type
    #[arg(long, value_name = "TYPE", default_value = "t3.micro")]
    pub instance_type: String,

    /// Owner recorded in cluster tags
    #[arg(long)]
    pub owner: Option<String>,

    /// Bucket for cluster artifacts
    #[arg(long)]
    pub cluster_bucket: Option<String>,

    /// OS distribution label or literal image name
    #[arg(long, value_name = "LABEL", default_value = "Debian")]
    pub os: String,

    /// OS version within the distribution
    #[arg(long, value_name = "VER")]
    pub os_version: Option<String>,

    /// Resolve image names to concrete image ids via the platform
    #[arg(long)]
    pub lookup_images: bool,
}

// ============================================================================
// Encrypt-password
// ============================================================================

#[derive(Parser)]
pub struct EncryptPasswordArgs {
    /// Encryption scheme: md5 or scram-sha-256
    pub scheme: String,

    /// Password to encode
    pub password: String,

    /// Username (required by the md5 scheme)
    #[arg(short, long)]
    pub username: Option<String>,
}
