use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dhtkv",
    about = "dhtkv: replicated key-value store on a DHT",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create or show the identity key file for a name and salt
    Keygen(KeygenArgs),
    /// Run an interactive session over a simulated network
    Session(SessionArgs),
    /// Add, update, and read back a value, then print the ledger
    Demo(DemoArgs),
}

#[derive(Args)]
pub struct KeygenArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub salt: String,
    /// Directory holding key files
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}

#[derive(Args)]
pub struct SessionArgs {
    /// Number of simulated nodes
    #[arg(long)]
    pub nodes: Option<usize>,
    /// Fan-out for writes
    #[arg(long)]
    pub copies: Option<usize>,
    /// Keep-alive interval in milliseconds
    #[arg(long)]
    pub refresh: Option<u64>,
    /// Owner name; switches to signed, versioned items
    #[arg(long)]
    pub kname: Option<String>,
    #[arg(long, default_value = "")]
    pub salt: String,
    /// Directory holding key files
    #[arg(long, default_value = ".")]
    pub key_dir: PathBuf,
    /// TOML file with `nodes`, `[store]` and `[table]` settings
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct DemoArgs {
    #[arg(long, default_value = "3")]
    pub nodes: usize,
}
