use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "tailchain",
    about = "Signed append-only hash chain, served and replicated over HTTP",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML file with defaults for the flags below
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate an Ed25519 key pair
    Keygen(KeygenArgs),
    /// Append stdin lines to a new chain and serve it
    Serve(ServeArgs),
    /// Replicate a remote chain and print entries as they arrive
    Observe(ObserveArgs),
    /// Replicate a fixed number of entries and audit them
    Verify(VerifyArgs),
}

#[derive(Args)]
pub struct KeygenArgs {
    /// Secret key path; the public key goes to `<out>.pub`
    #[arg(short, long)]
    pub out: PathBuf,
}

#[derive(Args)]
pub struct ServeArgs {
    /// Secret key file
    #[arg(short, long)]
    pub key: Option<PathBuf>,
    /// Address to listen on
    #[arg(short, long)]
    pub listen: Option<SocketAddr>,
}

#[derive(Args)]
pub struct ObserveArgs {
    /// Public key of the remote's signer
    #[arg(short, long)]
    pub key: Option<PathBuf>,
    /// Base URL of the remote, e.g. http://127.0.0.1:6001
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Public key of the remote's signer
    #[arg(short, long)]
    pub key: Option<PathBuf>,
    /// Base URL of the remote
    #[arg(short, long)]
    pub target: Option<String>,
    /// Number of entries to replicate before auditing
    #[arg(short = 'n', long)]
    pub count: usize,
}
