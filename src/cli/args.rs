use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "soroban-orch")]
#[command(about = "Create wallets, send payments and invoke contracts on a Stellar/Soroban network", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults to ./.soroban-orch.toml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            return Verbosity::Quiet;
        }
        match self.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    Trace,
}

impl Verbosity {
    pub fn to_log_level(self) -> &'static str {
        match self {
            Verbosity::Quiet => "error",
            Verbosity::Normal => "info",
            Verbosity::Verbose => "debug",
            Verbosity::Trace => "trace",
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a new keypair (nothing is stored)
    Wallet,

    /// Ask the test-network faucet to create and fund an account
    Fund(AccountArgs),

    /// Show the native balance of an account
    Balance(AccountArgs),

    /// Look up a transaction by hash
    Tx(TxArgs),

    /// Send a native payment
    Pay(PayArgs),

    /// Invoke a method on the configured contract
    Invoke(InvokeArgs),

    /// Wallet, funding, balance and contract call in one run
    Smoke(SmokeArgs),
}

#[derive(Args)]
pub struct AccountArgs {
    /// Account public key (G...)
    pub public_key: String,
}

#[derive(Args)]
pub struct TxArgs {
    /// Transaction hash (64 hex characters)
    pub hash: String,
}

#[derive(Args)]
pub struct PayArgs {
    /// Secret seed of the paying account (S...)
    #[arg(long, env = "SOROBAN_ORCH_SOURCE_SECRET", hide_env_values = true)]
    pub source_secret: String,

    /// Receiving account (G...)
    #[arg(long)]
    pub destination: String,

    /// Amount in lumens, up to 7 decimal places
    #[arg(long)]
    pub amount: String,

    /// Text memo, at most 28 bytes
    #[arg(long)]
    pub memo: Option<String>,
}

#[derive(Args)]
pub struct InvokeArgs {
    /// Contract method name
    pub method: String,

    /// Arguments as a JSON array, e.g. '[{"type": "u32", "value": 7}, "GABC..."]'
    #[arg(short, long)]
    pub args: Option<String>,
}

#[derive(Args)]
pub struct SmokeArgs {
    /// Contract method to call at the end
    #[arg(long, default_value = "hello")]
    pub method: String,

    /// Skip the faucet step
    #[arg(long)]
    pub skip_fund: bool,
}
