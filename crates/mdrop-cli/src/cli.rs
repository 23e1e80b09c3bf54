use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use mdrop_crypto::HasherKind;

#[derive(Parser)]
#[command(
    name = "mdrop",
    about = "Merkle commitments for airdrop allowlists",
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
    /// Build the tree for an allowlist and print its root
    Root(AllowlistArgs),
    /// Print the inclusion proof for one allocation
    Proof(ProofArgs),
    /// Check an allocation against a published root
    Verify(VerifyArgs),
    /// Print every level of the tree
    Levels(AllowlistArgs),
    /// Run the two-entry sample allowlist end to end
    Demo,
}

#[derive(Args)]
pub struct AllowlistArgs {
    /// Allowlist file (.toml or .json)
    pub allowlist: PathBuf,
}

#[derive(Args)]
pub struct ProofArgs {
    /// Allowlist file (.toml or .json)
    pub allowlist: PathBuf,
    /// Position of the allocation in the allowlist
    #[arg(long, conflicts_with_all = ["address", "amount"])]
    pub index: Option<usize>,
    #[arg(long, requires = "amount")]
    pub address: Option<String>,
    #[arg(long, requires = "address")]
    pub amount: Option<u64>,
}

#[derive(Args)]
pub struct VerifyArgs {
    /// Published root, hex
    #[arg(long)]
    pub root: String,
    #[arg(long)]
    pub address: String,
    #[arg(long)]
    pub amount: u64,
    /// Proof entries in order, hex; repeat the flag for each sibling
    #[arg(long = "proof")]
    pub proof: Vec<String>,
    #[arg(long, default_value = "sha256")]
    pub hasher: HasherKind,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_verify_with_repeated_proof() {
        let cli = Cli::parse_from([
            "mdrop", "verify", "--root", "ab", "--address", "0x1", "--amount", "5", "--proof",
            "01", "--proof", "02", "--hasher", "blake3",
        ]);
        match cli.command {
            Command::Verify(args) => {
                assert_eq!(args.proof, vec!["01", "02"]);
                assert_eq!(args.hasher, HasherKind::Blake3);
            }
            _ => panic!("expected verify"),
        }
    }

    #[test]
    fn proof_rejects_index_with_address() {
        let parsed = Cli::try_parse_from([
            "mdrop", "proof", "list.toml", "--index", "0", "--address", "0x1", "--amount", "1",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn global_format_flag() {
        let cli = Cli::parse_from(["mdrop", "--format", "json", "demo"]);
        assert_eq!(cli.format, OutputFormat::Json);
    }
}
