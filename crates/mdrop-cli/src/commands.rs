use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use mdrop_crypto::{verify_payload, Hasher, MerkleProof, MerkleTree};
use mdrop_types::{Address, Allocation, Digest};
use serde_json::json;

use crate::cli::*;
use crate::config::DropConfig;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = cli.format;
    match cli.command {
        Command::Root(args) => cmd_root(args, format),
        Command::Proof(args) => cmd_proof(args, format),
        Command::Verify(args) => cmd_verify(args, format),
        Command::Levels(args) => cmd_levels(args, format),
        Command::Demo => cmd_demo(format),
    }
}

fn cmd_root(args: AllowlistArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = DropConfig::load(&args.allowlist)?;
    let tree = config.build_tree()?;
    match format {
        OutputFormat::Json => print_json(&json!({
            "root": tree.root(),
            "hasher": tree.hasher().name(),
            "leaves": tree.leaf_count(),
            "depth": tree.depth(),
        })),
        OutputFormat::Text => {
            println!("Root: {}", tree.root().to_string().cyan().bold());
            println!("  Hasher: {}", tree.hasher().name());
            println!("  Leaves: {}", tree.leaf_count());
            println!("  Depth: {}", tree.depth());
            Ok(())
        }
    }
}

fn cmd_proof(args: ProofArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = DropConfig::load(&args.allowlist)?;
    let tree = config.build_tree()?;
    let (allocation, leaf, proof) = resolve_proof(&config, &tree, &args)?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "allocation": allocation,
            "leaf": leaf,
            "root": tree.root(),
            "proof": proof,
        })),
        OutputFormat::Text => {
            println!("Allocation: {}", describe(&allocation));
            println!("Leaf: {}", leaf.to_string().yellow());
            println!("Root: {}", tree.root().to_string().cyan());
            print_proof(&proof);
            Ok(())
        }
    }
}

/// Find the allocation named by `--index` (its position in the allowlist
/// file) or by `--address`/`--amount`, and prove its leaf.
///
/// Leaf positions differ from file positions when `sort_leaves` is set, so
/// the lookup always goes through the allocation's payload.
fn resolve_proof<H: Hasher>(
    config: &DropConfig,
    tree: &MerkleTree<H>,
    args: &ProofArgs,
) -> anyhow::Result<(Allocation, Digest, MerkleProof)> {
    let allocation = match (args.index, &args.address, args.amount) {
        (Some(index), _, _) => *config.allocations.get(index).ok_or_else(|| {
            anyhow!(
                "index {index} out of range for {} allocations",
                config.allocations.len()
            )
        })?,
        (None, Some(address), Some(amount)) => parse_allocation(address, amount)?,
        _ => bail!("pass either --index or both --address and --amount"),
    };

    let payload = allocation.to_bytes();
    let proof = tree
        .proof_for_payload(&payload)
        .with_context(|| format!("{} is not in the allowlist", describe(&allocation)))?;
    Ok((allocation, tree.hasher().hash(&payload), proof))
}

fn cmd_verify(args: VerifyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let hasher = args.hasher.build();
    let root = Digest::from_hex(&args.root).context("parsing --root")?;
    let proof = MerkleProof::from_hex(&args.proof).context("parsing --proof")?;
    let allocation = parse_allocation(&args.address, args.amount)?;

    let valid = verify_payload(&hasher, &allocation.to_bytes(), proof.siblings(), &root)?;
    match format {
        OutputFormat::Json => print_json(&json!({
            "allocation": allocation,
            "root": root,
            "valid": valid,
        }))?,
        OutputFormat::Text => print_verdict(&describe(&allocation), valid),
    }
    if !valid {
        bail!("proof does not establish membership under {root}");
    }
    Ok(())
}

fn cmd_levels(args: AllowlistArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = DropConfig::load(&args.allowlist)?;
    let tree = config.build_tree()?;
    match format {
        OutputFormat::Json => print_json(&json!({ "levels": tree.levels() })),
        OutputFormat::Text => {
            for (depth, level) in tree.levels().iter().enumerate() {
                println!("{} ({} nodes)", format!("Level {depth}").bold(), level.len());
                for node in level {
                    println!("  {node}");
                }
            }
            Ok(())
        }
    }
}

/// The two-entry allowlist the tool ships with as a worked example.
const DEMO_ALLOCATIONS: [(&str, u64); 2] = [
    (
        "0x94fbcf49867fd909e6b2ecf2802c4b2bba7c9b2d50a13abbb75dbae0216db82a",
        55,
    ),
    (
        "0xb4536519beaef9d9207af2b5f83ae35d4ac76cc288ab9004b39254b354149d27",
        27,
    ),
];

fn cmd_demo(format: OutputFormat) -> anyhow::Result<()> {
    let allocations = demo_allocations()?;
    let payloads: Vec<_> = allocations.iter().map(Allocation::to_bytes).collect();
    let tree = MerkleTree::sha256(&payloads)?;

    let right = &allocations[0];
    let proof = tree.proof(0)?;
    let right_valid = tree.verify(&tree.hasher().hash(&right.to_bytes()), &proof)?;

    let wrong = Allocation::new(right.address, right.amount + 1);
    let wrong_valid = tree.verify(&tree.hasher().hash(&wrong.to_bytes()), &proof)?;

    match format {
        OutputFormat::Json => print_json(&json!({
            "root": tree.root(),
            "proof": proof,
            "right_leaf": right_valid,
            "wrong_leaf": wrong_valid,
        })),
        OutputFormat::Text => {
            println!("Root: {}", tree.root().to_string().cyan().bold());
            print_proof(&proof);
            print_verdict(&format!("right leaf {}", describe(right)), right_valid);
            print_verdict(&format!("wrong leaf {}", describe(&wrong)), wrong_valid);
            Ok(())
        }
    }
}

fn demo_allocations() -> anyhow::Result<Vec<Allocation>> {
    DEMO_ALLOCATIONS
        .iter()
        .map(|(address, amount)| parse_allocation(address, *amount))
        .collect()
}

fn parse_allocation(address: &str, amount: u64) -> anyhow::Result<Allocation> {
    let address: Address = address
        .parse()
        .map_err(|e| anyhow!("invalid address {address}: {e}"))?;
    Ok(Allocation::new(address, amount))
}

fn describe(allocation: &Allocation) -> String {
    format!("{} → {}", allocation.address, allocation.amount)
}

fn print_proof(proof: &MerkleProof) {
    println!("Proof ({} entries):", proof.len());
    for (i, sibling) in proof.iter().enumerate() {
        println!("  [{i}] {sibling}");
    }
}

fn print_verdict(subject: &str, valid: bool) {
    if valid {
        println!("{} {subject}", "✓ valid".green().bold());
    } else {
        println!("{} {subject}", "✗ invalid".red().bold());
    }
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
