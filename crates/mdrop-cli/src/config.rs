use std::path::Path;

use anyhow::{bail, Context};
use mdrop_crypto::{Hasher, HasherKind, MerkleTree, TreeOptions};
use mdrop_types::Allocation;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An allowlist file: tree settings plus the committed allocations.
///
/// ```toml
/// [tree]
/// hasher = "sha256"
/// sort_leaves = false
///
/// [[allocation]]
/// address = "0x94fb..."
/// amount = 55
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropConfig {
    #[serde(default)]
    pub tree: TreeConfig,
    #[serde(default, rename = "allocation")]
    pub allocations: Vec<Allocation>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    #[serde(default)]
    pub hasher: HasherKind,
    #[serde(default)]
    pub sort_leaves: bool,
}

impl DropConfig {
    /// Load from a `.toml` or `.json` file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading allowlist {}", path.display()))?;
        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?,
            _ => toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?,
        };
        debug!(
            path = %path.display(),
            allocations = config.allocations.len(),
            hasher = %config.tree.hasher,
            "loaded allowlist"
        );
        Ok(config)
    }

    /// Encoded leaf payloads in file order.
    pub fn payloads(&self) -> Vec<[u8; Allocation::ENCODED_LEN]> {
        self.allocations.iter().map(Allocation::to_bytes).collect()
    }

    /// Build the commitment tree over every allocation.
    pub fn build_tree(&self) -> anyhow::Result<MerkleTree<Box<dyn Hasher>>> {
        if self.allocations.is_empty() {
            bail!("allowlist has no allocations");
        }
        let options = TreeOptions {
            sort_leaves: self.tree.sort_leaves,
        };
        Ok(MerkleTree::with_options(
            self.tree.hasher.build(),
            &self.payloads(),
            options,
        )?)
    }
}
