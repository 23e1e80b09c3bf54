use mdrop_types::Digest;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{MerkleError, MerkleResult};
use crate::hasher::Hasher;

/// Merkle inclusion proof.
///
/// The sibling digests met on the way from a leaf to the root, lowest level
/// first. Levels where the path node was promoted without a partner
/// contribute nothing, so a proof can be shorter than the tree depth.
///
/// Proofs carry no left/right information: pairs are always combined in
/// sorted order, so the verifier only needs the sibling values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MerkleProof {
    siblings: Vec<Digest>,
}

impl MerkleProof {
    pub fn new(siblings: Vec<Digest>) -> Self {
        Self { siblings }
    }

    /// Sibling digests, leaf level first.
    pub fn siblings(&self) -> &[Digest] {
        &self.siblings
    }

    pub fn len(&self) -> usize {
        self.siblings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.siblings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Digest> {
        self.siblings.iter()
    }

    /// Hex strings for publication, leaf level first.
    pub fn to_hex(&self) -> Vec<String> {
        self.siblings.iter().map(Digest::to_hex).collect()
    }

    /// Parse a proof from hex strings. Lengths are checked at verification
    /// time, against the hasher in use.
    pub fn from_hex<I, S>(entries: I) -> MerkleResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let siblings = entries
            .into_iter()
            .map(|s| Digest::from_hex(s.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { siblings })
    }

    /// Verify that `leaf` is included under `root`.
    pub fn verify<H: Hasher + ?Sized>(
        &self,
        hasher: &H,
        leaf: &Digest,
        root: &Digest,
    ) -> MerkleResult<bool> {
        verify_proof(hasher, leaf, &self.siblings, root)
    }
}

/// Combine two sibling digests into their parent: `hash(min(a, b) || max(a, b))`.
pub fn combine<H: Hasher + ?Sized>(hasher: &H, a: &Digest, b: &Digest) -> Digest {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = Vec::with_capacity(low.len() + high.len());
    buf.extend_from_slice(low.as_bytes());
    buf.extend_from_slice(high.as_bytes());
    hasher.hash(&buf)
}

/// Verify an inclusion proof without access to the tree.
///
/// Replays the sorted-pair combination from `leaf` through every sibling and
/// compares the result with `root`. A mismatch yields `Ok(false)`. Any digest
/// whose length differs from the hasher's output length is rejected with
/// [`MerkleError::MalformedProof`]. An empty proof is valid; it is what a
/// single-leaf tree produces.
pub fn verify_proof<H: Hasher + ?Sized>(
    hasher: &H,
    leaf: &Digest,
    proof: &[Digest],
    root: &Digest,
) -> MerkleResult<bool> {
    let expected = hasher.output_len();
    for digest in [leaf, root] {
        if digest.len() != expected {
            return Err(MerkleError::MalformedProof {
                position: None,
                expected,
                actual: digest.len(),
            });
        }
    }
    if let Some((position, bad)) = proof
        .iter()
        .enumerate()
        .find(|(_, sibling)| sibling.len() != expected)
    {
        return Err(MerkleError::MalformedProof {
            position: Some(position),
            expected,
            actual: bad.len(),
        });
    }

    let computed = proof
        .iter()
        .fold(leaf.clone(), |current, sibling| combine(hasher, &current, sibling));
    trace!(leaf = %leaf, computed = %computed, root = %root, "replayed proof");
    Ok(computed == *root)
}

/// Hash `payload` with `hasher` and verify the resulting leaf.
pub fn verify_payload<H: Hasher + ?Sized>(
    hasher: &H,
    payload: &[u8],
    proof: &[Digest],
    root: &Digest,
) -> MerkleResult<bool> {
    verify_proof(hasher, &hasher.hash(payload), proof, root)
}
