use mdrop_types::Digest;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{MerkleError, MerkleResult};
use crate::hasher::{Hasher, Sha256Hasher};
use crate::proof::{combine, verify_proof, MerkleProof};

/// Construction options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeOptions {
    /// Sort leaf digests ascending before building. Off by default, in which
    /// case the root commits to the input order.
    #[serde(default)]
    pub sort_leaves: bool,
}

/// Binary Merkle tree with sorted-pair node hashing.
///
/// Built once from an ordered list of leaves and read-only afterwards. Each
/// parent is `hash(min(a, b) || max(a, b))` of its two children. When a level
/// has an odd number of nodes, the last one is promoted to the next level
/// unchanged; it is neither duplicated nor hashed with itself.
#[derive(Clone, Debug)]
pub struct MerkleTree<H: Hasher = Sha256Hasher> {
    hasher: H,
    /// All tree nodes stored level by level.
    /// Level 0 = leaves, last level = `[root]`.
    levels: Vec<Vec<Digest>>,
}

impl MerkleTree<Sha256Hasher> {
    /// Build a SHA-256 tree from raw payloads.
    pub fn sha256<T: AsRef<[u8]>>(payloads: &[T]) -> MerkleResult<Self> {
        Self::new(Sha256Hasher, payloads)
    }
}

impl<H: Hasher> MerkleTree<H> {
    /// Hash each payload into a leaf and build the tree, preserving order.
    pub fn new<T: AsRef<[u8]>>(hasher: H, payloads: &[T]) -> MerkleResult<Self> {
        Self::with_options(hasher, payloads, TreeOptions::default())
    }

    /// Hash each payload into a leaf and build the tree.
    pub fn with_options<T: AsRef<[u8]>>(
        hasher: H,
        payloads: &[T],
        options: TreeOptions,
    ) -> MerkleResult<Self> {
        let mut leaves: Vec<Digest> = payloads.iter().map(|p| hasher.hash(p.as_ref())).collect();
        if options.sort_leaves {
            leaves.sort();
        }
        Self::from_leaves(hasher, leaves)
    }

    /// Build a tree from pre-hashed leaf digests, in the given order.
    ///
    /// Every digest must have the hasher's output length.
    pub fn from_leaves(hasher: H, leaves: Vec<Digest>) -> MerkleResult<Self> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyInput);
        }
        let expected = hasher.output_len();
        if let Some((index, leaf)) = leaves
            .iter()
            .enumerate()
            .find(|(_, leaf)| leaf.len() != expected)
        {
            return Err(MerkleError::MalformedLeaf {
                index,
                expected,
                actual: leaf.len(),
            });
        }

        let leaf_count = leaves.len();
        let mut levels = vec![leaves];
        while let Some(current) = levels.last().filter(|level| level.len() > 1) {
            let next: Vec<Digest> = current
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => combine(&hasher, left, right),
                    // Odd node: promote unchanged
                    _ => pair[0].clone(),
                })
                .collect();
            levels.push(next);
        }

        let tree = Self { hasher, levels };
        debug!(
            hasher = tree.hasher.name(),
            leaves = leaf_count,
            depth = tree.depth(),
            root = %tree.root(),
            "built merkle tree"
        );
        Ok(tree)
    }

    /// The root digest.
    pub fn root(&self) -> &Digest {
        // levels always ends in a single-element root level
        &self.levels[self.levels.len() - 1][0]
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Number of combination levels above the leaves; 0 for a single leaf.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Leaf digests in tree order.
    pub fn leaves(&self) -> &[Digest] {
        &self.levels[0]
    }

    /// Every level, leaves first and the root level last.
    pub fn levels(&self) -> &[Vec<Digest>] {
        &self.levels
    }

    pub fn leaf(&self, index: usize) -> Option<&Digest> {
        self.levels[0].get(index)
    }

    /// Index of the first leaf equal to `leaf`.
    pub fn leaf_index(&self, leaf: &Digest) -> Option<usize> {
        self.levels[0].iter().position(|l| l == leaf)
    }

    /// Returns `true` if `payload` hashes to one of the leaves.
    pub fn contains(&self, payload: &[u8]) -> bool {
        self.leaf_index(&self.hasher.hash(payload)).is_some()
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Generate an inclusion proof for the leaf at `index`.
    pub fn proof(&self, index: usize) -> MerkleResult<MerkleProof> {
        if index >= self.leaf_count() {
            return Err(MerkleError::IndexOutOfRange {
                index,
                leaf_count: self.leaf_count(),
            });
        }

        let mut siblings = Vec::with_capacity(self.depth());
        let mut idx = index;
        for level in &self.levels[..self.depth()] {
            // A promoted node has no partner and adds nothing to the proof
            if let Some(sibling) = level.get(idx ^ 1) {
                siblings.push(sibling.clone());
            }
            idx /= 2;
        }

        trace!(index, len = siblings.len(), "generated proof");
        Ok(MerkleProof::new(siblings))
    }

    /// Generate a proof for a leaf digest.
    ///
    /// Identical leaves are indistinguishable by digest; this resolves to the
    /// first matching index. Use [`proof`](Self::proof) when the position
    /// matters.
    pub fn proof_for_leaf(&self, leaf: &Digest) -> MerkleResult<MerkleProof> {
        let index = self
            .leaf_index(leaf)
            .ok_or_else(|| MerkleError::LeafNotFound(leaf.clone()))?;
        self.proof(index)
    }

    /// Hash `payload` and generate a proof for the first matching leaf.
    pub fn proof_for_payload(&self, payload: &[u8]) -> MerkleResult<MerkleProof> {
        self.proof_for_leaf(&self.hasher.hash(payload))
    }

    /// Verify a proof against this tree's root and hasher.
    pub fn verify(&self, leaf: &Digest, proof: &MerkleProof) -> MerkleResult<bool> {
        verify_proof(&self.hasher, leaf, proof.siblings(), self.root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::Blake3Hasher;
    use proptest::prelude::*;

    const NAMES: [&[u8]; 5] = [b"alice", b"bob", b"carol", b"dave", b"erin"];

    fn h(data: &[u8]) -> Digest {
        Sha256Hasher.hash(data)
    }

    fn digest(hex: &str) -> Digest {
        Digest::from_hex(hex).unwrap()
    }

    #[test]
    fn empty_input_is_rejected() {
        let empty: Vec<&[u8]> = vec![];
        assert_eq!(
            MerkleTree::sha256(&empty).unwrap_err(),
            MerkleError::EmptyInput
        );
        assert_eq!(
            MerkleTree::from_leaves(Sha256Hasher, vec![]).unwrap_err(),
            MerkleError::EmptyInput
        );
    }

    #[test]
    fn single_leaf_is_root() {
        let tree = MerkleTree::sha256(&NAMES[..1]).unwrap();
        assert_eq!(tree.root(), &h(b"alice"));
        assert_eq!(tree.depth(), 0);

        let proof = tree.proof(0).unwrap();
        assert!(proof.is_empty());
        assert!(tree.verify(&h(b"alice"), &proof).unwrap());
    }

    #[test]
    fn two_leaves_produce_sorted_parent() {
        let tree = MerkleTree::sha256(&NAMES[..2]).unwrap();
        let (a, b) = (h(b"alice"), h(b"bob"));
        let (low, high) = if a < b { (&a, &b) } else { (&b, &a) };
        let expected = h(&[low.as_bytes(), high.as_bytes()].concat());
        assert_eq!(tree.root(), &expected);
        assert_eq!(
            tree.root(),
            &digest("cb57721dc3aa8df0eef91989560b053a86be98131f45650bd1c3955e0167ef17")
        );

        let proof = tree.proof(0).unwrap();
        assert_eq!(proof.siblings(), &[b.clone()]);
        assert!(tree.verify(&a, &proof).unwrap());
        assert!(!tree.verify(&h(b"alicf"), &proof).unwrap());
    }

    #[test]
    fn three_leaves_promote_odd_node() {
        let tree = MerkleTree::sha256(&NAMES[..3]).unwrap();
        let (a, b, c) = (h(b"alice"), h(b"bob"), h(b"carol"));
        let ab = combine(&Sha256Hasher, &a, &b);

        assert_eq!(tree.levels()[1], vec![ab.clone(), c.clone()]);
        assert_eq!(tree.root(), &combine(&Sha256Hasher, &ab, &c));
        assert_eq!(
            tree.root(),
            &digest("2b218ed65d2b6091544e15a20d7f356d7f6ca3992908f4b2b15dd75b41f22b1c")
        );
        // Duplicating the odd node instead would give a different root
        assert_ne!(
            tree.root(),
            &digest("5e3bcca38136b9c9f843ac21f993dca2aae2204c609d38c8982194f6e5a52783")
        );

        let proof = tree.proof(2).unwrap();
        assert_eq!(proof.siblings(), &[ab]);
        assert!(tree.verify(&c, &proof).unwrap());
    }

    #[test]
    fn five_leaves_pinned() {
        let tree = MerkleTree::sha256(&NAMES).unwrap();
        assert_eq!(
            tree.root(),
            &digest("1a7b7f79d1a10923402fc5587fcedda47ad1e08843d2718463ccba1b1af2a448")
        );
        assert_eq!(tree.depth(), 3);
        let lens: Vec<usize> = tree.levels().iter().map(Vec::len).collect();
        assert_eq!(lens, vec![5, 3, 2, 1]);

        // erin is promoted twice, so its proof has a single entry
        let proof = tree.proof(4).unwrap();
        assert_eq!(proof.len(), 1);
        assert_eq!(proof.siblings()[0].short_hex(), "1f2829c6");
        for i in 0..4 {
            assert_eq!(tree.proof(i).unwrap().len(), 3);
        }
    }

    #[test]
    fn proof_out_of_bounds() {
        let tree = MerkleTree::sha256(&NAMES[..2]).unwrap();
        assert_eq!(
            tree.proof(5).unwrap_err(),
            MerkleError::IndexOutOfRange {
                index: 5,
                leaf_count: 2
            }
        );
    }

    #[test]
    fn unknown_leaf_is_not_found() {
        let tree = MerkleTree::sha256(&NAMES[..2]).unwrap();
        let missing = h(b"mallory");
        assert_eq!(
            tree.proof_for_leaf(&missing).unwrap_err(),
            MerkleError::LeafNotFound(missing)
        );
        assert!(tree.proof_for_payload(b"mallory").is_err());
        assert!(!tree.contains(b"mallory"));
        assert!(tree.contains(b"bob"));
    }

    #[test]
    fn duplicate_leaves_resolve_to_first_index() {
        let payloads: [&[u8]; 3] = [b"bob", b"alice", b"bob"];
        let tree = MerkleTree::sha256(&payloads).unwrap();
        assert_eq!(tree.leaf_index(&h(b"bob")), Some(0));
        assert_eq!(
            tree.proof_for_payload(b"bob").unwrap(),
            tree.proof(0).unwrap()
        );
        // The second occurrence is still provable by index
        let second = tree.proof(2).unwrap();
        assert!(tree.verify(&h(b"bob"), &second).unwrap());
    }

    #[test]
    fn malformed_leaf_is_rejected() {
        let leaves = vec![h(b"alice"), Digest::new(vec![0u8; 16])];
        assert_eq!(
            MerkleTree::from_leaves(Sha256Hasher, leaves).unwrap_err(),
            MerkleError::MalformedLeaf {
                index: 1,
                expected: 32,
                actual: 16
            }
        );
    }

    #[test]
    fn leaf_order_matters() {
        let forward = MerkleTree::sha256(&NAMES[..3]).unwrap();
        let swapped = MerkleTree::sha256(&[NAMES[2], NAMES[1], NAMES[0]]).unwrap();
        assert_ne!(forward.root(), swapped.root());
        // Swapping two siblings of the same pair does not
        let pair_swapped = MerkleTree::sha256(&[NAMES[1], NAMES[0], NAMES[2]]).unwrap();
        assert_eq!(forward.root(), pair_swapped.root());
    }

    #[test]
    fn sort_leaves_makes_root_order_independent() {
        let options = TreeOptions { sort_leaves: true };
        let a = MerkleTree::with_options(Sha256Hasher, &NAMES, options).unwrap();
        let reversed: Vec<&[u8]> = NAMES.iter().rev().copied().collect();
        let b = MerkleTree::with_options(Sha256Hasher, &reversed, options).unwrap();
        assert_eq!(a.root(), b.root());
        assert!(a.leaves().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn deterministic_root() {
        let t1 = MerkleTree::new(Blake3Hasher, &NAMES).unwrap();
        let t2 = MerkleTree::new(Blake3Hasher, &NAMES).unwrap();
        assert_eq!(t1.root(), t2.root());
        assert_ne!(t1.root(), MerkleTree::sha256(&NAMES).unwrap().root());
    }

    #[test]
    fn power_of_two_leaves() {
        let payloads: Vec<[u8; 1]> = (0..8u8).map(|i| [i]).collect();
        let tree = MerkleTree::sha256(&payloads).unwrap();
        for (i, payload) in payloads.iter().enumerate() {
            let proof = tree.proof(i).unwrap();
            assert_eq!(proof.len(), 3);
            assert!(tree.verify(&h(payload), &proof).unwrap());
        }
    }

    #[test]
    fn borrowed_hasher_and_thread_safety() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MerkleTree<Sha256Hasher>>();
        assert_send_sync::<MerkleTree<Box<dyn Hasher>>>();

        let hasher = Sha256Hasher;
        let tree = MerkleTree::new(&hasher, &NAMES).unwrap();
        assert_eq!(tree.root(), MerkleTree::sha256(&NAMES).unwrap().root());
    }

    proptest! {
        #[test]
        fn every_leaf_proof_verifies(payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..48), 1..40)) {
            let tree = MerkleTree::sha256(&payloads).unwrap();
            for (i, payload) in payloads.iter().enumerate() {
                let proof = tree.proof(i).unwrap();
                prop_assert!(proof.len() <= tree.depth());
                prop_assert!(tree.verify(&h(payload), &proof).unwrap());
                prop_assert!(verify_proof(&Sha256Hasher, &h(payload), proof.siblings(), tree.root()).unwrap());
            }
        }

        #[test]
        fn tampered_payload_fails(
            payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..48), 1..20),
            pick in any::<prop::sample::Index>(),
            byte in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let tree = MerkleTree::sha256(&payloads).unwrap();
            let i = pick.index(payloads.len());
            let proof = tree.proof(i).unwrap();

            let mut tampered = payloads[i].clone();
            let at = byte.index(tampered.len());
            tampered[at] ^= flip;
            prop_assert!(!tree.verify(&h(&tampered), &proof).unwrap());
        }
    }
}
