//! Sorted-pair binary Merkle trees for allowlist commitments.
//!
//! A publisher commits to a list of leaf payloads by publishing only the
//! root; each beneficiary receives a short proof that their leaf is part of
//! the committed set. Verification needs only the hasher, never the tree.
//!
//! Hash functions come from `sha2` and `blake3`; nothing here is custom
//! cryptography.

pub mod error;
pub mod hasher;
pub mod merkle;
pub mod proof;

pub use error::{MerkleError, MerkleResult};
pub use hasher::{Blake3Hasher, Hasher, HasherKind, Sha256Hasher, TaggedBlake3Hasher, UnknownHasher};
pub use merkle::{MerkleTree, TreeOptions};
pub use proof::{combine, verify_payload, verify_proof, MerkleProof};
