use mdrop_types::{Digest, TypeError};

/// Errors from Merkle tree construction, proof generation, and verification.
///
/// A proof that is well-formed but does not lead to the expected root is not
/// an error; verification reports that as `Ok(false)`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MerkleError {
    /// Construction was attempted with zero leaves.
    #[error("cannot build a merkle tree from zero leaves")]
    EmptyInput,

    /// No level-0 node matches the requested leaf digest.
    #[error("leaf not found: {0}")]
    LeafNotFound(Digest),

    /// Proof requested for a position past the last leaf.
    #[error("leaf index {index} out of range for {leaf_count} leaves")]
    IndexOutOfRange { index: usize, leaf_count: usize },

    /// A proof entry, leaf, or root does not have the hasher's digest length.
    /// `position` is the proof entry index, or `None` for the leaf or root.
    #[error(
        "malformed proof at {}: expected {}-byte digest, got {}",
        describe_position(.position),
        .expected,
        .actual
    )]
    MalformedProof {
        position: Option<usize>,
        expected: usize,
        actual: usize,
    },

    /// A pre-hashed leaf does not have the hasher's digest length.
    #[error("malformed leaf {index}: expected {expected}-byte digest, got {actual}")]
    MalformedLeaf {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Type(#[from] TypeError),
}

fn describe_position(position: &Option<usize>) -> String {
    match position {
        Some(index) => format!("entry {index}"),
        None => "leaf/root".to_string(),
    }
}

/// Result alias for merkle operations.
pub type MerkleResult<T> = Result<T, MerkleError>;
