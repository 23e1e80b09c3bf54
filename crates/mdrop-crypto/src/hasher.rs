use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use mdrop_types::Digest;
use serde::{Deserialize, Serialize};
use sha2::Digest as _;

/// Pluggable one-way hash used for both leaf hashing and node combination.
///
/// Implementations must be deterministic and produce digests of exactly
/// [`output_len`](Hasher::output_len) bytes. They hold no per-call state, so a
/// single hasher may be shared freely between threads.
pub trait Hasher: Send + Sync {
    /// Hash raw bytes.
    fn hash(&self, data: &[u8]) -> Digest;

    /// Length in bytes of every digest this hasher produces.
    fn output_len(&self) -> usize;

    /// Short identifier for logs and user-facing output.
    fn name(&self) -> &str;
}

impl<H: Hasher + ?Sized> Hasher for &H {
    fn hash(&self, data: &[u8]) -> Digest {
        (**self).hash(data)
    }

    fn output_len(&self) -> usize {
        (**self).output_len()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<H: Hasher + ?Sized> Hasher for Box<H> {
    fn hash(&self, data: &[u8]) -> Digest {
        (**self).hash(data)
    }

    fn output_len(&self) -> usize {
        (**self).output_len()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<H: Hasher + ?Sized> Hasher for Arc<H> {
    fn hash(&self, data: &[u8]) -> Digest {
        (**self).hash(data)
    }

    fn output_len(&self) -> usize {
        (**self).output_len()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// SHA-256. The default hasher for allowlist trees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sha256Hasher;

impl Hasher for Sha256Hasher {
    fn hash(&self, data: &[u8]) -> Digest {
        Digest::new(sha2::Sha256::digest(data).to_vec())
    }

    fn output_len(&self) -> usize {
        32
    }

    fn name(&self) -> &str {
        "sha256"
    }
}

/// Plain BLAKE3 without domain separation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Blake3Hasher;

impl Hasher for Blake3Hasher {
    fn hash(&self, data: &[u8]) -> Digest {
        Digest::from(*blake3::hash(data).as_bytes())
    }

    fn output_len(&self) -> usize {
        32
    }

    fn name(&self) -> &str {
        "blake3"
    }
}

/// Domain-separated BLAKE3 hasher.
///
/// Each hasher carries a domain tag (e.g. `"mdrop-airdrop-v1"`) that is
/// prepended as `tag ":" data` to every hash computation, so two protocols
/// committing to identical payloads never share leaves or roots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaggedBlake3Hasher {
    domain: &'static str,
}

impl TaggedBlake3Hasher {
    /// Hasher for airdrop allowlists.
    pub const AIRDROP: Self = Self {
        domain: "mdrop-airdrop-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

impl Hasher for TaggedBlake3Hasher {
    fn hash(&self, data: &[u8]) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        Digest::from(*hasher.finalize().as_bytes())
    }

    fn output_len(&self) -> usize {
        32
    }

    fn name(&self) -> &str {
        self.domain
    }
}

/// Selects one of the untagged hashers by name, for configuration files and
/// command-line flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HasherKind {
    #[default]
    Sha256,
    Blake3,
}

impl HasherKind {
    /// Instantiate the selected hasher.
    pub fn build(self) -> Box<dyn Hasher> {
        match self {
            Self::Sha256 => Box::new(Sha256Hasher),
            Self::Blake3 => Box::new(Blake3Hasher),
        }
    }
}

impl fmt::Display for HasherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

impl FromStr for HasherKind {
    type Err = UnknownHasher;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "blake3" => Ok(Self::Blake3),
            _ => Err(UnknownHasher(s.to_string())),
        }
    }
}

/// Returned when a hasher name is not recognized.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("unknown hasher: {0} (expected sha256 or blake3)")]
pub struct UnknownHasher(pub String);
