use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::TypeError;

/// A single allowlist entry: the beneficiary and the amount they may claim.
///
/// The canonical encoding is the leaf payload committed to by the tree:
/// ```text
/// [32 bytes: address]
/// [8 bytes: amount (little-endian u64)]
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Allocation {
    pub address: Address,
    pub amount: u64,
}

impl Allocation {
    /// Length of the canonical encoding.
    pub const ENCODED_LEN: usize = Address::LEN + 8;

    pub fn new(address: Address, amount: u64) -> Self {
        Self { address, amount }
    }

    /// Canonical byte encoding used as the leaf payload.
    pub fn to_bytes(&self) -> [u8; Self::ENCODED_LEN] {
        let mut out = [0u8; Self::ENCODED_LEN];
        out[..Address::LEN].copy_from_slice(self.address.as_bytes());
        out[Address::LEN..].copy_from_slice(&self.amount.to_le_bytes());
        out
    }

    /// Decode a canonical encoding.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        if bytes.len() != Self::ENCODED_LEN {
            return Err(TypeError::InvalidLength {
                expected: Self::ENCODED_LEN,
                actual: bytes.len(),
            });
        }
        let mut addr = [0u8; 32];
        addr.copy_from_slice(&bytes[..Address::LEN]);
        let mut amount = [0u8; 8];
        amount.copy_from_slice(&bytes[Address::LEN..]);
        Ok(Self {
            address: Address::new(addr),
            amount: u64::from_le_bytes(amount),
        })
    }
}
