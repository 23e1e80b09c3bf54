//! Foundation types for mdrop.
//!
//! Every other mdrop crate depends on `mdrop-types`.
//!
//! # Key Types
//!
//! - [`Digest`] — Hash output used for leaves, internal nodes, roots and proof entries
//! - [`Address`] — 32-byte account address of an allowlist beneficiary
//! - [`Allocation`] — An (address, amount) entry and its canonical 40-byte encoding

pub mod address;
pub mod allocation;
pub mod digest;
pub mod error;

pub use address::Address;
pub use allocation::Allocation;
pub use digest::Digest;
pub use error::TypeError;
