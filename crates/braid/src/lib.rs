//! Multisig braids.
//!
//! A braid describes one branch of a multisig wallet: the signers' extended public keys, the
//! quorum, the address type, the network and the branch index (`0` for deposits, `1` for
//! change by convention). From it the public key sets, signing metadata and multisig
//! addresses at every child index of the branch can be derived.
//!
//! # Usage
//!
//! ```rust,ignore
//! use multisig_braid::{AddressType, Braid, BraidNetwork};
//!
//! let braid = Braid::new(BraidNetwork::Testnet, AddressType::P2wsh, xpubs, 2, "0")?;
//!
//! // keys and metadata at m/0/5, in canonical order
//! let keys = braid.public_keys_at_index(5)?;
//! let metadata = braid.bip32_derivation_at_index(5)?;
//!
//! // the multisig address itself
//! let multisig = braid.derive_multisig_at_index(5)?;
//! println!("{}", multisig.multisig.address);
//!
//! // persist and restore
//! let restored = Braid::from_json(&braid.to_json())?;
//! ```
//!
//! # Key order
//!
//! Keys are always emitted in ascending order of their compressed hex encoding (BIP67), no
//! matter in which order the signers were supplied. Signing metadata is index-aligned with
//! that order.

pub mod braid;
pub mod config;
pub mod derivation;
pub mod errors;
pub mod keys;
pub mod multisig;
pub mod paths;
pub mod types;

pub use braid::Braid;
pub use config::BraidConfig;
pub use derivation::{Bip32Derivation, PublicKeySet};
pub use errors::{BraidError, MultisigError, PathError, UpstreamError, ValidationError};
pub use keys::{
    ExtendedPublicKeyHandle, ExtendedPublicKeyRecord, ResolvedKey, UNKNOWN_FINGERPRINT,
};
pub use multisig::{
    BraidMultisig, Multisig, MultisigAssembler, ScriptMultisigAssembler, MAX_MULTISIG_KEYS,
};
pub use types::{AddressType, BraidNetwork};
