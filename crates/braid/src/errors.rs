//! Errors produced while building a [`Braid`](crate::Braid) or deriving from it.

use bitcoin::{
    bip32::{self, ChildNumber},
    secp256k1::PublicKey,
};
use thiserror::Error;

/// Top-level error for every braid operation.
///
/// All variants are deterministic consequences of the inputs, so none of them are worth
/// retrying.
#[derive(Debug, Error)]
pub enum BraidError {
    /// The braid (or its config snapshot) violates a construction invariant.
    #[error("invalid braid: {0}")]
    Validation(#[from] ValidationError),

    /// The requested path is not a well-formed BIP32 path.
    #[error("invalid bip32 path {path:?}: {source}")]
    InvalidPath {
        /// The path as supplied by the caller.
        path: String,

        /// Why the path was rejected.
        #[source]
        source: PathError,
    },

    /// The path does not start at the braid's branch index.
    #[error("path {path:?} does not belong to braid branch {expected}")]
    BranchMismatch {
        /// The path as supplied by the caller.
        path: String,

        /// The braid's branch index.
        expected: ChildNumber,

        /// The leading segment of the path, if it had one.
        found: Option<ChildNumber>,
    },

    /// A key-derivation or multisig-assembly step rejected its input.
    #[error("upstream derivation failed: {0}")]
    UpstreamDerivation(#[from] UpstreamError),

    /// Two signers derived the same child public key at the requested path.
    #[error("signers at positions {first} and {second} derive the same public key {pubkey}")]
    DuplicatePublicKey {
        /// The colliding child public key.
        pubkey: PublicKey,

        /// Position of the first signer in the braid's key list.
        first: usize,

        /// Position of the second signer in the braid's key list.
        second: usize,
    },
}

/// Violated construction invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Network name is not one of the supported networks.
    #[error("unsupported network {0:?}")]
    UnsupportedNetwork(String),

    /// Address type name is not one of the supported address types.
    #[error("unsupported address type {0:?}")]
    UnsupportedAddressType(String),

    /// An extended public key failed validation against the braid network.
    #[error("extended public key at position {position} is invalid: {}", violations.join("; "))]
    InvalidExtendedPublicKey {
        /// Position of the key in the supplied list.
        position: usize,

        /// Every problem found with the key.
        violations: Vec<String>,
    },

    /// The quorum is zero.
    #[error("required signers must be at least 1")]
    NoSigners,

    /// The quorum is larger than the number of keys.
    #[error("required signers ({required}) exceeds number of extended public keys ({total})")]
    QuorumExceedsKeys {
        /// Requested quorum.
        required: usize,

        /// Number of extended public keys.
        total: usize,
    },

    /// The branch index is not a single unhardened BIP32 index.
    #[error("invalid branch index {index:?}: {reason}")]
    InvalidBranchIndex {
        /// The index as supplied.
        index: String,

        /// Why the index was rejected.
        reason: PathError,
    },

    /// The config document could not be parsed at all.
    #[error("malformed braid config: {0}")]
    MalformedConfig(String),
}

/// Syntax error in a BIP32 path or index.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// Nothing to parse.
    #[error("path is empty")]
    Empty,

    /// Two separators with nothing in between, or a trailing separator.
    #[error("path contains an empty segment")]
    EmptySegment,

    /// A segment is not a decimal index with an optional hardened marker.
    #[error("segment {0:?} is not a bip32 index")]
    InvalidSegment(String),

    /// A segment does not fit below the hardened offset.
    #[error("index {0:?} is out of range")]
    OutOfRange(String),

    /// A hardened index was given where only unhardened ones are allowed.
    #[error("index {0:?} must not be hardened")]
    Hardened(String),

    /// More than one segment was given where a single index is expected.
    #[error("expected a single index, got {0:?}")]
    NotSingleIndex(String),
}

/// Failure reported by one of the external collaborators.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Child key derivation failed.
    #[error("bip32: {0}")]
    Bip32(#[from] bip32::Error),

    /// Multisig assembly rejected its input.
    #[error("multisig: {0}")]
    Multisig(#[from] MultisigError),
}

/// Errors from assembling a multisig construct out of an ordered key list.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MultisigError {
    /// The quorum is zero or larger than the number of keys.
    #[error("cannot build a {required}-of-{total} multisig")]
    QuorumOutOfRange {
        /// Requested quorum.
        required: usize,

        /// Number of keys.
        total: usize,
    },

    /// More keys than `OP_CHECKMULTISIG` accepts.
    #[error("{0} keys exceed the multisig limit of {max}", max = crate::multisig::MAX_MULTISIG_KEYS)]
    TooManyKeys(usize),

    /// The redeem script does not fit in a P2SH script push.
    #[error("redeem script of {0} bytes is too large for P2SH")]
    RedeemScriptTooLarge(usize),
}

impl From<MultisigError> for BraidError {
    fn from(err: MultisigError) -> Self {
        BraidError::UpstreamDerivation(err.into())
    }
}

impl From<bip32::Error> for BraidError {
    fn from(err: bip32::Error) -> Self {
        BraidError::UpstreamDerivation(err.into())
    }
}
