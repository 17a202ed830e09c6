//! Derived public key sets and their signing metadata.
//!
//! A [`PublicKeySet`] holds one entry per signer for a single derivation path. Entries are
//! keyed by the lowercase hex of the compressed public key, so iterating the set yields keys
//! in the canonical (BIP67) order used for multisig scripts. The metadata accessors walk the
//! same map, which keeps them index-aligned with the sorted key list.

use std::collections::{btree_map::Entry, BTreeMap};

use bitcoin::{
    bip32::{DerivationPath, Fingerprint, KeySource},
    secp256k1::PublicKey,
};
use serde::{ser::SerializeStruct, Serialize, Serializer};

use crate::{errors::BraidError, paths::format_path};

/// Origin of a single derived public key, as consumed by signing tools.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bip32Derivation {
    master_fingerprint: Fingerprint,
    path: DerivationPath,
    pubkey: PublicKey,
}

impl Bip32Derivation {
    /// Creates a new record.
    pub fn new(
        master_fingerprint: Fingerprint,
        path: DerivationPath,
        pubkey: PublicKey,
    ) -> Self {
        Self {
            master_fingerprint,
            path,
            pubkey,
        }
    }

    /// Fingerprint of the root key, or
    /// [`UNKNOWN_FINGERPRINT`](crate::keys::UNKNOWN_FINGERPRINT) when unverified.
    pub const fn master_fingerprint(&self) -> Fingerprint {
        self.master_fingerprint
    }

    /// Full path from the root key, e.g. `m/48'/1'/0'/2'/0/5`.
    pub fn path(&self) -> String {
        format_path(&self.path)
    }

    /// Full path from the root key as a [`DerivationPath`].
    pub const fn derivation_path(&self) -> &DerivationPath {
        &self.path
    }

    /// The derived public key.
    pub const fn pubkey(&self) -> PublicKey {
        self.pubkey
    }

    /// The compressed public key bytes.
    pub fn pubkey_bytes(&self) -> [u8; 33] {
        self.pubkey.serialize()
    }

    /// The `(fingerprint, path)` pair used in PSBT `bip32_derivation` maps.
    pub fn key_source(&self) -> KeySource {
        (self.master_fingerprint, self.path.clone())
    }
}

impl Serialize for Bip32Derivation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Bip32Derivation", 3)?;
        state.serialize_field("masterFingerprint", &self.master_fingerprint.to_string())?;
        state.serialize_field("path", &self.path())?;
        state.serialize_field("pubkey", &self.pubkey.to_string())?;
        state.end()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct SignerKey {
    /// Position of the signer in the braid's key list.
    signer: usize,
    derivation: Bip32Derivation,
}

/// The public keys of every signer at one derivation path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKeySet {
    keys: BTreeMap<String, SignerKey>,
}

impl PublicKeySet {
    /// Collects per-signer derivations, given in signer order.
    ///
    /// Fails if two signers produced the same public key; such a set would silently hold
    /// fewer keys than the braid has signers.
    pub(crate) fn collect(
        derivations: impl IntoIterator<Item = Bip32Derivation>,
    ) -> Result<Self, BraidError> {
        let mut keys = BTreeMap::new();

        for (signer, derivation) in derivations.into_iter().enumerate() {
            match keys.entry(derivation.pubkey.to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(SignerKey { signer, derivation });
                }
                Entry::Occupied(existing) => {
                    return Err(BraidError::DuplicatePublicKey {
                        pubkey: derivation.pubkey,
                        first: existing.get().signer,
                        second: signer,
                    });
                }
            }
        }

        Ok(Self { keys })
    }

    /// Number of keys in the set.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Looks up the metadata for a public key given as hex.
    pub fn get(&self, pubkey_hex: &str) -> Option<&Bip32Derivation> {
        self.keys.get(pubkey_hex).map(|key| &key.derivation)
    }

    /// Public keys as lowercase hex, in ascending lexicographic order.
    pub fn sorted_public_keys(&self) -> Vec<String> {
        self.keys.keys().cloned().collect()
    }

    /// Public keys in the same order as [`Self::sorted_public_keys`].
    pub fn sorted_pubkeys(&self) -> Vec<PublicKey> {
        self.keys.values().map(|key| key.derivation.pubkey).collect()
    }

    /// Signing metadata aligned index-for-index with [`Self::sorted_public_keys`].
    pub fn metadata_in_canonical_order(&self) -> Vec<Bip32Derivation> {
        self.keys
            .values()
            .map(|key| key.derivation.clone())
            .collect()
    }

    /// Positions in the braid's key list, in canonical key order.
    pub fn signer_order(&self) -> Vec<usize> {
        self.keys.values().map(|key| key.signer).collect()
    }

    /// The set in the shape of a PSBT input's `bip32_derivation` map.
    pub fn psbt_bip32_derivation(&self) -> BTreeMap<PublicKey, KeySource> {
        self.keys
            .values()
            .map(|key| (key.derivation.pubkey, key.derivation.key_source()))
            .collect()
    }
}
