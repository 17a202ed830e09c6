//! The [`Braid`] descriptor and everything derived from it.

use bitcoin::bip32::{ChildNumber, DerivationPath};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    config::BraidConfig,
    derivation::{Bip32Derivation, PublicKeySet},
    errors::{BraidError, PathError, ValidationError},
    keys::{ExtendedPublicKeyHandle, ResolvedKey},
    multisig::{BraidMultisig, Multisig, MultisigAssembler, ScriptMultisigAssembler},
    paths::{format_path, parse_path, parse_unhardened_index},
    types::{AddressType, BraidNetwork},
};

/// One branch (deposit or change) of a multisig wallet.
///
/// A braid is validated once, on construction, and never changes afterwards. Every
/// derivation is a pure function of the braid and the requested path, so a braid can be
/// shared freely between threads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BraidConfig", into = "BraidConfig")]
pub struct Braid {
    network: BraidNetwork,
    address_type: AddressType,

    /// Keys as supplied, kept for the canonical JSON form.
    extended_public_keys: Vec<ExtendedPublicKeyHandle>,

    /// Decoded keys, in the same order as `extended_public_keys`.
    keys: Vec<ResolvedKey>,

    required_signers: usize,

    /// Branch index as supplied.
    index: String,

    /// Branch index as a child number.
    branch: ChildNumber,
}

impl Braid {
    /// Creates a new braid, checking every construction invariant.
    pub fn new<K>(
        network: BraidNetwork,
        address_type: AddressType,
        extended_public_keys: impl IntoIterator<Item = K>,
        required_signers: usize,
        index: impl Into<String>,
    ) -> Result<Self, ValidationError>
    where
        K: Into<ExtendedPublicKeyHandle>,
    {
        let extended_public_keys: Vec<ExtendedPublicKeyHandle> =
            extended_public_keys.into_iter().map(Into::into).collect();
        let index = index.into();

        let keys = extended_public_keys
            .iter()
            .enumerate()
            .map(|(position, handle)| {
                handle.resolve(network).map_err(|violations| {
                    ValidationError::InvalidExtendedPublicKey {
                        position,
                        violations,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if required_signers == 0 {
            return Err(ValidationError::NoSigners);
        }
        if required_signers > keys.len() {
            return Err(ValidationError::QuorumExceedsKeys {
                required: required_signers,
                total: keys.len(),
            });
        }

        let branch = parse_unhardened_index(&index).map_err(|reason| {
            ValidationError::InvalidBranchIndex {
                index: index.clone(),
                reason,
            }
        })?;

        trace!(%network, %address_type, required_signers, total = keys.len(), %index, "built braid");

        Ok(Self {
            network,
            address_type,
            extended_public_keys,
            keys,
            required_signers,
            index,
            branch,
        })
    }

    /// Parses and validates a braid from its canonical JSON form.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        Self::try_from(BraidConfig::from_json(json)?)
    }

    /// Canonical JSON form of the braid.
    pub fn to_json(&self) -> String {
        self.to_config().to_json()
    }

    /// The braid's config, suitable for persisting.
    pub fn to_config(&self) -> BraidConfig {
        BraidConfig {
            network: self.network.to_string(),
            address_type: self.address_type.to_string(),
            extended_public_keys: self.extended_public_keys.clone(),
            required_signers: self.required_signers,
            index: self.index.clone(),
        }
    }

    /// Network the braid lives on.
    pub const fn network(&self) -> BraidNetwork {
        self.network
    }

    /// Address type of the braid's multisig addresses.
    pub const fn address_type(&self) -> AddressType {
        self.address_type
    }

    /// Signer keys in the order they were supplied.
    ///
    /// This is not the signing order; see [`PublicKeySet::sorted_public_keys`].
    pub fn extended_public_keys(&self) -> &[ExtendedPublicKeyHandle] {
        &self.extended_public_keys
    }

    /// Decoded signer keys, in supplied order.
    pub fn resolved_keys(&self) -> &[ResolvedKey] {
        &self.keys
    }

    /// Quorum.
    pub const fn required_signers(&self) -> usize {
        self.required_signers
    }

    /// Number of signers.
    pub fn total_signers(&self) -> usize {
        self.keys.len()
    }

    /// Branch index as supplied.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Branch index as a child number.
    pub const fn branch(&self) -> ChildNumber {
        self.branch
    }

    /// Checks that `path` is well formed and lies under this braid's branch.
    ///
    /// Returns the child sequence to derive below each signer's xpub. A bare relative path
    /// such as `0/5` is read as rooted at the branch, the same as `m/0/5` or `/0/5`.
    pub fn validate_path(&self, path: &str) -> Result<DerivationPath, BraidError> {
        let children = parse_path(path).map_err(|source| BraidError::InvalidPath {
            path: path.to_owned(),
            source,
        })?;

        let first = {
            let segments: &[ChildNumber] = children.as_ref();
            segments.first().copied()
        };
        if first != Some(self.branch) {
            return Err(BraidError::BranchMismatch {
                path: path.to_owned(),
                expected: self.branch,
                found: first,
            });
        }

        Ok(children)
    }

    /// Derives every signer's public key at `path`.
    pub fn public_key_set(&self, path: &str) -> Result<PublicKeySet, BraidError> {
        let children = self.validate_path(path)?;

        let derivations = self
            .keys
            .iter()
            .map(|key| {
                let pubkey = key.derive_child(&children)?;
                trace!(%key, %pubkey, "derived signer key");

                Ok(Bip32Derivation::new(
                    key.master_fingerprint(),
                    key.full_path(&children),
                    pubkey,
                ))
            })
            .collect::<Result<Vec<_>, BraidError>>()?;

        let set = PublicKeySet::collect(derivations)?;
        debug!(%path, keys = set.len(), "derived braid public key set");

        Ok(set)
    }

    /// Derives every signer's public key at child `index` of the branch.
    pub fn public_key_set_at_index(&self, index: u32) -> Result<PublicKeySet, BraidError> {
        self.public_key_set(&self.index_path(index)?)
    }

    /// Public keys at `path`, as hex, in canonical order.
    pub fn public_keys_at_path(&self, path: &str) -> Result<Vec<String>, BraidError> {
        Ok(self.public_key_set(path)?.sorted_public_keys())
    }

    /// Public keys at child `index` of the branch, as hex, in canonical order.
    pub fn public_keys_at_index(&self, index: u32) -> Result<Vec<String>, BraidError> {
        Ok(self.public_key_set_at_index(index)?.sorted_public_keys())
    }

    /// Signing metadata at `path`, aligned with [`Self::public_keys_at_path`].
    pub fn bip32_derivation_at_path(
        &self,
        path: &str,
    ) -> Result<Vec<Bip32Derivation>, BraidError> {
        Ok(self.public_key_set(path)?.metadata_in_canonical_order())
    }

    /// Signing metadata at child `index`, aligned with [`Self::public_keys_at_index`].
    pub fn bip32_derivation_at_index(
        &self,
        index: u32,
    ) -> Result<Vec<Bip32Derivation>, BraidError> {
        Ok(self
            .public_key_set_at_index(index)?
            .metadata_in_canonical_order())
    }

    /// Builds the multisig at `path` with the default script assembler.
    pub fn derive_multisig(&self, path: &str) -> Result<BraidMultisig<Multisig>, BraidError> {
        self.derive_multisig_with(&ScriptMultisigAssembler, path)
    }

    /// Builds the multisig at child `index` with the default script assembler.
    pub fn derive_multisig_at_index(
        &self,
        index: u32,
    ) -> Result<BraidMultisig<Multisig>, BraidError> {
        self.derive_multisig(&self.index_path(index)?)
    }

    /// Builds the multisig at `path` with `assembler`.
    ///
    /// The assembler receives the keys in canonical order; the returned value carries the
    /// braid's canonical JSON and the matching signing metadata.
    pub fn derive_multisig_with<A: MultisigAssembler>(
        &self,
        assembler: &A,
        path: &str,
    ) -> Result<BraidMultisig<A::Output>, BraidError> {
        let set = self.public_key_set(path)?;

        let multisig = assembler.assemble(
            self.network,
            self.address_type,
            self.required_signers,
            &set.sorted_pubkeys(),
        )?;

        Ok(BraidMultisig {
            multisig,
            braid_details: self.to_json(),
            bip32_derivation: set.metadata_in_canonical_order(),
        })
    }

    fn index_path(&self, index: u32) -> Result<String, BraidError> {
        let child =
            ChildNumber::from_normal_idx(index).map_err(|_| BraidError::InvalidPath {
                path: format!("{}/{index}", self.index),
                source: PathError::OutOfRange(index.to_string()),
            })?;

        Ok(format_path(&DerivationPath::from(vec![self.branch, child])))
    }
}

impl TryFrom<BraidConfig> for Braid {
    type Error = ValidationError;

    fn try_from(config: BraidConfig) -> Result<Self, Self::Error> {
        let network = config.network.parse()?;
        let address_type = config.address_type.parse()?;

        Braid::new(
            network,
            address_type,
            config.extended_public_keys,
            config.required_signers,
            config.index,
        )
    }
}

impl From<Braid> for BraidConfig {
    fn from(braid: Braid) -> Self {
        braid.to_config()
    }
}
