//! Canonical JSON form of a braid.

use serde::{Deserialize, Serialize};

use crate::{errors::ValidationError, keys::ExtendedPublicKeyHandle};

/// Wire shape of a braid, as persisted and exchanged between tools.
///
/// Network and address type stay as plain strings here so that an unsupported value surfaces
/// as a [`ValidationError`] when the config is turned into a [`Braid`](crate::Braid), rather
/// than as an opaque parse failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BraidConfig {
    /// Network name, e.g. `testnet`.
    pub network: String,

    /// Address type name, e.g. `P2WSH`.
    pub address_type: String,

    /// Signer keys in the order they were supplied.
    pub extended_public_keys: Vec<ExtendedPublicKeyHandle>,

    /// Quorum.
    pub required_signers: usize,

    /// Branch index, e.g. `0` for deposits and `1` for change.
    pub index: String,
}

impl BraidConfig {
    /// Parses a config from JSON without validating its contents.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        serde_json::from_str(json).map_err(|err| ValidationError::MalformedConfig(err.to_string()))
    }

    /// Serializes the config to compact JSON.
    pub fn to_json(&self) -> String {
        // only strings, integers and untagged string/record handles, none of which can fail to
        // serialize into an in-memory string
        serde_json::to_string(self).expect("braid config must serialize to json")
    }
}
