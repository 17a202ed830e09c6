//! Supported networks and multisig address types.

use std::{fmt, str::FromStr};

use bitcoin::{Network, NetworkKind};
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Network a braid's keys and addresses live on.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BraidNetwork {
    /// Bitcoin mainnet.
    Mainnet,

    /// Bitcoin testnet.
    Testnet,

    /// Local regression-test network.
    Regtest,

    /// Bitcoin signet.
    Signet,
}

impl BraidNetwork {
    /// All supported networks.
    pub const ALL: [BraidNetwork; 4] = [
        BraidNetwork::Mainnet,
        BraidNetwork::Testnet,
        BraidNetwork::Regtest,
        BraidNetwork::Signet,
    ];

    /// Name used in braid configs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            BraidNetwork::Mainnet => "mainnet",
            BraidNetwork::Testnet => "testnet",
            BraidNetwork::Regtest => "regtest",
            BraidNetwork::Signet => "signet",
        }
    }

    /// Returns the corresponding [`bitcoin::Network`].
    pub const fn bitcoin_network(&self) -> Network {
        match self {
            BraidNetwork::Mainnet => Network::Bitcoin,
            BraidNetwork::Testnet => Network::Testnet,
            BraidNetwork::Regtest => Network::Regtest,
            BraidNetwork::Signet => Network::Signet,
        }
    }

    /// Extended keys only distinguish between mainnet and "everything else".
    pub fn network_kind(&self) -> NetworkKind {
        NetworkKind::from(self.bitcoin_network())
    }
}

impl fmt::Display for BraidNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BraidNetwork {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BraidNetwork::ALL
            .into_iter()
            .find(|network| network.as_str() == s)
            .ok_or_else(|| ValidationError::UnsupportedNetwork(s.to_owned()))
    }
}

/// Script template used to turn an ordered key list into an address.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum AddressType {
    /// Legacy pay-to-script-hash.
    #[serde(rename = "P2SH")]
    P2sh,

    /// Pay-to-witness-script-hash nested in pay-to-script-hash.
    #[serde(rename = "P2SH-P2WSH")]
    P2shP2wsh,

    /// Native pay-to-witness-script-hash.
    #[serde(rename = "P2WSH")]
    P2wsh,
}

impl AddressType {
    /// All supported address types.
    pub const ALL: [AddressType; 3] = [
        AddressType::P2sh,
        AddressType::P2shP2wsh,
        AddressType::P2wsh,
    ];

    /// Name used in braid configs.
    pub const fn as_str(&self) -> &'static str {
        match self {
            AddressType::P2sh => "P2SH",
            AddressType::P2shP2wsh => "P2SH-P2WSH",
            AddressType::P2wsh => "P2WSH",
        }
    }

    /// Whether spending requires a witness script.
    pub const fn is_segwit(&self) -> bool {
        !matches!(self, AddressType::P2sh)
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AddressType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AddressType::ALL
            .into_iter()
            .find(|address_type| address_type.as_str() == s)
            .ok_or_else(|| ValidationError::UnsupportedAddressType(s.to_owned()))
    }
}
