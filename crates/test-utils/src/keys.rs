//! Signer key fixtures.
use std::str::FromStr;

use bitcoin::{
    bip32::{DerivationPath, Fingerprint, Xpriv, Xpub},
    Network,
};
use secp256k1::SECP256K1;

/// A signer's master key and its BIP48 P2WSH account key.
#[derive(Debug, Clone)]
pub struct SignerFixture {
    /// The signer's root key.
    pub master: Xpriv,

    /// Account xpub at [`Self::account_path`].
    pub account: Xpub,

    /// Path from the root key to the account key, e.g. `m/48'/1'/0'/2'`.
    pub account_path: String,

    /// Fingerprint of the root key.
    pub root_fingerprint: Fingerprint,
}

/// Builds the master private key for `seed`.
pub fn master_xpriv(seed: u8, network: Network) -> Xpriv {
    Xpriv::new_master(network, &[seed; 32]).expect("32-byte seed must be valid")
}

/// Builds the master public key for `seed`.
pub fn master_xpub(seed: u8, network: Network) -> Xpub {
    Xpub::from_priv(SECP256K1, &master_xpriv(seed, network))
}

/// Builds the signer fixture for `seed`.
pub fn signer(seed: u8, network: Network) -> SignerFixture {
    let master = master_xpriv(seed, network);
    let coin_type = if network == Network::Bitcoin { 0 } else { 1 };
    let account_path = format!("m/48'/{coin_type}'/0'/2'");

    let path = DerivationPath::from_str(&account_path).expect("account path must be valid");
    let account = master
        .derive_priv(SECP256K1, &path)
        .expect("hardened derivation from a master key must succeed");

    SignerFixture {
        master,
        account: Xpub::from_priv(SECP256K1, &account),
        account_path,
        root_fingerprint: master.fingerprint(SECP256K1),
    }
}

/// Builds `count` distinct signer fixtures, seeded `1..=count`.
pub fn signers(count: u8, network: Network) -> Vec<SignerFixture> {
    (1..=count).map(|seed| signer(seed, network)).collect()
}
