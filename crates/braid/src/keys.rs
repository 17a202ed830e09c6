//! Extended public key handles and child key derivation.
//!
//! A braid accepts its signers' keys either as bare base58 strings or as records that also
//! carry the key's origin (base path and root fingerprint). Both shapes resolve to a
//! [`ResolvedKey`] through [`ExtendedPublicKeyHandle::resolve`], which is the only place the
//! two are told apart.

use std::{fmt, str::FromStr};

use bitcoin::{
    bip32::{self, ChildNumber, DerivationPath, Fingerprint, Xpub},
    secp256k1::PublicKey,
};
use secp256k1::SECP256K1;
use serde::{Deserialize, Serialize};

use crate::{
    paths::{format_path, parse_path, ROOT},
    types::BraidNetwork,
};

/// Fingerprint recorded for keys whose root fingerprint is not known.
///
/// Four zero bytes do not mean "the root fingerprint is zero": they mean the key's
/// provenance is unverified. Signing tools that match keys to devices by fingerprint must
/// treat this value as a wildcard rather than as a real fingerprint.
pub const UNKNOWN_FINGERPRINT: [u8; 4] = [0u8; 4];

/// An extended public key as supplied to a braid.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtendedPublicKeyHandle {
    /// A bare base58 xpub with no origin information.
    Base58(String),

    /// An xpub together with the path it was derived at.
    Record(ExtendedPublicKeyRecord),
}

/// An xpub with its origin.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedPublicKeyRecord {
    /// The base58 encoded xpub.
    pub base58_string: String,

    /// Path from the root key to this xpub, e.g. `m/48'/1'/0'/2'`.
    pub path: String,

    /// Hex fingerprint of the root key, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_fingerprint: Option<String>,
}

impl ExtendedPublicKeyHandle {
    /// Creates a handle carrying origin information.
    pub fn record(
        base58_string: impl Into<String>,
        path: impl Into<String>,
        root_fingerprint: Option<Fingerprint>,
    ) -> Self {
        ExtendedPublicKeyHandle::Record(ExtendedPublicKeyRecord {
            base58_string: base58_string.into(),
            path: path.into(),
            root_fingerprint: root_fingerprint.map(|fp| fp.to_string()),
        })
    }

    /// The base58 encoded xpub.
    pub fn base58(&self) -> &str {
        match self {
            ExtendedPublicKeyHandle::Base58(s) => s,
            ExtendedPublicKeyHandle::Record(record) => &record.base58_string,
        }
    }

    /// Decodes and checks the handle against `network`.
    ///
    /// On failure every problem with the handle is reported, not just the first one.
    pub fn resolve(&self, network: BraidNetwork) -> Result<ResolvedKey, Vec<String>> {
        let xpub = Xpub::from_str(self.base58())
            .map_err(|err| vec![format!("cannot decode extended public key: {err}")])?;

        let mut violations = Vec::new();
        if xpub.network != network.network_kind() {
            violations.push(format!("extended public key is not valid on {network}"));
        }

        let (base_path, root_fingerprint) = match self {
            ExtendedPublicKeyHandle::Base58(_) => {
                (masked_path(&xpub), own_root_fingerprint(&xpub))
            }
            ExtendedPublicKeyHandle::Record(record) => {
                let base_path = match parse_path(&record.path) {
                    Ok(path) if path.len() != usize::from(xpub.depth) => {
                        violations.push(format!(
                            "path {} has depth {} but the key has depth {}",
                            record.path,
                            path.len(),
                            xpub.depth
                        ));
                        path
                    }
                    Ok(path) => path,
                    Err(err) => {
                        violations.push(format!("invalid path {:?}: {err}", record.path));
                        DerivationPath::master()
                    }
                };

                let root_fingerprint = match record.root_fingerprint.as_deref() {
                    Some(hex) => match parse_fingerprint(hex) {
                        Some(fp) => Some(fp),
                        None => {
                            violations.push(format!("invalid root fingerprint {hex:?}"));
                            None
                        }
                    },
                    None => own_root_fingerprint(&xpub),
                };

                (base_path, root_fingerprint)
            }
        };

        if !violations.is_empty() {
            return Err(violations);
        }

        Ok(ResolvedKey {
            xpub,
            base_path,
            root_fingerprint,
        })
    }
}

impl From<String> for ExtendedPublicKeyHandle {
    fn from(s: String) -> Self {
        ExtendedPublicKeyHandle::Base58(s)
    }
}

impl From<&str> for ExtendedPublicKeyHandle {
    fn from(s: &str) -> Self {
        ExtendedPublicKeyHandle::Base58(s.to_owned())
    }
}

impl From<Xpub> for ExtendedPublicKeyHandle {
    fn from(xpub: Xpub) -> Self {
        ExtendedPublicKeyHandle::Base58(xpub.to_string())
    }
}

impl fmt::Display for ExtendedPublicKeyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base58())
    }
}

/// A decoded, validated extended public key with its origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedKey {
    xpub: Xpub,
    base_path: DerivationPath,
    root_fingerprint: Option<Fingerprint>,
}

impl ResolvedKey {
    /// The decoded xpub.
    pub const fn xpub(&self) -> &Xpub {
        &self.xpub
    }

    /// Path from the root key to the xpub.
    ///
    /// For bare xpubs deeper than the root the ancestry is unknown; every ancestor index is
    /// masked as unhardened `0` and only the xpub's own child number is kept.
    pub fn base_path(&self) -> &DerivationPath {
        &self.base_path
    }

    /// Root fingerprint, if known.
    pub const fn root_fingerprint(&self) -> Option<Fingerprint> {
        self.root_fingerprint
    }

    /// Root fingerprint, or [`UNKNOWN_FINGERPRINT`] when it is not known.
    pub fn master_fingerprint(&self) -> Fingerprint {
        self.root_fingerprint
            .unwrap_or_else(|| Fingerprint::from(UNKNOWN_FINGERPRINT))
    }

    /// Derives the child public key at `children`, relative to the xpub.
    pub fn derive_child(&self, children: &DerivationPath) -> Result<PublicKey, bip32::Error> {
        Ok(self.xpub.derive_pub(SECP256K1, children)?.public_key)
    }

    /// Full path from the root key to the child at `children`.
    pub fn full_path(&self, children: &DerivationPath) -> DerivationPath {
        self.base_path.extend(children)
    }
}

impl fmt::Display for ResolvedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // descriptor key origin notation, e.g. `[f57ec65d/48'/1'/0'/2']tpub...`
        let path = format_path(&self.base_path);
        let origin = path.strip_prefix(ROOT).unwrap_or(&path);
        write!(f, "[{}{origin}]{}", self.master_fingerprint(), self.xpub)
    }
}

/// A root xpub is its own root; anything deeper has unknown ancestry.
fn own_root_fingerprint(xpub: &Xpub) -> Option<Fingerprint> {
    (xpub.depth == 0).then(|| xpub.fingerprint())
}

fn masked_path(xpub: &Xpub) -> DerivationPath {
    if xpub.depth == 0 {
        return DerivationPath::master();
    }

    let ancestors = vec![ChildNumber::Normal { index: 0 }; usize::from(xpub.depth) - 1];
    DerivationPath::from(ancestors).child(xpub.child_number)
}

fn parse_fingerprint(hex: &str) -> Option<Fingerprint> {
    let bytes: [u8; 4] = hex::decode(hex).ok()?.try_into().ok()?;
    Some(Fingerprint::from(bytes))
}

#[cfg(test)]
mod tests {
    use bitcoin::Network;
    use multisig_braid_test_utils::{master_xpub, signer};

    use super::*;

    #[test]
    fn record_resolves_with_origin() {
        let fixture = signer(1, Network::Testnet);
        let handle = ExtendedPublicKeyHandle::record(
            fixture.account.to_string(),
            fixture.account_path.clone(),
            Some(fixture.root_fingerprint),
        );

        let resolved = handle.resolve(BraidNetwork::Testnet).unwrap();
        assert_eq!(resolved.xpub(), &fixture.account);
        assert_eq!(format_path(resolved.base_path()), fixture.account_path);
        assert_eq!(resolved.root_fingerprint(), Some(fixture.root_fingerprint));
        assert_eq!(resolved.master_fingerprint(), fixture.root_fingerprint);
    }

    #[test]
    fn record_without_fingerprint_falls_back() {
        let fixture = signer(2, Network::Testnet);
        let handle = ExtendedPublicKeyHandle::record(
            fixture.account.to_string(),
            fixture.account_path.clone(),
            None,
        );

        let resolved = handle.resolve(BraidNetwork::Regtest).unwrap();
        assert_eq!(resolved.root_fingerprint(), None);
        assert_eq!(
            resolved.master_fingerprint(),
            Fingerprint::from(UNKNOWN_FINGERPRINT)
        );
    }

    #[test]
    fn bare_root_xpub_is_its_own_root() {
        let xpub = master_xpub(3, Network::Testnet);
        let handle = ExtendedPublicKeyHandle::from(xpub);

        let resolved = handle.resolve(BraidNetwork::Testnet).unwrap();
        assert!(resolved.base_path().is_master());
        assert_eq!(resolved.root_fingerprint(), Some(xpub.fingerprint()));
    }

    #[test]
    fn root_record_without_fingerprint_is_its_own_root() {
        let xpub = master_xpub(3, Network::Testnet);
        let record = ExtendedPublicKeyHandle::record(xpub.to_string(), "m", None);
        let bare = ExtendedPublicKeyHandle::from(xpub);

        let from_record = record.resolve(BraidNetwork::Testnet).unwrap();
        let from_bare = bare.resolve(BraidNetwork::Testnet).unwrap();

        assert_eq!(from_record.root_fingerprint(), Some(xpub.fingerprint()));
        assert_eq!(from_record.master_fingerprint(), from_bare.master_fingerprint());
        assert_eq!(from_record.base_path(), from_bare.base_path());
    }

    #[test]
    fn bare_account_xpub_has_masked_origin() {
        let fixture = signer(4, Network::Testnet);
        let handle = ExtendedPublicKeyHandle::from(fixture.account.to_string());

        let resolved = handle.resolve(BraidNetwork::Testnet).unwrap();
        assert_eq!(format_path(resolved.base_path()), "m/0/0/0/2'");
        assert_eq!(resolved.root_fingerprint(), None);
    }

    #[test]
    fn network_mismatch() {
        let fixture = signer(5, Network::Bitcoin);
        let handle = ExtendedPublicKeyHandle::from(fixture.account);

        let violations = handle.resolve(BraidNetwork::Testnet).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("testnet"), "{violations:?}");

        assert!(handle.resolve(BraidNetwork::Mainnet).is_ok());
    }

    #[test]
    fn garbage_base58() {
        let handle = ExtendedPublicKeyHandle::from("tpubNOTAKEY");
        let violations = handle.resolve(BraidNetwork::Testnet).unwrap_err();
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn record_violations_are_collected() {
        let fixture = signer(6, Network::Bitcoin);
        let handle = ExtendedPublicKeyRecord {
            base58_string: fixture.account.to_string(),
            path: "m/48'/0'".to_string(),
            root_fingerprint: Some("xyz".to_string()),
        };

        let violations = ExtendedPublicKeyHandle::Record(handle)
            .resolve(BraidNetwork::Testnet)
            .unwrap_err();
        // wrong network, wrong depth, bad fingerprint
        assert_eq!(violations.len(), 3, "{violations:?}");
    }

    #[test]
    fn derive_unhardened_child() {
        let fixture = signer(7, Network::Testnet);
        let resolved = ExtendedPublicKeyHandle::from(fixture.account)
            .resolve(BraidNetwork::Testnet)
            .unwrap();

        let children = [
            ChildNumber::Normal { index: 0 },
            ChildNumber::Normal { index: 5 },
        ];
        let expected = fixture
            .account
            .derive_pub(SECP256K1, &children)
            .unwrap()
            .public_key;
        assert_eq!(
            resolved
                .derive_child(&DerivationPath::from(&children[..]))
                .unwrap(),
            expected
        );
    }

    #[test]
    fn derive_hardened_child_fails() {
        let fixture = signer(8, Network::Testnet);
        let resolved = ExtendedPublicKeyHandle::from(fixture.account)
            .resolve(BraidNetwork::Testnet)
            .unwrap();

        let err = resolved
            .derive_child(&DerivationPath::from(vec![ChildNumber::Hardened { index: 0 }]))
            .unwrap_err();
        assert!(matches!(err, bip32::Error::CannotDeriveFromHardenedKey));
    }

    #[test]
    fn handle_json_shapes() {
        let bare: ExtendedPublicKeyHandle = serde_json::from_str("\"tpubABC\"").unwrap();
        assert_eq!(bare, ExtendedPublicKeyHandle::Base58("tpubABC".to_string()));

        let record: ExtendedPublicKeyHandle = serde_json::from_str(
            r#"{"base58String":"tpubABC","path":"m/48'/1'/0'/2'","rootFingerprint":"f57ec65d"}"#,
        )
        .unwrap();
        assert_eq!(record.base58(), "tpubABC");
        assert!(matches!(record, ExtendedPublicKeyHandle::Record(ref r)
            if r.root_fingerprint.as_deref() == Some("f57ec65d")));

        let without_fp = ExtendedPublicKeyHandle::record("tpubABC", "m", None);
        assert_eq!(
            serde_json::to_string(&without_fp).unwrap(),
            r#"{"base58String":"tpubABC","path":"m"}"#
        );
    }
}
