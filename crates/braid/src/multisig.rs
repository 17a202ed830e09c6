//! Multisig script and address assembly.
//!
//! [`MultisigAssembler`] is the seam between a braid and whatever turns an ordered key list
//! into spendable script material. [`ScriptMultisigAssembler`] is the default, building a bare
//! `OP_CHECKMULTISIG` script and wrapping it according to the braid's [`AddressType`].

use bitcoin::{
    opcodes::all::OP_CHECKMULTISIG, script::Builder, secp256k1::PublicKey, Address, ScriptBuf,
};

use crate::{
    derivation::Bip32Derivation,
    errors::MultisigError,
    types::{AddressType, BraidNetwork},
};

/// Maximum number of keys `OP_CHECKMULTISIG` accepts.
pub const MAX_MULTISIG_KEYS: usize = 20;

/// Largest redeem script that fits in a single P2SH push.
pub const MAX_REDEEM_SCRIPT_SIZE: usize = 520;

/// Builds multisig script material from keys that are already in canonical order.
pub trait MultisigAssembler {
    /// The assembled construct.
    type Output;

    /// Assembles an `required_signers`-of-`pubkeys.len()` multisig.
    ///
    /// Implementations must not reorder `pubkeys`.
    fn assemble(
        &self,
        network: BraidNetwork,
        address_type: AddressType,
        required_signers: usize,
        pubkeys: &[PublicKey],
    ) -> Result<Self::Output, MultisigError>;
}

/// Default assembler producing [`Multisig`] values.
#[derive(Copy, Clone, Debug, Default)]
pub struct ScriptMultisigAssembler;

/// Script material for one multisig address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Multisig {
    /// The address type the scripts were wrapped for.
    pub address_type: AddressType,

    /// `OP_m <pubkeys...> OP_n OP_CHECKMULTISIG`.
    pub multisig_script: ScriptBuf,

    /// Script revealed in the `scriptSig`, for P2SH-based address types.
    pub redeem_script: Option<ScriptBuf>,

    /// Script revealed in the witness, for segwit address types.
    pub witness_script: Option<ScriptBuf>,

    /// The resulting address.
    pub address: Address,
}

impl Multisig {
    /// Output script paying to [`Self::address`].
    pub fn script_pubkey(&self) -> ScriptBuf {
        self.address.script_pubkey()
    }
}

impl MultisigAssembler for ScriptMultisigAssembler {
    type Output = Multisig;

    fn assemble(
        &self,
        network: BraidNetwork,
        address_type: AddressType,
        required_signers: usize,
        pubkeys: &[PublicKey],
    ) -> Result<Multisig, MultisigError> {
        let multisig_script = multisig_script(required_signers, pubkeys)?;
        let network = network.bitcoin_network();

        let (redeem_script, witness_script, address) = match address_type {
            AddressType::P2sh => {
                let size = multisig_script.len();
                if size > MAX_REDEEM_SCRIPT_SIZE {
                    return Err(MultisigError::RedeemScriptTooLarge(size));
                }
                let address = Address::p2sh(&multisig_script, network)
                    .map_err(|_| MultisigError::RedeemScriptTooLarge(size))?;
                (Some(multisig_script.clone()), None, address)
            }
            AddressType::P2shP2wsh => {
                let redeem_script = multisig_script.to_p2wsh();
                let address = Address::p2shwsh(&multisig_script, network);
                (Some(redeem_script), Some(multisig_script.clone()), address)
            }
            AddressType::P2wsh => {
                let address = Address::p2wsh(&multisig_script, network);
                (None, Some(multisig_script.clone()), address)
            }
        };

        Ok(Multisig {
            address_type,
            multisig_script,
            redeem_script,
            witness_script,
            address,
        })
    }
}

/// Builds `OP_m <pubkeys...> OP_n OP_CHECKMULTISIG` over `pubkeys` in the given order.
pub fn multisig_script(
    required_signers: usize,
    pubkeys: &[PublicKey],
) -> Result<ScriptBuf, MultisigError> {
    let total = pubkeys.len();
    if required_signers == 0 || required_signers > total {
        return Err(MultisigError::QuorumOutOfRange {
            required: required_signers,
            total,
        });
    }
    if total > MAX_MULTISIG_KEYS {
        return Err(MultisigError::TooManyKeys(total));
    }

    // both counts are bounded by MAX_MULTISIG_KEYS above
    let mut builder = Builder::new().push_int(required_signers as i64);
    for pubkey in pubkeys {
        builder = builder.push_key(&bitcoin::PublicKey::new(*pubkey));
    }

    Ok(builder
        .push_int(total as i64)
        .push_opcode(OP_CHECKMULTISIG)
        .into_script())
}

/// A multisig construct together with the braid it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BraidMultisig<M = Multisig> {
    /// The assembled construct.
    pub multisig: M,

    /// Canonical JSON of the braid, so signing tools can rebuild it.
    pub braid_details: String,

    /// Signing metadata, aligned with the key order used in the construct.
    pub bip32_derivation: Vec<Bip32Derivation>,
}

#[cfg(test)]
mod tests {
    use bitcoin::{opcodes::all::OP_PUSHNUM_2, secp256k1::SecretKey};
    use secp256k1::SECP256K1;

    use super::*;

    fn pubkeys(count: u8) -> Vec<PublicKey> {
        (1..=count)
            .map(|b| {
                let sk = SecretKey::from_slice(&[b; 32]).unwrap();
                PublicKey::from_secret_key(SECP256K1, &sk)
            })
            .collect()
    }

    #[test]
    fn script_layout() {
        let keys = pubkeys(3);
        let script = multisig_script(2, &keys).unwrap();
        let bytes = script.as_bytes();

        // OP_2, three 33-byte pushes, OP_3, OP_CHECKMULTISIG
        assert_eq!(bytes.len(), 1 + 3 * 34 + 1 + 1);
        assert_eq!(bytes[0], OP_PUSHNUM_2.to_u8());
        assert_eq!(bytes[1], 33);
        assert_eq!(&bytes[2..35], &keys[0].serialize());
        assert_eq!(*bytes.last().unwrap(), OP_CHECKMULTISIG.to_u8());
    }

    #[test]
    fn key_order_is_preserved() {
        let keys = pubkeys(2);
        let reversed: Vec<_> = keys.iter().rev().copied().collect();

        assert_ne!(
            multisig_script(1, &keys).unwrap(),
            multisig_script(1, &reversed).unwrap()
        );
    }

    #[test]
    fn quorum_bounds() {
        let keys = pubkeys(2);
        assert_eq!(
            multisig_script(0, &keys),
            Err(MultisigError::QuorumOutOfRange {
                required: 0,
                total: 2
            })
        );
        assert_eq!(
            multisig_script(3, &keys),
            Err(MultisigError::QuorumOutOfRange {
                required: 3,
                total: 2
            })
        );
        assert!(multisig_script(2, &keys).is_ok());

        let many = pubkeys(21);
        assert_eq!(
            multisig_script(1, &many),
            Err(MultisigError::TooManyKeys(21))
        );
    }

    #[test]
    fn p2sh() {
        let keys = pubkeys(3);
        let multisig = ScriptMultisigAssembler
            .assemble(BraidNetwork::Mainnet, AddressType::P2sh, 2, &keys)
            .unwrap();

        assert_eq!(multisig.redeem_script.as_ref(), Some(&multisig.multisig_script));
        assert_eq!(multisig.witness_script, None);
        assert!(multisig.address.to_string().starts_with('3'));
        assert_eq!(multisig.script_pubkey(), multisig.multisig_script.to_p2sh());
    }

    #[test]
    fn p2sh_size_limit() {
        // 15 keys fit in a P2SH push, 16 do not
        let fifteen = pubkeys(15);
        assert!(ScriptMultisigAssembler
            .assemble(BraidNetwork::Testnet, AddressType::P2sh, 1, &fifteen)
            .is_ok());

        let sixteen = pubkeys(16);
        assert_eq!(
            ScriptMultisigAssembler.assemble(
                BraidNetwork::Testnet,
                AddressType::P2sh,
                1,
                &sixteen
            ),
            Err(MultisigError::RedeemScriptTooLarge(1 + 16 * 34 + 1 + 1))
        );

        // witness scripts are not bound by the P2SH push limit
        assert!(ScriptMultisigAssembler
            .assemble(BraidNetwork::Testnet, AddressType::P2wsh, 1, &sixteen)
            .is_ok());
    }

    #[test]
    fn p2sh_p2wsh() {
        let keys = pubkeys(3);
        let multisig = ScriptMultisigAssembler
            .assemble(BraidNetwork::Testnet, AddressType::P2shP2wsh, 2, &keys)
            .unwrap();

        let witness = multisig.witness_script.clone().unwrap();
        assert_eq!(witness, multisig.multisig_script);
        assert_eq!(multisig.redeem_script, Some(witness.to_p2wsh()));
        assert_eq!(multisig.script_pubkey(), witness.to_p2wsh().to_p2sh());
        assert!(multisig.address.to_string().starts_with('2'));
    }

    #[test]
    fn p2wsh() {
        let keys = pubkeys(3);
        for (network, prefix) in [
            (BraidNetwork::Mainnet, "bc1q"),
            (BraidNetwork::Testnet, "tb1q"),
            (BraidNetwork::Signet, "tb1q"),
            (BraidNetwork::Regtest, "bcrt1q"),
        ] {
            let multisig = ScriptMultisigAssembler
                .assemble(network, AddressType::P2wsh, 2, &keys)
                .unwrap();

            assert_eq!(multisig.redeem_script, None);
            assert_eq!(multisig.witness_script.as_ref(), Some(&multisig.multisig_script));
            assert_eq!(multisig.script_pubkey(), multisig.multisig_script.to_p2wsh());
            assert!(
                multisig.address.to_string().starts_with(prefix),
                "{network}: {}",
                multisig.address
            );
        }
    }
}
