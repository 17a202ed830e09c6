//! Derives the keys, signing metadata and multisig address at one path of a braid.

use anyhow::{bail, Result};
use multisig_braid::{paths::format_path, Bip32Derivation, Braid};
use serde::Serialize;
use tracing::info;

use crate::{cli::DeriveArgs, config::load_braid};

/// JSON document printed by the derive command.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeriveOutput {
    path: String,
    address: String,
    public_keys: Vec<String>,
    bip32_derivation: Vec<Bip32Derivation>,
    multisig_script: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    redeem_script: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    witness_script: Option<String>,
}

/// Handles the derive command.
pub(crate) fn handle_derive(args: DeriveArgs) -> Result<()> {
    let braid = load_braid(&args.config)?;
    let output = derive(&braid, args.index, args.path.as_deref())?;

    info!(event = "derived multisig", path = %output.path, address = %output.address);
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn derive(braid: &Braid, index: Option<u32>, path: Option<&str>) -> Result<DeriveOutput> {
    let requested = match (index, path) {
        (Some(index), None) => format!("{}/{index}", braid.index()),
        (None, Some(path)) => path.to_owned(),
        _ => bail!("exactly one of --index or --path must be given"),
    };

    let path = format_path(&braid.validate_path(&requested)?);
    let derived = braid.derive_multisig(&requested)?;

    let multisig = derived.multisig;

    Ok(DeriveOutput {
        path,
        address: multisig.address.to_string(),
        public_keys: derived
            .bip32_derivation
            .iter()
            .map(|record| record.pubkey().to_string())
            .collect(),
        bip32_derivation: derived.bip32_derivation,
        multisig_script: multisig.multisig_script.to_hex_string(),
        redeem_script: multisig.redeem_script.map(|script| script.to_hex_string()),
        witness_script: multisig.witness_script.map(|script| script.to_hex_string()),
    })
}

#[cfg(test)]
mod tests {
    use multisig_braid::BraidError;

    use super::*;
    use crate::test_support::testnet_braid;

    #[test]
    fn index_and_path_agree() {
        let braid = testnet_braid();

        let by_index = derive(&braid, Some(5), None).unwrap();
        let by_path = derive(&braid, None, Some("m/0/5")).unwrap();

        assert_eq!(by_index.path, "m/0/5");
        assert_eq!(by_index.address, by_path.address);
        assert_eq!(by_index.public_keys, braid.public_keys_at_index(5).unwrap());
        assert!(by_index.address.starts_with("tb1q"));
    }

    #[test]
    fn path_is_printed_rooted() {
        let braid = testnet_braid();

        for spelling in ["0/5", "/0/5", "m/0/5", "m/00/5"] {
            let output = derive(&braid, None, Some(spelling)).unwrap();
            assert_eq!(output.path, "m/0/5", "{spelling}");
        }
        assert_eq!(derive(&braid, Some(5), None).unwrap().path, "m/0/5");
    }

    #[test]
    fn output_json_shape() {
        let braid = testnet_braid();
        let output = derive(&braid, Some(0), None).unwrap();
        let json = serde_json::to_value(&output).unwrap();

        assert_eq!(json["publicKeys"].as_array().unwrap().len(), 3);
        assert_eq!(json["bip32Derivation"].as_array().unwrap().len(), 3);
        assert_eq!(
            json["bip32Derivation"][0]["pubkey"],
            json["publicKeys"][0]
        );
        assert!(json["witnessScript"].is_string());
        assert!(json.get("redeemScript").is_none());
    }

    #[test]
    fn foreign_branch_is_rejected() {
        let braid = testnet_braid();
        let err = derive(&braid, None, Some("m/1/5")).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<BraidError>(),
            Some(BraidError::BranchMismatch { .. })
        ));
    }
}
