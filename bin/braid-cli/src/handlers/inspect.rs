//! Validates a braid config and prints a short summary of it.

use anyhow::Result;
use multisig_braid::Braid;
use tracing::info;

use crate::{cli::InspectArgs, config::load_braid};

/// Handles the inspect command.
pub(crate) fn handle_inspect(args: InspectArgs) -> Result<()> {
    let braid = load_braid(&args.config)?;
    info!(event = "braid config is valid", config = %args.config.display());

    println!("{}", summary(&braid));

    Ok(())
}

fn summary(braid: &Braid) -> String {
    let mut lines = vec![
        format!("network:        {}", braid.network()),
        format!("address type:   {}", braid.address_type()),
        format!(
            "quorum:         {}-of-{}",
            braid.required_signers(),
            braid.total_signers()
        ),
        format!("branch:         {}", braid.index()),
    ];
    lines.extend(
        braid
            .resolved_keys()
            .iter()
            .enumerate()
            .map(|(position, key)| format!("signer {position}:       {key}")),
    );

    lines.join("\n")
}
