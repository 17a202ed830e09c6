use std::{fs, path::Path};

use anyhow::{anyhow, Context, Result};
use multisig_braid::{Braid, BraidConfig};
use tracing::debug;

/// Loads and validates a braid from a `.json` or `.toml` config file.
pub(crate) fn load_braid(path: &Path) -> Result<Braid> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read braid config {}", path.display()))?;

    let braid = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => {
            let config: BraidConfig = toml::from_str(&contents)
                .map_err(|e| anyhow!(format!("Failed to parse braid config: {}", e)))?;
            Braid::try_from(config)?
        }
        _ => Braid::from_json(&contents)?,
    };

    debug!(path = %path.display(), network = %braid.network(), "loaded braid");

    Ok(braid)
}
