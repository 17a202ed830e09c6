use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "braid-cli",
    about = "Inspect multisig braids and derive their addresses",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Commands {
    Inspect(InspectArgs),

    Derive(DeriveArgs),
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Validate a braid config and print a summary", version)]
pub(crate) struct InspectArgs {
    #[arg(
        long,
        env = "BRAID_CONFIG",
        help = "the path to the braid config (.json or .toml)"
    )]
    pub(crate) config: PathBuf,
}

#[derive(Parser, Debug, Clone)]
#[command(
    about = "Derive the public keys, signing metadata and multisig address at a path",
    version
)]
pub(crate) struct DeriveArgs {
    #[arg(
        long,
        env = "BRAID_CONFIG",
        help = "the path to the braid config (.json or .toml)"
    )]
    pub(crate) config: PathBuf,

    #[arg(
        long,
        conflicts_with = "path",
        required_unless_present = "path",
        help = "the child index below the braid's branch"
    )]
    pub(crate) index: Option<u32>,

    #[arg(long, help = "the full bip32 path, e.g. m/0/5")]
    pub(crate) path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_takes_index_or_path() {
        let cli =
            Cli::try_parse_from(["braid-cli", "derive", "--config", "b.json", "--index", "5"])
                .unwrap();
        let Commands::Derive(args) = cli.command else {
            panic!("expected derive");
        };
        assert_eq!(args.index, Some(5));
        assert_eq!(args.path, None);

        let cli = Cli::try_parse_from([
            "braid-cli", "derive", "--config", "b.json", "--path", "m/0/5",
        ])
        .unwrap();
        let Commands::Derive(args) = cli.command else {
            panic!("expected derive");
        };
        assert_eq!(args.path.as_deref(), Some("m/0/5"));
    }

    #[test]
    fn derive_rejects_both_or_neither() {
        assert!(Cli::try_parse_from([
            "braid-cli", "derive", "--config", "b.json", "--index", "5", "--path", "m/0/5",
        ])
        .is_err());
        assert!(Cli::try_parse_from(["braid-cli", "derive", "--config", "b.json"]).is_err());
    }
}
