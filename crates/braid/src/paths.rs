//! BIP32 path parsing and formatting.
//!
//! Paths are accepted in three spellings, all of which denote the same child sequence:
//!
//! | Spelling | Example |
//! |----------|---------|
//! | rooted   | `m/0/5` |
//! | slashed  | `/0/5`  |
//! | bare     | `0/5`   |
//!
//! Every segment is a decimal index below `2^31`, optionally followed by `'` or `h` to mark
//! it as hardened. Recorded paths are always formatted in the rooted spelling with `'` as the
//! hardened marker.

use std::str::FromStr;

use bitcoin::bip32::{self, ChildNumber, DerivationPath};

use crate::errors::PathError;

/// Root marker for recorded paths.
pub const ROOT: &str = "m";

/// Parses a BIP32 path into its child sequence.
///
/// A path consisting of only the root marker parses to the master path.
pub fn parse_path(path: &str) -> Result<DerivationPath, PathError> {
    if path.is_empty() {
        return Err(PathError::Empty);
    }
    if path == ROOT {
        return Ok(DerivationPath::master());
    }

    let relative = path
        .strip_prefix("m/")
        .or_else(|| path.strip_prefix('/'))
        .unwrap_or(path);

    relative.split('/').map(parse_segment).collect()
}

/// Parses a single unhardened index such as a braid's branch index.
pub fn parse_unhardened_index(index: &str) -> Result<ChildNumber, PathError> {
    if index.is_empty() {
        return Err(PathError::Empty);
    }
    if index.contains('/') {
        return Err(PathError::NotSingleIndex(index.to_owned()));
    }

    match parse_segment(index)? {
        child @ ChildNumber::Normal { .. } => Ok(child),
        ChildNumber::Hardened { .. } => Err(PathError::Hardened(index.to_owned())),
    }
}

/// Formats a path in the rooted spelling, e.g. `m/48'/1'/0'/2'/0/5`.
pub fn format_path(path: &DerivationPath) -> String {
    if path.is_master() {
        return ROOT.to_owned();
    }

    // not every bitcoin release prints the root marker
    let formatted = path.to_string();
    if formatted.starts_with(ROOT) {
        formatted
    } else {
        format!("{ROOT}/{formatted}")
    }
}

fn parse_segment(segment: &str) -> Result<ChildNumber, PathError> {
    if segment.is_empty() {
        return Err(PathError::EmptySegment);
    }
    // u32 parsing accepts a sign, bip32 paths do not
    if segment.starts_with('+') {
        return Err(PathError::InvalidSegment(segment.to_owned()));
    }

    ChildNumber::from_str(segment).map_err(|err| match err {
        bip32::Error::InvalidChildNumber(_) => PathError::OutOfRange(segment.to_owned()),
        _ => PathError::InvalidSegment(segment.to_owned()),
    })
}
