//! This crate provides deterministic key fixtures for testing braids.
//!
//! Every fixture is derived from a one-byte seed, so tests can refer to "signer 3" and get the
//! same keys on every run without shipping hard-coded xpubs.

pub mod keys;

pub use keys::{master_xpriv, master_xpub, signer, signers, SignerFixture};
