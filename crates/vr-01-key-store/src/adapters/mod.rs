//! Filesystem adapters for key material.

pub mod key_files;

pub use key_files::{load_key_pair, load_or_generate, save_key_pair};
