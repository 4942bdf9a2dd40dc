//! # Adversarial Suites
//!
//! Malicious and broken vote-listing clients.

pub mod hostile_clients;
