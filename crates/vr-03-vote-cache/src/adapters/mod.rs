//! Persistence adapters for the Vote Cache subsystem.

pub mod json_file;

pub use json_file::JsonFileStore;
