//! # Domain Layer for the Key Store
//!
//! - **store**: the immutable `KeyStore` bundle and token resolution
//! - **errors**: lookup and loading failures

mod errors;
mod store;

pub use errors::*;
pub use store::*;
