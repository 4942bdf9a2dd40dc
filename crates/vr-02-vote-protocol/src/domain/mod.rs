//! # Domain Layer for the Vote Protocol
//!
//! - **session**: per-connection state machine
//! - **frame**: protocol detection and token framing
//! - **legacy**: RSA block decoding
//! - **token**: HMAC-authenticated JSON decoding and acknowledgements
//! - **errors**: classified decode failures

pub mod errors;
pub mod frame;
pub mod legacy;
pub mod session;
pub mod token;

pub use errors::*;
pub use frame::{detect_frame, FrameStatus, TOKEN_MAGIC};
pub use legacy::encode_legacy;
pub use session::{ProtocolSession, SessionState};
pub use token::{ack_error, ack_ok, encode_token};
