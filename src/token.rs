//! Marketplace token reading: permission tables, claim extraction, and usability verdicts.
//!
//! Tokens are read, never verified. The payload segment is decoded and its `sid`, `exp`,
//! and `s` claims are interpreted; the header and signature segments are ignored. The
//! backend remains the authority on whether a submitted token is genuine.

pub mod claims;
pub mod decoded;
pub mod permission;
pub mod secret;

pub use claims::*;
pub use decoded::*;
pub use permission::*;
pub use secret::*;
