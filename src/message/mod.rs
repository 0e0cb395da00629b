//! The `message` module defines the message envelope exchanged between
//! agents and its JSON wire codec.
//!
//! The codec is pure and stateless: `encode` and `decode` only look at the
//! bytes they are given. Optional fields are omitted from the wire when
//! absent rather than serialized as null placeholders.

pub mod envelope;

pub use envelope::{Audience, Message, decode, encode};

#[cfg(test)]
mod tests;
