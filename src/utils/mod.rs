//! The `utils` module provides shared utilities used across `roomcast`.
//!
//! This module centralizes reusable components, such as the crate error
//! types and logging setup, to promote consistency and reduce duplication.

pub mod error;
pub mod logging;
