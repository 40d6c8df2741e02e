//! Core types shared by the gateway rescue crates
//!
//! The only thing every layer agrees on is the error taxonomy: a small set
//! of tagged kinds, each preserving the original cause text. Callers match
//! on the kind; humans read the message.

mod error;

pub use error::{CoreError, CoreResult, ErrorReport};
