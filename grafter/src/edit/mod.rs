//! Byte-range edit primitives.
//!
//! This module is the floor of the crate: every higher-level builder
//! (Rewriter, Transformer, `QueryRewriter`) lowers its operations into a
//! list of [`Edit`] values and hands them to an [`EditBuffer`], which
//! applies them against the immutable original source in one
//! deterministic pass.

mod buffer;

pub use buffer::{Edit, EditBuffer, EditPreview};
