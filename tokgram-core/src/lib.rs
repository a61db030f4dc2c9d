//! Position-aware subword vocabulary and quantized transition tables.
//!
//! This crate builds the statistical tables used to disguise binary
//! payloads as natural-looking words:
//! - Positional n-gram counting over a word corpus
//! - A fixed-size (1024 entries) vocabulary split into begin/end/middle bands
//! - A greedy, position-aware longest-match tokenizer
//! - Token transition counting and exact-sum integer quantization
//! - JSON persistence and a compact binary cache
//!
//! Every stage is deterministic: the same corpus and parameters always
//! produce byte-identical tables.

/// Error type and result alias.
pub mod error;

/// Vocabulary, tokenizer, counters, quantizer and persisted model.
pub mod model;

/// I/O utilities (file loading, word extraction, path helpers).
pub mod io;

pub use error::{ModelError, Result};
