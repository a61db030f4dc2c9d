//! Top-level module for the positional subword model.
//!
//! This crate provides everything needed to turn a word corpus into a
//! compact next-token model, including:
//! - The positional vocabulary (`Vocabulary`) and its tokenizer (`Tokenizer`)
//! - Transition counting (`TransitionCounter`) and quantization (`Quantizer`)
//! - Training orchestration (`Trainer`) and the persisted model (`Model`)
//! - A sampler for sanity checks (`Generator`)

/// Training parameters, defaults and validation.
pub mod config;

/// Insertion-ordered frequency table with a stable `most_common`.
pub mod frequency;

/// Samples preview words from the quantized tables.
pub mod generator;

/// Per-position candidate counting (beginning, end, middle substrings).
pub mod ngram_counter;

/// Exact-sum largest-remainder quantization of successor counts.
pub mod quantizer;

/// Contexts and per-context transition counts.
pub mod state;

/// Markers, band layout and label helpers.
pub mod token;

/// Greedy position-aware longest-match segmentation.
pub mod tokenizer;

/// Trained model and its JSON / binary persistence.
pub mod trained_model;

/// Corpus-to-model pipeline with sharded counting and a binary cache.
pub mod trainer;

/// Order-`n` transition counting over token sequences.
pub mod transition_counter;

/// Quantized successor weights and their persisted rows.
pub mod transition_table;

/// The 1024-entry banded vocabulary.
pub mod vocabulary;
