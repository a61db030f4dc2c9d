//! Error type shared by every stage of the model-building pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum ModelError {
	/// Rejected training parameter (temperature, smoothing, bits, order, bands)
	#[error("Invalid configuration: {0}")]
	InvalidConfig(String),

	/// I/O error with file context
	#[error("I/O error for {path}: {err}")]
	Io {
		path: PathBuf,
		#[source]
		err: std::io::Error,
	},

	/// JSON serialization/deserialization error
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),

	/// Binary cache serialization/deserialization error
	#[error("Binary cache error: {0}")]
	Binary(#[from] postcard::Error),

	/// Adjusted weights could not be represented (overflow, NaN)
	#[error("Quantization error: {0}")]
	Quantization(String),

	/// A loaded model breaks the persisted format contract
	#[error("Invalid model: {0}")]
	InvalidModel(String),

	/// A token label that has no vocabulary id
	#[error("Unknown token: {0}")]
	UnknownToken(String),

	/// Two accumulators that cannot be merged
	#[error("Mismatch: {0}")]
	Mismatch(String),
}

impl ModelError {
	/// Wraps an `io::Error` with the path it happened on.
	pub(crate) fn io<P: Into<PathBuf>>(path: P, err: std::io::Error) -> Self {
		Self::Io { path: path.into(), err }
	}
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, ModelError>;
