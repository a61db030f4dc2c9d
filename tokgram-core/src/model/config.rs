use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::io::read_file;
use super::quantizer::{MAX_RESOLUTION_BITS, Quantizer};

/// Training parameters.
///
/// `TrainingConfig` holds the n-gram order, the quantization parameters
/// echoed in the persisted model, and the degree of parallelism used while
/// counting (which never changes the result).
///
/// # Responsibilities
/// - Provide defaults for every parameter
/// - Reject invalid values before any training work starts
///
/// # Invariants (after `validate`)
/// - `ngram_size >= 1`
/// - `probability_resolution_bits` in `1..=32`
/// - `temperature > 0`, `smoothing_alpha >= 0`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
	/// Order of the transition model (context length + 1).
	ngram_size: usize,

	/// Weights of a context sum to `2^bits - 1`.
	probability_resolution_bits: u32,

	/// Exponent divisor applied to smoothed counts (< 1 sharpens, > 1 flattens).
	temperature: f64,

	/// Added to every raw count before tempering.
	smoothing_alpha: f64,

	/// Counting threads, 0 = one per logical CPU.
	pub threads: usize,
}

impl Default for TrainingConfig {
	fn default() -> Self {
		Self {
			ngram_size: 2,
			probability_resolution_bits: 8,
			temperature: 1.0,
			smoothing_alpha: 0.0,
			threads: 0,
		}
	}
}

impl TrainingConfig {
	/// Loads a configuration from a JSON file, missing fields defaulted.
	///
	/// # Errors
	/// Returns an error if the file cannot be read or parsed, or if a value
	/// is invalid.
	pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
		let contents = read_file(path)?;
		let config: Self = serde_json::from_str(&contents)?;
		config.validate()?;
		Ok(config)
	}

	/// Checks every parameter.
	pub fn validate(&self) -> Result<()> {
		if self.ngram_size < 1 {
			return Err(ModelError::InvalidConfig("n-gram size must be >= 1".to_owned()));
		}
		self.quantizer().map(|_| ())
	}

	/// Quantizer matching these parameters.
	pub fn quantizer(&self) -> Result<Quantizer> {
		Quantizer::new(self.probability_resolution_bits, self.temperature, self.smoothing_alpha)
	}

	pub fn ngram_size(&self) -> usize {
		self.ngram_size
	}

	pub fn probability_resolution_bits(&self) -> u32 {
		self.probability_resolution_bits
	}

	pub fn temperature(&self) -> f64 {
		self.temperature
	}

	pub fn smoothing_alpha(&self) -> f64 {
		self.smoothing_alpha
	}

	/// `2^bits - 1`
	pub fn max_value(&self) -> u64 {
		(1u64 << self.probability_resolution_bits) - 1
	}

	/// Whether two configurations produce the same model (threads ignored).
	pub fn same_parameters(&self, other: &Self) -> bool {
		self.ngram_size == other.ngram_size
			&& self.probability_resolution_bits == other.probability_resolution_bits
			&& self.temperature == other.temperature
			&& self.smoothing_alpha == other.smoothing_alpha
	}

	/// Number of counting threads actually used.
	pub fn effective_threads(&self) -> usize {
		if self.threads == 0 { num_cpus::get().max(1) } else { self.threads }
	}

	/// Sets the n-gram order.
	///
	/// # Errors
	/// Returns an error if `ngram_size < 1`.
	pub fn set_ngram_size(&mut self, ngram_size: usize) -> Result<()> {
		if ngram_size < 1 {
			return Err(ModelError::InvalidConfig("n-gram size must be >= 1".to_owned()));
		}
		self.ngram_size = ngram_size;
		Ok(())
	}

	/// Sets the quantization resolution.
	///
	/// # Errors
	/// Returns an error if `bits` is outside `1..=32`.
	pub fn set_probability_resolution_bits(&mut self, bits: u32) -> Result<()> {
		if !(1..=MAX_RESOLUTION_BITS).contains(&bits) {
			return Err(ModelError::InvalidConfig(format!(
				"probability resolution bits must be between 1 and {}",
				MAX_RESOLUTION_BITS
			)));
		}
		self.probability_resolution_bits = bits;
		Ok(())
	}

	/// Sets the temperature.
	///
	/// # Errors
	/// Returns an error if the value is not a positive finite number.
	pub fn set_temperature(&mut self, temperature: f64) -> Result<()> {
		if !(temperature > 0.0 && temperature.is_finite()) {
			return Err(ModelError::InvalidConfig("temperature must be > 0".to_owned()));
		}
		self.temperature = temperature;
		Ok(())
	}

	/// Sets the additive smoothing.
	///
	/// # Errors
	/// Returns an error if the value is negative or not finite.
	pub fn set_smoothing_alpha(&mut self, smoothing_alpha: f64) -> Result<()> {
		if !(smoothing_alpha >= 0.0 && smoothing_alpha.is_finite()) {
			return Err(ModelError::InvalidConfig("smoothing alpha must be >= 0".to_owned()));
		}
		self.smoothing_alpha = smoothing_alpha;
		Ok(())
	}
}
