//! Exact-sum integer quantization of successor distributions.
//!
//! Per context, raw counts become integer weights that add up to exactly
//! `max_value = 2^bits - 1`:
//!
//! 1. each count is adjusted to `(count + alpha) ^ (1 / temperature)`
//! 2. successors are ranked by adjusted weight, ties by ascending id
//! 3. every successor gets `floor(adjusted * pool / total)`, on top of a
//!    guaranteed 1 when there are fewer successors than `max_value`
//!    (`pool` is then `max_value - successors`, `max_value` otherwise)
//! 4. the units lost by flooring go, one each, to the largest truncated
//!    fractions (largest-remainder apportionment)
//! 5. the result is ordered by weight, then adjusted weight, then id
//!
//! With at least `max_value` successors a low-weight successor can end at
//! 0; it is then dropped from the table and must be read as "never".

use std::cmp::Ordering;

use log::{debug, info, warn};

use crate::error::{ModelError, Result};
use super::token::TokenId;
use super::transition_counter::TransitionCounter;
use super::transition_table::TransitionTable;

/// Largest supported `probability_resolution_bits`.
pub const MAX_RESOLUTION_BITS: u32 = 32;

/// Validated quantization parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quantizer {
	max_value: u32,
	temperature: f64,
	smoothing_alpha: f64,
}

/// Working record of one successor during apportionment.
#[derive(Clone, Copy, Debug)]
struct Share {
	id: TokenId,
	adjusted: f64,
	weight: u64,
	remainder: f64,
}

impl Share {
	/// Descending adjusted weight, then ascending id.
	fn rank(&self, other: &Self) -> Ordering {
		other.adjusted.total_cmp(&self.adjusted).then(self.id.cmp(&other.id))
	}
}

impl Quantizer {
	/// Quantizer producing weights that sum to `2^bits - 1`.
	///
	/// # Errors
	/// Returns `InvalidConfig` if `bits` is outside `1..=32`, if
	/// `temperature <= 0` or if `smoothing_alpha < 0`.
	pub fn new(bits: u32, temperature: f64, smoothing_alpha: f64) -> Result<Self> {
		if !(1..=MAX_RESOLUTION_BITS).contains(&bits) {
			return Err(ModelError::InvalidConfig(format!(
				"probability resolution bits must be between 1 and {}, got {}",
				MAX_RESOLUTION_BITS, bits
			)));
		}
		Self::with_max_value(((1u64 << bits) - 1) as u32, temperature, smoothing_alpha)
	}

	/// Quantizer producing weights that sum to `max_value`.
	///
	/// # Errors
	/// Returns `InvalidConfig` if `max_value` is 0, if `temperature` is not
	/// a positive finite number or if `smoothing_alpha` is negative or not finite.
	pub fn with_max_value(max_value: u32, temperature: f64, smoothing_alpha: f64) -> Result<Self> {
		if max_value == 0 {
			return Err(ModelError::InvalidConfig("max value must be >= 1".to_owned()));
		}
		if !(temperature > 0.0 && temperature.is_finite()) {
			return Err(ModelError::InvalidConfig(format!("temperature must be > 0, got {temperature}")));
		}
		if !(smoothing_alpha >= 0.0 && smoothing_alpha.is_finite()) {
			return Err(ModelError::InvalidConfig(format!("smoothing alpha must be >= 0, got {smoothing_alpha}")));
		}
		Ok(Self { max_value, temperature, smoothing_alpha })
	}

	pub fn max_value(&self) -> u32 {
		self.max_value
	}

	pub fn temperature(&self) -> f64 {
		self.temperature
	}

	pub fn smoothing_alpha(&self) -> f64 {
		self.smoothing_alpha
	}

	/// Quantizes one context's `(successor, raw count)` distribution.
	///
	/// Returns `(successor, weight)` pairs in final order, zero weights
	/// removed. The weights sum to `max_value` unless `successors` is empty.
	///
	/// # Errors
	/// Returns `Quantization` when an adjusted weight or their total is not
	/// a finite positive number (typically a very low temperature applied
	/// to large counts).
	pub fn quantize_distribution(&self, successors: &[(TokenId, u64)]) -> Result<Vec<(TokenId, u32)>> {
		if successors.is_empty() {
			return Ok(Vec::new());
		}

		let exponent = 1.0 / self.temperature;
		let mut shares = successors
			.iter()
			.map(|&(id, count)| {
				let adjusted = (count as f64 + self.smoothing_alpha).powf(exponent);
				if adjusted.is_finite() {
					Ok(Share { id, adjusted, weight: 0, remainder: 0.0 })
				} else {
					Err(ModelError::Quantization(format!(
						"adjusted weight of successor {id} (count {count}) is not finite"
					)))
				}
			})
			.collect::<Result<Vec<_>>>()?;

		let total: f64 = shares.iter().map(|share| share.adjusted).sum();
		if !(total > 0.0 && total.is_finite()) {
			return Err(ModelError::Quantization(format!("total adjusted weight {total} is not usable")));
		}

		shares.sort_by(Share::rank);

		let max_value = u64::from(self.max_value);
		let count = shares.len() as u64;
		let (base, pool) = if count >= max_value { (0, max_value) } else { (1, max_value - count) };

		for share in &mut shares {
			let exact = share.adjusted * pool as f64 / total;
			let floor = exact.floor();
			share.weight = base + floor as u64;
			share.remainder = exact - floor;
		}

		Self::apportion(&mut shares, max_value, base);

		shares.sort_by(|a, b| b.weight.cmp(&a.weight).then_with(|| a.rank(b)));

		let dropped = shares.iter().filter(|share| share.weight == 0).count();
		if dropped > 0 {
			debug!("{} of {} successors quantized to weight 0", dropped, shares.len());
		}

		Ok(shares
			.into_iter()
			.filter(|share| share.weight > 0)
			.map(|share| (share.id, share.weight as u32))
			.collect())
	}

	/// Hands out the units lost by flooring, largest fraction first.
	///
	/// Shares must be in rank order: the stable sort keeps that order
	/// among equal fractions. Floating-point error can, in rare cases, make
	/// the floors overshoot; units are then taken back from the smallest
	/// fractions, never below `base`.
	fn apportion(shares: &mut [Share], max_value: u64, base: u64) {
		let mut by_remainder: Vec<usize> = (0..shares.len()).collect();
		by_remainder.sort_by(|&a, &b| shares[b].remainder.total_cmp(&shares[a].remainder));

		let assigned: u64 = shares.iter().map(|share| share.weight).sum();
		if assigned <= max_value {
			let remaining = max_value - assigned;
			for step in 0..remaining as usize {
				shares[by_remainder[step % by_remainder.len()]].weight += 1;
			}
		} else {
			let mut excess = assigned - max_value;
			while excess > 0 {
				let mut progressed = false;
				for &index in by_remainder.iter().rev() {
					if excess == 0 {
						break;
					}
					if shares[index].weight > base {
						shares[index].weight -= 1;
						excess -= 1;
						progressed = true;
					}
				}
				if !progressed {
					break;
				}
			}
		}
	}

	/// Quantizes every context of a counter.
	///
	/// Only successors accepted by `keep` take part; a context left without
	/// successors is omitted from the table.
	pub fn quantize<F>(&self, counter: &TransitionCounter, keep: F) -> Result<TransitionTable>
	where
		F: Fn(TokenId) -> bool,
	{
		let mut table = TransitionTable::new(counter.order(), self.max_value);
		let mut dropped = 0;

		for state in counter.states() {
			let successors: Vec<(TokenId, u64)> = state.transitions().filter(|(id, _)| keep(*id)).collect();
			if successors.is_empty() {
				continue;
			}

			let weights = self.quantize_distribution(&successors)?;
			dropped += successors.len() - weights.len();
			table.insert(state.key().clone(), weights);
		}

		if dropped > 0 {
			warn!("{} successors quantized to weight 0 and dropped", dropped);
		}
		info!("Quantized {} contexts to a resolution of {}", table.len(), self.max_value);
		Ok(table)
	}
}
