use std::collections::BTreeMap;

use crate::error::{ModelError, Result};
use super::state::Context;
use super::token::{TokenId, VOCAB_SIZE};

/// One persisted row: `[context..., successor]` and its weight.
pub type WireEntry = (Vec<i32>, u32);

/// Quantized successor weights per context.
///
/// # Invariants
/// - Every context has length `order - 1`
/// - The weights of every context sum to `max_value`
/// - Successors of a context are in quantizer output order
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionTable {
	order: usize,
	max_value: u32,
	entries: BTreeMap<Context, Vec<(TokenId, u32)>>,
}

impl TransitionTable {
	/// Creates an empty table.
	pub fn new(order: usize, max_value: u32) -> Self {
		Self { order, max_value, entries: BTreeMap::new() }
	}

	pub(crate) fn insert(&mut self, context: Context, successors: Vec<(TokenId, u32)>) {
		self.entries.insert(context, successors);
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// Sum of the weights of every context.
	pub fn max_value(&self) -> u32 {
		self.max_value
	}

	/// Number of contexts.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Weighted successors of a context.
	pub fn successors(&self, context: &Context) -> Option<&[(TokenId, u32)]> {
		self.entries.get(context).map(Vec::as_slice)
	}

	/// Contexts with their successors, in context order.
	pub fn iter(&self) -> impl Iterator<Item = (&Context, &[(TokenId, u32)])> {
		self.entries.iter().map(|(context, successors)| (context, successors.as_slice()))
	}

	/// Selects the successor whose cumulative weight interval holds `value`.
	///
	/// Successor `i` owns `[w_0 + .. + w_(i-1), w_0 + .. + w_i)`. Returns
	/// `None` for an unknown context or when `value >= max_value`.
	pub fn lookup(&self, context: &Context, value: u32) -> Option<TokenId> {
		let mut cumulative: u64 = 0;
		for &(id, weight) in self.successors(context)? {
			cumulative += u64::from(weight);
			if u64::from(value) < cumulative {
				return Some(id);
			}
		}
		None
	}

	/// Flat persisted rows, grouped by context in context order.
	pub fn to_wire(&self) -> Vec<WireEntry> {
		self.iter()
			.flat_map(|(context, successors)| {
				let prefix = context.to_wire();
				successors.iter().map(move |&(id, weight)| {
					let mut ngram = prefix.clone();
					ngram.push(i32::from(id));
					(ngram, weight)
				})
			})
			.collect()
	}

	/// Rebuilds a table from persisted rows and checks its invariants.
	///
	/// # Errors
	/// Returns `InvalidModel` for rows of the wrong length, successor ids
	/// out of range, rows of one context that are not contiguous, or a
	/// context whose weights do not sum to `max_value`.
	pub fn from_wire(order: usize, max_value: u32, rows: &[WireEntry]) -> Result<Self> {
		let mut table = Self::new(order, max_value);
		let mut previous: Option<Context> = None;

		for (ngram, weight) in rows {
			if ngram.len() != order {
				return Err(ModelError::InvalidModel(format!(
					"n-gram row of length {} in a model of order {}",
					ngram.len(),
					order
				)));
			}
			let (&successor, context) = ngram
				.split_last()
				.ok_or_else(|| ModelError::InvalidModel("empty n-gram row".to_owned()))?;
			if !(0..VOCAB_SIZE as i32).contains(&successor) {
				return Err(ModelError::InvalidModel(format!("successor id {successor} out of range")));
			}
			let context = Context::from_wire(context)?;

			if previous.as_ref() != Some(&context) && table.entries.contains_key(&context) {
				return Err(ModelError::InvalidModel(format!("rows of context {:?} are not contiguous", context.to_wire())));
			}
			table.entries.entry(context.clone()).or_default().push((successor as TokenId, *weight));
			previous = Some(context);
		}

		table.validate()?;
		Ok(table)
	}

	/// Checks that every context sums to `max_value`.
	pub fn validate(&self) -> Result<()> {
		for (context, successors) in self.iter() {
			let total: u64 = successors.iter().map(|(_, weight)| u64::from(*weight)).sum();
			if total != u64::from(self.max_value) {
				return Err(ModelError::InvalidModel(format!(
					"weights of context {:?} sum to {}, expected {}",
					context.to_wire(),
					total,
					self.max_value
				)));
			}
		}
		Ok(())
	}
}
