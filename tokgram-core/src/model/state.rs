use std::collections::BTreeMap;

use crate::error::{ModelError, Result};
use super::token::{TokenId, VOCAB_SIZE};

/// Value standing for "no history" when a context is persisted.
pub const SENTINEL: i32 = -1;

/// The `n-1` items preceding a prediction point.
///
/// Each item is a token id, or `None` (the sentinel) for positions before
/// the start of the word. Contexts order lexicographically with the
/// sentinel before every id, which is the order tables are persisted in.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Context(Vec<Option<TokenId>>);

impl Context {
	/// Context made only of sentinels (start of a word).
	pub fn start(len: usize) -> Self {
		Self(vec![None; len])
	}

	/// Context of position `index` in `ids`, left-padded with sentinels.
	pub fn preceding(ids: &[TokenId], index: usize, len: usize) -> Self {
		let items = (0..len)
			.map(|offset| (index + offset).checked_sub(len).map(|position| ids[position]))
			.collect();
		Self(items)
	}

	/// Context following this one once `id` has been emitted.
	pub fn shift(&self, id: TokenId) -> Self {
		let mut items = self.0.clone();
		if !items.is_empty() {
			items.remove(0);
			items.push(Some(id));
		}
		Self(items)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	pub fn items(&self) -> &[Option<TokenId>] {
		&self.0
	}

	/// Persisted form, sentinels written as `SENTINEL`.
	pub fn to_wire(&self) -> Vec<i32> {
		self.0.iter().map(|item| item.map_or(SENTINEL, i32::from)).collect()
	}

	/// Parses the persisted form.
	///
	/// # Errors
	/// Returns `InvalidModel` for values that are neither the sentinel
	/// nor a vocabulary id.
	pub fn from_wire(items: &[i32]) -> Result<Self> {
		items
			.iter()
			.map(|&item| match item {
				SENTINEL => Ok(None),
				id if (0..VOCAB_SIZE as i32).contains(&id) => Ok(Some(id as TokenId)),
				other => Err(ModelError::InvalidModel(format!("context item {other} out of range"))),
			})
			.collect::<Result<Vec<_>>>()
			.map(Self)
	}
}

/// Represents a state of the transition counter.
///
/// A `State` corresponds to one context (`key`) and stores all observed
/// transitions from this context to the next token.
///
/// ## Responsibilities:
/// - Accumulate transition occurrences during training
/// - Merge with another state having the same key (sharded counting)
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - Each transition occurrence count is strictly positive
#[derive(Clone, Debug, PartialEq)]
pub struct State {
	/// Identifier of the state.
	key: Context,
	/// Outgoing transitions indexed by the next token id.
	/// Example: { 3 => 42, 517 => 3 }
	transitions: BTreeMap<TokenId, u64>,
}

impl State {
	/// Creates a new empty state for the given context.
	pub fn new(key: Context) -> Self {
		Self {
			key,
			transitions: BTreeMap::new(),
		}
	}

	/// Records an occurrence of a transition toward `next`.
	pub fn add_transition(&mut self, next: TokenId) {
		*self.transitions.entry(next).or_insert(0) += 1;
	}

	pub fn key(&self) -> &Context {
		&self.key
	}

	/// `(successor, count)` pairs in id order.
	pub fn transitions(&self) -> impl Iterator<Item = (TokenId, u64)> + '_ {
		self.transitions.iter().map(|(id, count)| (*id, *count))
	}

	/// Total number of observations.
	pub fn total(&self) -> u64 {
		self.transitions.values().sum()
	}

	/// Merges another state into this one.
	///
	/// Both states must represent the same context. Transition occurrence
	/// counts are summed.
	///
	/// # Errors
	/// Returns an error if the state keys do not match.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.key != other.key {
			return Err(ModelError::Mismatch(format!("state key {:?} vs {:?}", self.key, other.key)));
		}

		for (next, occurrence) in &other.transitions {
			*self.transitions.entry(*next).or_insert(0) += *occurrence;
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_preceding_pads_with_sentinel() {
		let ids = [4, 300, 600];

		assert_eq!(Context::preceding(&ids, 0, 2).items(), &[None, None]);
		assert_eq!(Context::preceding(&ids, 1, 2).items(), &[None, Some(4)]);
		assert_eq!(Context::preceding(&ids, 2, 2).items(), &[Some(4), Some(300)]);
		assert!(Context::preceding(&ids, 2, 0).is_empty());
	}

	#[test]
	fn test_shift() {
		let context = Context::start(2).shift(7).shift(9);
		assert_eq!(context.items(), &[Some(7), Some(9)]);
		assert!(Context::start(0).shift(7).is_empty());
	}

	#[test]
	fn test_wire_form() {
		let context = Context::preceding(&[12], 1, 3);
		assert_eq!(context.to_wire(), vec![-1, -1, 12]);
		assert_eq!(Context::from_wire(&[-1, -1, 12]).unwrap(), context);
		assert!(Context::from_wire(&[1024]).is_err());
		assert!(Context::from_wire(&[-2]).is_err());
	}

	#[test]
	fn test_sentinel_sorts_first() {
		assert!(Context::from_wire(&[-1, 5]).unwrap() < Context::from_wire(&[0, 0]).unwrap());
	}

	#[test]
	fn test_merge() {
		let mut left = State::new(Context::start(1));
		left.add_transition(3);
		left.add_transition(3);
		let mut right = State::new(Context::start(1));
		right.add_transition(3);
		right.add_transition(8);

		left.merge(&right).unwrap();
		assert_eq!(left.transitions().collect::<Vec<_>>(), vec![(3, 3), (8, 1)]);
		assert_eq!(left.total(), 4);

		let other = State::new(Context::preceding(&[1], 1, 1));
		assert!(left.merge(&other).is_err());
	}
}
