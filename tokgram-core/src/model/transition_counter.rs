use std::collections::BTreeMap;

use log::warn;

use crate::error::{ModelError, Result};
use super::state::{Context, State};
use super::token::TokenId;
use super::vocabulary::Vocabulary;

/// Counts token transitions of order `n`.
///
/// Every word contributes one observation per token: the `n-1` preceding
/// tokens (sentinel-padded at the start of the word) form the context and
/// the token itself is the successor.
///
/// # Responsibilities
/// - Replay token sequences and accumulate transition counts per context
/// - Skip, as a whole, any sequence holding an id unknown to the vocabulary
/// - Merge with another counter of the same order (sharded counting)
///
/// # Invariants
/// - `n` is always >= 1
/// - Each state in `states` is keyed by a context of length `n-1`
/// - All state transitions have occurrence counts >= 1
#[derive(Clone, Debug)]
pub struct TransitionCounter {
	/// The order of the model (context length + 1)
	n: usize,

	/// Mapping from a context to its corresponding state
	states: BTreeMap<Context, State>,

	/// Sequences counted
	counted_words: usize,

	/// Sequences rejected because of an unknown id
	skipped_words: usize,
}

impl TransitionCounter {
	/// Creates a new counter of order `n`.
	///
	/// # Errors
	/// Returns an error if `n < 1`.
	pub fn new(n: usize) -> Result<Self> {
		if n < 1 {
			return Err(ModelError::InvalidConfig("n-gram order must be >= 1".to_owned()));
		}
		Ok(Self { n, states: BTreeMap::new(), counted_words: 0, skipped_words: 0 })
	}

	/// Adds the token sequence of one word.
	///
	/// Returns `false` (and counts the word as skipped) when an id is
	/// missing from `vocabulary`; nothing of that word is recorded.
	pub fn add_sequence(&mut self, ids: &[TokenId], vocabulary: &Vocabulary) -> bool {
		if let Some(unknown) = ids.iter().find(|&&id| vocabulary.token(id).is_none()) {
			warn!("Skipping sequence with unknown token id {}", unknown);
			self.skipped_words += 1;
			return false;
		}

		for index in 0..ids.len() {
			let context = Context::preceding(ids, index, self.n - 1);
			let state = self.states.entry(context.clone()).or_insert_with(|| State::new(context));
			state.add_transition(ids[index]);
		}
		self.counted_words += 1;
		true
	}

	/// Records a word that could not be turned into ids at all.
	pub fn skip_word(&mut self) {
		self.skipped_words += 1;
	}

	pub fn order(&self) -> usize {
		self.n
	}

	/// States in context order.
	pub fn states(&self) -> impl Iterator<Item = &State> {
		self.states.values()
	}

	pub fn state(&self, context: &Context) -> Option<&State> {
		self.states.get(context)
	}

	pub fn counted_words(&self) -> usize {
		self.counted_words
	}

	pub fn skipped_words(&self) -> usize {
		self.skipped_words
	}

	/// Merges another counter into this one.
	///
	/// # Notes
	/// - Both counters must have the same order `n`.
	/// - Occurrence counts for matching states and transitions are summed.
	///
	/// # Errors
	/// Returns an error if the orders do not match.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.n != other.n {
			return Err(ModelError::Mismatch(format!("n-gram order {} vs {}", self.n, other.n)));
		}

		for (key, state) in &other.states {
			if let Some(existing) = self.states.get_mut(key) {
				existing.merge(state)?;
			} else {
				self.states.insert(key.clone(), state.clone());
			}
		}
		self.counted_words += other.counted_words;
		self.skipped_words += other.skipped_words;

		Ok(())
	}
}
