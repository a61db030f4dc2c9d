use super::frequency::FrequencyTable;
use super::token::{MAX_TOKEN_LEN, Position, begin_label, end_label, whole_label};

/// Accumulates candidate token frequencies for the three position classes.
///
/// For every word and every length `1..=6` (capped at the word length):
/// - the prefix is a beginning candidate (`^pre`, or `^word$` when the
///   prefix is the whole word)
/// - the suffix is an end candidate (`suf$`)
///
/// Interior substrings that neither start at the first character nor
/// reach the last one are middle candidates (unmarked).
///
/// The counter is an explicit accumulator: it is owned by whoever feeds
/// it, and partial counters built over consecutive shards are combined
/// with `merge`.
#[derive(Clone, Debug, Default)]
pub struct PositionalNgramCounter {
	beginning: FrequencyTable,
	end: FrequencyTable,
	middle: FrequencyTable,
	words: usize,
}

impl PositionalNgramCounter {
	/// Creates an empty counter.
	pub fn new() -> Self {
		Self::default()
	}

	/// Counts every candidate of one word. Empty words are ignored.
	pub fn add_word(&mut self, word: &str) {
		let chars: Vec<char> = word.chars().collect();
		let len = chars.len();
		if len == 0 {
			return;
		}
		self.words += 1;

		for ngram_len in 1..=MAX_TOKEN_LEN.min(len) {
			let prefix: String = chars[..ngram_len].iter().collect();
			if ngram_len == len {
				self.beginning.increment(&whole_label(&prefix));
			} else {
				self.beginning.increment(&begin_label(&prefix));
			}

			let suffix: String = chars[len - ngram_len..].iter().collect();
			self.end.increment(&end_label(&suffix));
		}

		// Interior only: start after the first character, stop before the last.
		for start in 1..len.saturating_sub(1) {
			for ngram_len in 1..=MAX_TOKEN_LEN {
				if start + ngram_len >= len {
					break;
				}
				let middle: String = chars[start..start + ngram_len].iter().collect();
				self.middle.increment(&middle);
			}
		}
	}

	/// Counts every word of a slice, in order.
	pub fn add_words<S: AsRef<str>>(&mut self, words: &[S]) {
		for word in words {
			self.add_word(word.as_ref());
		}
	}

	/// Frequency table of one position class.
	pub fn table(&self, position: Position) -> &FrequencyTable {
		match position {
			Position::Begin => &self.beginning,
			Position::End => &self.end,
			Position::Middle => &self.middle,
		}
	}

	/// Number of non-empty words counted.
	pub fn word_count(&self) -> usize {
		self.words
	}

	/// Merges a counter built over the shard following this one.
	pub fn merge(&mut self, other: &Self) {
		self.beginning.merge(&other.beginning);
		self.end.merge(&other.end);
		self.middle.merge(&other.middle);
		self.words += other.words;
	}
}
