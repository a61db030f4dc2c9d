use std::collections::HashMap;

/// Frequency table that remembers the order in which keys were first seen.
///
/// Ranking ties are broken by that order, so two tables fed with the
/// same words in the same order always rank identically.
///
/// # Invariants
/// - `index[key]` is the position of `key` in `entries`
/// - Each count is strictly positive
#[derive(Clone, Debug, Default)]
pub struct FrequencyTable {
	entries: Vec<(String, u64)>,
	index: HashMap<String, usize>,
}

impl FrequencyTable {
	/// Creates an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds `count` occurrences of `key`.
	pub fn add(&mut self, key: &str, count: u64) {
		if let Some(&position) = self.index.get(key) {
			self.entries[position].1 += count;
		} else {
			self.index.insert(key.to_owned(), self.entries.len());
			self.entries.push((key.to_owned(), count));
		}
	}

	/// Records one occurrence of `key`.
	pub fn increment(&mut self, key: &str) {
		self.add(key, 1);
	}

	/// Occurrences of `key` (0 when unseen).
	pub fn get(&self, key: &str) -> u64 {
		self.index.get(key).map_or(0, |&position| self.entries[position].1)
	}

	/// Number of distinct keys.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Keys with their counts, in first-seen order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
		self.entries.iter().map(|(key, count)| (key.as_str(), *count))
	}

	/// The `limit` most frequent keys, highest count first.
	///
	/// The sort is stable: keys with equal counts keep their first-seen order.
	pub fn most_common(&self, limit: usize) -> Vec<(&str, u64)> {
		let mut ranked: Vec<(&str, u64)> = self.iter().collect();
		ranked.sort_by(|a, b| b.1.cmp(&a.1));
		ranked.truncate(limit);
		ranked
	}

	/// Merges another table into this one.
	///
	/// Counts of shared keys are summed; keys only present in `other` are
	/// appended in `other`'s order. Merging the tables of consecutive corpus
	/// shards, in shard order, gives the table a single pass would have built.
	pub fn merge(&mut self, other: &Self) {
		for (key, count) in other.iter() {
			self.add(key, count);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_most_common_keeps_first_seen_order_on_ties() {
		let mut table = FrequencyTable::new();
		for key in ["b", "a", "c", "a", "b", "d"] {
			table.increment(key);
		}

		let ranked = table.most_common(10);
		assert_eq!(ranked, vec![("b", 2), ("a", 2), ("c", 1), ("d", 1)]);
		assert_eq!(table.most_common(1), vec![("b", 2)]);
	}

	#[test]
	fn test_merge_matches_single_pass() {
		let keys = ["x", "y", "x", "z", "w", "y", "v"];

		let mut single = FrequencyTable::new();
		for key in keys {
			single.increment(key);
		}

		let mut left = FrequencyTable::new();
		let mut right = FrequencyTable::new();
		for key in &keys[..3] {
			left.increment(key);
		}
		for key in &keys[3..] {
			right.increment(key);
		}
		left.merge(&right);

		assert_eq!(left.iter().collect::<Vec<_>>(), single.iter().collect::<Vec<_>>());
		assert_eq!(left.get("y"), 2);
		assert_eq!(left.get("missing"), 0);
	}
}
