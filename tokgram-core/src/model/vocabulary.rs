use std::collections::HashMap;

use log::{debug, info};

use crate::error::{ModelError, Result};
use super::ngram_counter::PositionalNgramCounter;
use super::token::{Position, TokenId, VOCAB_SIZE, is_placeholder, placeholder_label};

/// Bijection between token labels and ids.
///
/// The vocabulary always holds exactly `VOCAB_SIZE` entries split into
/// three contiguous bands (see `Position::base`/`Position::capacity`).
/// It is built once per corpus and never modified afterwards.
///
/// # Invariants
/// - `id_to_token.len() == VOCAB_SIZE`
/// - `token_to_id[id_to_token[id]] == id` for every id
/// - Ids of band `p` lie in `[p.base(), p.base() + p.capacity())`
#[derive(Clone, Debug, PartialEq)]
pub struct Vocabulary {
	token_to_id: HashMap<String, TokenId>,
	id_to_token: Vec<String>,
}

impl Vocabulary {
	/// Builds the vocabulary from positional candidate counts.
	///
	/// Per band, the most frequent candidates (ties in first-seen order)
	/// receive consecutive ids from the band base. Slots left over when
	/// the corpus has too few candidates are filled with placeholders, so
	/// the size invariant holds even for an empty corpus.
	pub fn build(counter: &PositionalNgramCounter) -> Self {
		let mut id_to_token = Vec::with_capacity(VOCAB_SIZE);

		for position in Position::ALL {
			let top = counter.table(position).most_common(position.capacity());
			let real = top.len();
			id_to_token.extend(top.into_iter().map(|(label, _)| label.to_owned()));
			id_to_token.extend((real..position.capacity()).map(|index| placeholder_label(position, index)));
			debug!("{:?} band: {} candidates, {} placeholders", position, real, position.capacity() - real);
		}

		let token_to_id = id_to_token
			.iter()
			.enumerate()
			.map(|(id, label)| (label.clone(), id as TokenId))
			.collect();

		let vocabulary = Self { token_to_id, id_to_token };
		info!(
			"Vocabulary built: {} entries ({} begin, {} end, {} middle real tokens)",
			vocabulary.len(),
			vocabulary.real_count(Position::Begin),
			vocabulary.real_count(Position::End),
			vocabulary.real_count(Position::Middle),
		);
		vocabulary
	}

	/// Rebuilds a vocabulary from its id-ordered labels (model loading).
	///
	/// # Errors
	/// Returns `InvalidModel` if the size is wrong or a label is repeated.
	pub fn from_labels(id_to_token: Vec<String>) -> Result<Self> {
		if id_to_token.len() != VOCAB_SIZE {
			return Err(ModelError::InvalidModel(format!(
				"vocabulary must hold {} entries, got {}",
				VOCAB_SIZE,
				id_to_token.len()
			)));
		}

		let mut token_to_id = HashMap::with_capacity(VOCAB_SIZE);
		for (id, label) in id_to_token.iter().enumerate() {
			if token_to_id.insert(label.clone(), id as TokenId).is_some() {
				return Err(ModelError::InvalidModel(format!("duplicate vocabulary label {label:?}")));
			}
		}

		Ok(Self { token_to_id, id_to_token })
	}

	/// Id of a label.
	pub fn id(&self, label: &str) -> Option<TokenId> {
		self.token_to_id.get(label).copied()
	}

	/// Label of an id.
	pub fn token(&self, id: TokenId) -> Option<&str> {
		self.id_to_token.get(id as usize).map(String::as_str)
	}

	pub fn contains(&self, label: &str) -> bool {
		self.token_to_id.contains_key(label)
	}

	/// Always `VOCAB_SIZE`.
	pub fn len(&self) -> usize {
		self.id_to_token.len()
	}

	pub fn is_empty(&self) -> bool {
		self.id_to_token.is_empty()
	}

	/// Labels in id order.
	pub fn labels(&self) -> &[String] {
		&self.id_to_token
	}

	/// `(id, label)` pairs in id order.
	pub fn iter(&self) -> impl Iterator<Item = (TokenId, &str)> {
		self.id_to_token
			.iter()
			.enumerate()
			.map(|(id, label)| (id as TokenId, label.as_str()))
	}

	/// Number of non-placeholder entries of a band.
	pub fn real_count(&self, position: Position) -> usize {
		let band = position.base()..position.base() + position.capacity();
		self.id_to_token[band].iter().filter(|label| !is_placeholder(label)).count()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_empty_corpus_is_all_placeholders() {
		let vocabulary = Vocabulary::build(&PositionalNgramCounter::new());

		assert_eq!(vocabulary.len(), VOCAB_SIZE);
		assert_eq!(vocabulary.token(0), Some("[UNUSED_BEG_0]"));
		assert_eq!(vocabulary.token(256), Some("[UNUSED_END_0]"));
		assert_eq!(vocabulary.token(512), Some("[UNUSED_MID_0]"));
		assert_eq!(vocabulary.token(1023), Some("[UNUSED_MID_511]"));
		assert_eq!(vocabulary.token(1024), None);
		for position in Position::ALL {
			assert_eq!(vocabulary.real_count(position), 0);
		}
	}

	#[test]
	fn test_bands_are_ranked_by_frequency() {
		let mut counter = PositionalNgramCounter::new();
		counter.add_words(&["ab", "ac", "bc"]);
		let vocabulary = Vocabulary::build(&counter);

		// ^a (2) before ^ab$ (1), ^ac$ and ^b before ^bc$ by first-seen order.
		assert_eq!(vocabulary.id("^a"), Some(0));
		assert_eq!(vocabulary.id("^ab$"), Some(1));
		assert_eq!(vocabulary.id("^ac$"), Some(2));
		assert_eq!(vocabulary.id("^b"), Some(3));
		assert_eq!(vocabulary.id("^bc$"), Some(4));
		assert_eq!(vocabulary.token(5), Some("[UNUSED_BEG_5]"));

		assert_eq!(vocabulary.id("c$"), Some(256));
		assert_eq!(vocabulary.id("b$"), Some(257));
		assert_eq!(vocabulary.real_count(Position::Middle), 0);
	}

	#[test]
	fn test_ids_are_a_bijection() {
		let mut counter = PositionalNgramCounter::new();
		counter.add_words(&["running", "run", "runner"]);
		let vocabulary = Vocabulary::build(&counter);

		for (id, label) in vocabulary.iter() {
			assert_eq!(vocabulary.id(label), Some(id));
			assert!(Position::of_id(id).is_some());
		}
	}

	#[test]
	fn test_from_labels() {
		let vocabulary = Vocabulary::build(&PositionalNgramCounter::new());
		let rebuilt = Vocabulary::from_labels(vocabulary.labels().to_vec()).unwrap();
		assert_eq!(rebuilt, vocabulary);

		let mut short = vocabulary.labels().to_vec();
		short.pop();
		assert!(matches!(Vocabulary::from_labels(short), Err(ModelError::InvalidModel(_))));

		let mut duplicated = vocabulary.labels().to_vec();
		duplicated[1] = duplicated[0].clone();
		assert!(Vocabulary::from_labels(duplicated).is_err());
	}
}
