use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::io::read_file;
use super::config::TrainingConfig;
use super::token::{BOS, EOS, NUM_BEGINNING_TOKENS, NUM_END_TOKENS, NUM_MIDDLE_TOKENS, Position, TokenId};
use super::tokenizer::Tokenizer;
use super::transition_table::{TransitionTable, WireEntry};
use super::vocabulary::Vocabulary;

/// Persisted form of a trained model.
///
/// Field order is the order of the JSON document. `ngrams` and
/// `end_ngrams` rows are `([context..., successor], weight)`, with `-1`
/// standing for a context slot before the start of the word.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ModelFile {
	pub bos: String,
	pub eos: String,
	pub num_beginning_tokens: usize,
	pub num_end_tokens: usize,
	pub num_middle_tokens: usize,
	pub vocab: BTreeMap<String, TokenId>,
	pub id_to_token: Vec<String>,
	pub ngram_size: usize,
	pub probability_resolution_bits: u32,
	pub temperature: f64,
	pub smoothing_alpha: f64,
	pub total_words: usize,
	pub skipped_words: usize,
	pub ngrams: Vec<WireEntry>,
	pub end_ngrams: Vec<WireEntry>,
}

/// A trained model: vocabulary, parameters and quantized transitions.
///
/// # Invariants
/// - The vocabulary has exactly 1024 entries in three bands
/// - Both tables have the configured order and `2^bits - 1` as weight sum
/// - Every successor of `end_transitions` is an end-band id
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
	vocabulary: Vocabulary,
	config: TrainingConfig,
	transitions: TransitionTable,
	end_transitions: TransitionTable,
	total_words: usize,
	skipped_words: usize,
}

impl Model {
	pub(crate) fn new(
		vocabulary: Vocabulary,
		config: TrainingConfig,
		transitions: TransitionTable,
		end_transitions: TransitionTable,
		total_words: usize,
		skipped_words: usize,
	) -> Self {
		Self { vocabulary, config, transitions, end_transitions, total_words, skipped_words }
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocabulary
	}

	/// A tokenizer over this model's vocabulary.
	pub fn tokenizer(&self) -> Tokenizer<'_> {
		Tokenizer::new(&self.vocabulary)
	}

	/// Parameters the model was trained with.
	pub fn config(&self) -> &TrainingConfig {
		&self.config
	}

	/// Quantized transitions to every successor.
	pub fn transitions(&self) -> &TransitionTable {
		&self.transitions
	}

	/// Quantized transitions restricted to end-band successors.
	pub fn end_transitions(&self) -> &TransitionTable {
		&self.end_transitions
	}

	/// Non-empty words seen during training.
	pub fn total_words(&self) -> usize {
		self.total_words
	}

	/// Words left out of the transition counts.
	pub fn skipped_words(&self) -> usize {
		self.skipped_words
	}

	/// Converts the model to its persisted form.
	pub fn to_file(&self) -> ModelFile {
		ModelFile {
			bos: BOS.to_string(),
			eos: EOS.to_string(),
			num_beginning_tokens: NUM_BEGINNING_TOKENS,
			num_end_tokens: NUM_END_TOKENS,
			num_middle_tokens: NUM_MIDDLE_TOKENS,
			vocab: self.vocabulary.iter().map(|(id, label)| (label.to_owned(), id)).collect(),
			id_to_token: self.vocabulary.labels().to_vec(),
			ngram_size: self.config.ngram_size(),
			probability_resolution_bits: self.config.probability_resolution_bits(),
			temperature: self.config.temperature(),
			smoothing_alpha: self.config.smoothing_alpha(),
			total_words: self.total_words,
			skipped_words: self.skipped_words,
			ngrams: self.transitions.to_wire(),
			end_ngrams: self.end_transitions.to_wire(),
		}
	}

	/// Rebuilds a model from its persisted form.
	///
	/// # Errors
	/// Returns `InvalidModel` when the markers or band sizes differ from the
	/// ones this crate uses, when `vocab` and `id_to_token` disagree, or when
	/// a table breaks its invariants; `InvalidConfig` for bad parameters.
	pub fn from_file(file: ModelFile) -> Result<Self> {
		if file.bos != BOS.to_string() || file.eos != EOS.to_string() {
			return Err(ModelError::InvalidModel(format!("unexpected markers {:?} / {:?}", file.bos, file.eos)));
		}
		if (file.num_beginning_tokens, file.num_end_tokens, file.num_middle_tokens)
			!= (NUM_BEGINNING_TOKENS, NUM_END_TOKENS, NUM_MIDDLE_TOKENS)
		{
			return Err(ModelError::InvalidModel(format!(
				"unexpected band sizes {}/{}/{}",
				file.num_beginning_tokens, file.num_end_tokens, file.num_middle_tokens
			)));
		}

		let mut config = TrainingConfig::default();
		config.set_ngram_size(file.ngram_size)?;
		config.set_probability_resolution_bits(file.probability_resolution_bits)?;
		config.set_temperature(file.temperature)?;
		config.set_smoothing_alpha(file.smoothing_alpha)?;

		let vocabulary = Vocabulary::from_labels(file.id_to_token)?;
		if file.vocab.len() != vocabulary.len()
			|| file.vocab.iter().any(|(label, &id)| vocabulary.id(label) != Some(id))
		{
			return Err(ModelError::InvalidModel("vocab and id_to_token disagree".to_owned()));
		}

		let max_value = u32::try_from(config.max_value())
			.map_err(|_| ModelError::InvalidModel("resolution does not fit 32 bits".to_owned()))?;
		let transitions = TransitionTable::from_wire(file.ngram_size, max_value, &file.ngrams)?;
		let end_transitions = TransitionTable::from_wire(file.ngram_size, max_value, &file.end_ngrams)?;
		if end_transitions
			.iter()
			.flat_map(|(_, successors)| successors.iter())
			.any(|&(id, _)| Position::of_id(id) != Some(Position::End))
		{
			return Err(ModelError::InvalidModel("end_ngrams holds a non-end successor".to_owned()));
		}

		Ok(Self::new(vocabulary, config, transitions, end_transitions, file.total_words, file.skipped_words))
	}

	/// Pretty-printed JSON document.
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(&self.to_file())?)
	}

	/// Parses and validates a JSON document.
	pub fn from_json(json: &str) -> Result<Self> {
		let file: ModelFile = serde_json::from_str(json)?;
		Self::from_file(file)
	}

	/// Writes the model as pretty-printed JSON.
	///
	/// # Errors
	/// Returns an error if serialization or writing fails.
	pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let path = path.as_ref();
		fs::write(path, self.to_json()?).map_err(|err| ModelError::io(path, err))?;
		info!("Model written to {}", path.display());
		Ok(())
	}

	/// Reads and validates a JSON model.
	pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
		Self::from_json(&read_file(path)?)
	}

	/// Writes the model as a compact postcard binary.
	pub fn save_binary<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let path = path.as_ref();
		let bytes = postcard::to_stdvec(&self.to_file())?;
		fs::write(path, bytes).map_err(|err| ModelError::io(path, err))
	}

	/// Reads and validates a postcard binary model.
	pub fn load_binary<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let bytes = fs::read(path).map_err(|err| ModelError::io(path, err))?;
		Self::from_file(postcard::from_bytes(&bytes)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::trainer::Trainer;

	fn model() -> Model {
		let mut config = TrainingConfig::default();
		config.threads = 1;
		Trainer::new(config).unwrap().train(&["running", "run", "runner"]).unwrap()
	}

	#[test]
	fn test_json_layout() {
		let json = model().to_json().unwrap();
		let value: serde_json::Value = serde_json::from_str(&json).unwrap();

		assert_eq!(value["bos"], "^");
		assert_eq!(value["eos"], "$");
		assert_eq!(value["num_middle_tokens"], 512);
		assert_eq!(value["id_to_token"].as_array().unwrap().len(), 1024);
		assert_eq!(value["vocab"]["^r"], 0);
		assert_eq!(value["vocab"]["^run$"], 6);
		assert_eq!(value["ngram_size"], 2);
		assert_eq!(value["total_words"], 3);

		let first = &value["ngrams"][0];
		assert_eq!(first[0][0], -1);
	}

	#[test]
	fn test_json_round_trip() {
		let model = model();
		let reloaded = Model::from_json(&model.to_json().unwrap()).unwrap();
		assert_eq!(reloaded, model);
	}

	#[test]
	fn test_rejects_tampered_file() {
		let model = model();

		let mut file = model.to_file();
		file.ngrams[0].1 += 1;
		assert!(matches!(Model::from_file(file), Err(ModelError::InvalidModel(_))));

		let mut file = model.to_file();
		file.vocab.insert("^run$".to_owned(), 7);
		assert!(matches!(Model::from_file(file), Err(ModelError::InvalidModel(_))));

		let mut file = model.to_file();
		file.num_middle_tokens = 511;
		assert!(Model::from_file(file).is_err());

		let mut file = model.to_file();
		file.probability_resolution_bits = 0;
		assert!(matches!(Model::from_file(file), Err(ModelError::InvalidConfig(_))));
	}
}
