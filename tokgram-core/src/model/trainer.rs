use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, info, warn};

use crate::error::{ModelError, Result};
use crate::io::{build_output_path, extract_words, read_file};
use super::config::TrainingConfig;
use super::ngram_counter::PositionalNgramCounter;
use super::token::Position;
use super::tokenizer::Tokenizer;
use super::trained_model::Model;
use super::transition_counter::TransitionCounter;
use super::vocabulary::Vocabulary;

/// Builds a `Model` from a word corpus.
///
/// Training runs in two counting passes over the same words:
/// 1. positional candidate counting, then vocabulary construction
/// 2. segmentation with the new vocabulary and transition counting
///
/// followed by quantization of the full table and of its end-band subset.
///
/// Each pass splits the corpus into contiguous shards counted on their
/// own thread; partial accumulators are merged in shard order, which gives
/// exactly the result of a single sequential pass.
#[derive(Clone, Debug)]
pub struct Trainer {
	config: TrainingConfig,
}

impl Trainer {
	/// Creates a trainer.
	///
	/// # Errors
	/// Returns an error if the configuration is invalid.
	pub fn new(config: TrainingConfig) -> Result<Self> {
		config.validate()?;
		Ok(Self { config })
	}

	pub fn config(&self) -> &TrainingConfig {
		&self.config
	}

	/// Trains a model over an ordered word list.
	///
	/// Words are expected lowercase and alphabetic (see `io::extract_words`);
	/// empty words are ignored. An empty corpus is valid and produces a
	/// placeholder-only vocabulary with empty tables.
	///
	/// # Errors
	/// Returns an error on invalid configuration (checked before any work)
	/// or when quantization cannot represent the adjusted weights.
	pub fn train<S>(&self, words: &[S]) -> Result<Model>
	where
		S: AsRef<str> + Sync,
	{
		self.config.validate()?;
		let quantizer = self.config.quantizer()?;
		let order = self.config.ngram_size();
		let threads = self.config.effective_threads();

		info!("Collecting n-gram statistics from {} words ({} threads)...", words.len(), threads);
		let mut positional = PositionalNgramCounter::new();
		for partial in Self::count_sharded(words, threads, |chunk| {
			let mut counter = PositionalNgramCounter::new();
			counter.add_words(chunk);
			counter
		})? {
			positional.merge(&partial);
		}

		info!("Building vocabulary...");
		let vocabulary = Vocabulary::build(&positional);

		info!("Counting {}-gram transitions...", order);
		let mut transitions = TransitionCounter::new(order)?;
		for partial in Self::count_sharded(words, threads, |chunk| Self::count_transitions(chunk, order, &vocabulary))? {
			let partial = partial?;
			transitions.merge(&partial)?;
		}
		if transitions.skipped_words() > 0 {
			warn!("{} words skipped (tokens outside the vocabulary)", transitions.skipped_words());
		}

		let table = quantizer.quantize(&transitions, |_| true)?;
		let end_table = quantizer.quantize(&transitions, |id| Position::of_id(id) == Some(Position::End))?;

		info!(
			"Training done: {} words, {} skipped, {} contexts, {} end contexts",
			positional.word_count(),
			transitions.skipped_words(),
			table.len(),
			end_table.len()
		);

		// Thread count never shapes the model, so it is not kept.
		let mut parameters = self.config.clone();
		parameters.threads = 0;

		Ok(Model::new(
			vocabulary,
			parameters,
			table,
			end_table,
			positional.word_count(),
			transitions.skipped_words(),
		))
	}

	/// Trains a model over the words of a text.
	pub fn train_text(&self, text: &str) -> Result<Model> {
		self.train(&extract_words(text))
	}

	/// Trains a model over the words of a text file.
	pub fn train_file<P: AsRef<Path>>(&self, path: P) -> Result<Model> {
		let text = read_file(&path)?;
		self.train_text(&text)
	}

	/// Loads the model cached next to a corpus file, or trains it.
	///
	/// - The cache is `<stem>.bin` in the corpus directory (postcard).
	/// - A cache trained with other parameters is ignored and rewritten.
	///
	/// # Errors
	/// Returns an error if reading, training or writing the cache fails.
	pub fn load_or_train<P: AsRef<Path>>(&self, corpus_path: P) -> Result<Model> {
		let binary_data_path = build_output_path(&corpus_path, "bin")?;
		if binary_data_path.exists() {
			let model = Model::load_binary(&binary_data_path)?;
			if model.config().same_parameters(&self.config) {
				debug!("Using cached model {}", binary_data_path.display());
				return Ok(model);
			}
			info!("Cached model {} has other parameters, retraining", binary_data_path.display());
		}

		let model = self.train_file(&corpus_path)?;
		model.save_binary(&binary_data_path)?;
		Ok(model)
	}

	/// Segments and counts the words of one shard.
	fn count_transitions<S: AsRef<str>>(words: &[S], order: usize, vocabulary: &Vocabulary) -> Result<TransitionCounter> {
		let tokenizer = Tokenizer::new(vocabulary);
		let mut counter = TransitionCounter::new(order)?;

		for word in words {
			let word = word.as_ref();
			if word.is_empty() {
				continue;
			}
			match tokenizer.encode(word) {
				Ok(ids) => {
					counter.add_sequence(&ids, vocabulary);
				}
				Err(err) => {
					debug!("Skipping {:?}: {}", word, err);
					counter.skip_word();
				}
			}
		}

		Ok(counter)
	}

	/// Runs `count` over contiguous shards of `words` and returns the
	/// partial results in shard order.
	///
	/// # Behavior
	/// - One shard per thread; `threads <= 1` or a tiny corpus runs inline.
	/// - Threads report through an MPSC channel tagged with their shard
	///   index, results are re-ordered before being returned.
	///
	/// # Errors
	/// Returns an error if a shard did not report its result.
	fn count_sharded<S, T, F>(words: &[S], threads: usize, count: F) -> Result<Vec<T>>
	where
		S: Sync,
		T: Send,
		F: Fn(&[S]) -> T + Sync,
	{
		if threads <= 1 || words.len() < threads * 2 {
			return Ok(vec![count(words)]);
		}

		let chunk_size = words.len().div_ceil(threads);
		let shards = words.len().div_ceil(chunk_size);
		let count = &count;

		let (tx, rx) = mpsc::channel();
		thread::scope(|scope| {
			for (index, chunk) in words.chunks(chunk_size).enumerate() {
				let tx = tx.clone();
				scope.spawn(move || {
					debug!("Counting shard {} ({} words)", index, chunk.len());
					if tx.send((index, count(chunk))).is_err() {
						warn!("Shard {} finished after its receiver was dropped", index);
					}
				});
			}
		});
		drop(tx);

		let mut partials: Vec<(usize, T)> = rx.iter().collect();
		if partials.len() != shards {
			return Err(ModelError::Mismatch(format!("{} of {} counting shards reported", partials.len(), shards)));
		}
		partials.sort_by_key(|(index, _)| *index);

		Ok(partials.into_iter().map(|(_, partial)| partial).collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn corpus() -> Vec<String> {
		"the other brother ran to another mother then the weather turned and the runner ran on"
			.split(' ')
			.map(str::to_owned)
			.collect()
	}

	#[test]
	fn test_sharding_keeps_order() {
		let words: Vec<u32> = (0..103).collect();
		let partials = Trainer::count_sharded(&words, 4, |chunk| chunk.to_vec()).unwrap();

		assert_eq!(partials.len(), 4);
		assert_eq!(partials.concat(), words);
	}

	#[test]
	fn test_thread_count_does_not_change_result() {
		let words = corpus();

		let mut config = TrainingConfig::default();
		config.threads = 1;
		let sequential = Trainer::new(config.clone()).unwrap().train(&words).unwrap();
		config.threads = 3;
		let sharded = Trainer::new(config).unwrap().train(&words).unwrap();

		assert_eq!(sequential.to_json().unwrap(), sharded.to_json().unwrap());
	}

	#[test]
	fn test_empty_corpus() {
		let words: Vec<String> = Vec::new();
		let model = Trainer::new(TrainingConfig::default()).unwrap().train(&words).unwrap();

		assert_eq!(model.vocabulary().len(), 1024);
		assert!(model.transitions().is_empty());
		assert!(model.end_transitions().is_empty());
		assert_eq!(model.total_words(), 0);
	}

	#[test]
	fn test_end_table_only_holds_end_tokens() {
		let model = Trainer::new(TrainingConfig::default()).unwrap().train(&corpus()).unwrap();

		assert!(!model.end_transitions().is_empty());
		for (_, successors) in model.end_transitions().iter() {
			for (id, _) in successors {
				assert_eq!(Position::of_id(*id), Some(Position::End));
			}
		}
	}
}
