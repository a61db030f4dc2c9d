use rand::Rng;

use super::state::Context;
use super::token::{TokenId, ends_word, surface};
use super::trained_model::Model;
use super::transition_table::TransitionTable;

/// Default cap on the number of tokens of a preview word.
pub const DEFAULT_MAX_TOKENS: usize = 8;

/// Samples words from a trained model, the way a consumer of the
/// persisted tables would.
///
/// # Behavior
/// - Starts from the all-sentinel context
/// - Draws `value` uniformly in `[0, max_value)` and picks the successor
///   whose cumulative interval holds it
/// - Stops after a token that ends a word (`...$`), when the context has
///   no successors, or after `max_tokens` tokens
/// - The last allowed token is drawn from the end-only table when the
///   context has end successors, so a capped word still tends to finish
#[derive(Clone, Copy, Debug)]
pub struct Generator<'a> {
	model: &'a Model,
	max_tokens: usize,
}

impl<'a> Generator<'a> {
	pub fn new(model: &'a Model) -> Self {
		Self { model, max_tokens: DEFAULT_MAX_TOKENS }
	}

	/// Sets the token cap (at least 1).
	pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
		self.max_tokens = max_tokens.max(1);
		self
	}

	/// Samples one word.
	///
	/// Returns `None` when the model has no transition from the start
	/// context (empty corpus).
	pub fn preview_word<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<String> {
		let vocabulary = self.model.vocabulary();
		let mut context = Context::start(self.model.config().ngram_size() - 1);
		let mut word = String::new();

		for step in 0..self.max_tokens {
			let last = step + 1 == self.max_tokens;
			let next = if last && step > 0 {
				Self::sample(self.model.end_transitions(), &context, rng)
					.or_else(|| Self::sample(self.model.transitions(), &context, rng))
			} else {
				Self::sample(self.model.transitions(), &context, rng)
			};

			let Some(id) = next else { break };
			let Some(label) = vocabulary.token(id) else { break };
			word.push_str(surface(label));
			if ends_word(label) {
				break;
			}
			context = context.shift(id);
		}

		(!word.is_empty()).then_some(word)
	}

	/// Samples up to `count` words.
	pub fn preview_words<R: Rng + ?Sized>(&self, count: usize, rng: &mut R) -> Vec<String> {
		(0..count).filter_map(|_| self.preview_word(rng)).collect()
	}

	fn sample<R: Rng + ?Sized>(table: &TransitionTable, context: &Context, rng: &mut R) -> Option<TokenId> {
		table.successors(context)?;
		let value = rng.random_range(0..table.max_value());
		table.lookup(context, value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::config::TrainingConfig;
	use crate::model::trainer::Trainer;
	use rand::SeedableRng;
	use rand::rngs::StdRng;

	#[test]
	fn test_single_word_corpus() {
		let model = Trainer::new(TrainingConfig::default()).unwrap().train(&["hello", "hello"]).unwrap();
		let generator = Generator::new(&model);
		let mut rng = StdRng::seed_from_u64(7);

		for _ in 0..10 {
			assert_eq!(generator.preview_word(&mut rng).as_deref(), Some("hello"));
		}
	}

	#[test]
	fn test_empty_model() {
		let words: Vec<String> = Vec::new();
		let model = Trainer::new(TrainingConfig::default()).unwrap().train(&words).unwrap();
		let mut rng = StdRng::seed_from_u64(7);

		assert_eq!(Generator::new(&model).preview_word(&mut rng), None);
		assert!(Generator::new(&model).preview_words(3, &mut rng).is_empty());
	}

	#[test]
	fn test_token_cap() {
		let model = Trainer::new(TrainingConfig::default())
			.unwrap()
			.train(&["banana", "bandana", "cabana"])
			.unwrap();
		let generator = Generator::new(&model).with_max_tokens(1);
		let mut rng = StdRng::seed_from_u64(3);

		for word in generator.preview_words(10, &mut rng) {
			assert!(word.chars().count() <= 6);
		}
	}
}
