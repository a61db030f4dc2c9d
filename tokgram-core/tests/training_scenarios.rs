//! End-to-end training scenarios and persistence round-trips.

use std::fs;

use tempfile::TempDir;
use tokgram_core::ModelError;
use tokgram_core::model::config::TrainingConfig;
use tokgram_core::model::state::Context;
use tokgram_core::model::token::{Position, is_placeholder};
use tokgram_core::model::trained_model::Model;
use tokgram_core::model::trainer::Trainer;

fn trainer() -> Trainer {
	let mut config = TrainingConfig::default();
	config.threads = 1;
	Trainer::new(config).expect("default config is valid")
}

#[test]
fn test_running_run_runner() {
	let model = trainer().train(&["running", "run", "runner"]).unwrap();
	let vocabulary = model.vocabulary();
	let tokenizer = model.tokenizer();

	assert!(vocabulary.contains("^r"));
	assert!(vocabulary.contains("^ru"));
	assert!(vocabulary.contains("^run$"));

	let ids = tokenizer.encode("running").unwrap();
	assert_eq!(tokenizer.decode(&ids).unwrap(), "running");

	// "run" is a single whole-word token
	let run = tokenizer.encode("run").unwrap();
	assert_eq!(run, vec![vocabulary.id("^run$").unwrap()]);

	let after_first = Context::preceding(&ids, 1, 1);
	let successors = model.transitions().successors(&after_first).unwrap();
	let total: u32 = successors.iter().map(|(_, weight)| weight).sum();
	assert_eq!(total, 255);

	let start = model.transitions().successors(&Context::start(1)).unwrap();
	assert_eq!(start.iter().map(|(_, weight)| weight).sum::<u32>(), 255);
}

#[test]
fn test_single_letter_word() {
	let model = trainer().train(&["a"]).unwrap();
	let vocabulary = model.vocabulary();

	let whole = vocabulary.id("^a$").unwrap();
	assert_eq!(whole, 0);
	assert_eq!(model.tokenizer().encode("a").unwrap(), vec![whole]);

	// "a$" is also counted as a suffix, in the end band
	assert_eq!(Position::of_id(vocabulary.id("a$").unwrap()), Some(Position::End));
	assert_eq!(model.transitions().successors(&Context::start(1)), Some(&[(whole, 255)][..]));
	assert!(model.end_transitions().is_empty());
}

#[test]
fn test_repeated_word_is_padded_with_placeholders() {
	let words = vec!["banana"; 5];
	let model = trainer().train(&words).unwrap();
	let vocabulary = model.vocabulary();

	assert_eq!(vocabulary.len(), 1024);
	assert!(vocabulary.real_count(Position::Begin) < 256);
	assert!(vocabulary.labels()[1023..].iter().all(|label| is_placeholder(label)));

	// One token chain: every context has exactly one successor
	let ids = model.tokenizer().encode("banana").unwrap();
	assert_eq!(model.transitions().len(), ids.len());
	for (_, successors) in model.transitions().iter() {
		assert_eq!(successors.len(), 1);
		assert_eq!(successors[0].1, 255);
	}
	assert_eq!(model.total_words(), 5);
}

#[test]
fn test_empty_corpus_is_valid() {
	let model = trainer().train_text("1234 !!").unwrap();

	assert_eq!(model.vocabulary().len(), 1024);
	assert_eq!(model.vocabulary().real_count(Position::Middle), 0);
	assert!(model.transitions().is_empty());
	assert!(model.end_transitions().is_empty());
}

#[test]
fn test_invalid_config_fails_before_training() {
	let config: TrainingConfig = serde_json::from_str(r#"{"temperature": 0.0}"#).unwrap();
	assert!(matches!(Trainer::new(config), Err(ModelError::InvalidConfig(_))));

	let config: TrainingConfig = serde_json::from_str(r#"{"ngram_size": 0}"#).unwrap();
	assert!(matches!(Trainer::new(config), Err(ModelError::InvalidConfig(_))));
}

#[test]
fn test_json_file_round_trip() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("model.json");

	let model = trainer().train_text("The weather turned, and the other brother ran further.").unwrap();
	model.save_json(&path).unwrap();

	let reloaded = Model::load_json(&path).unwrap();
	assert_eq!(reloaded, model);

	let text = fs::read_to_string(&path).unwrap();
	assert!(text.contains("\"end_ngrams\""));
	assert!(text.contains("-1"));
}

#[test]
fn test_corrupted_json_is_rejected() {
	let dir = TempDir::new().unwrap();
	let path = dir.path().join("model.json");
	fs::write(&path, "{ \"bos\": ").unwrap();

	assert!(matches!(Model::load_json(&path), Err(ModelError::Json(_))));
	assert!(matches!(Model::load_json(dir.path().join("missing.json")), Err(ModelError::Io { .. })));
}

#[test]
fn test_binary_cache() {
	let dir = TempDir::new().unwrap();
	let corpus = dir.path().join("words.txt");
	fs::write(&corpus, "other mother brother another weather").unwrap();

	let trainer = trainer();
	let trained = trainer.load_or_train(&corpus).unwrap();
	let cache = dir.path().join("words.bin");
	assert!(cache.exists());

	// The cache wins over the corpus while parameters match
	fs::write(&corpus, "zebra").unwrap();
	let cached = trainer.load_or_train(&corpus).unwrap();
	assert_eq!(cached, trained);

	// Other parameters invalidate it
	let mut config = TrainingConfig::default();
	config.set_ngram_size(3).unwrap();
	let retrained = Trainer::new(config).unwrap().load_or_train(&corpus).unwrap();
	assert_eq!(retrained.total_words(), 1);
	assert_eq!(Model::load_binary(&cache).unwrap(), retrained);
}
