use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::env;

use crate::error::{ModelError, Result};

/// Reads a text file into memory.
///
/// Invalid UTF-8 sequences are replaced rather than rejected, corpora
/// scraped from the web are rarely clean.
pub fn read_file<P: AsRef<Path>>(filename: P) -> Result<String> {
	let path = filename.as_ref();
	let bytes = fs::read(path).map_err(|err| ModelError::io(path, err))?;
	Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Extracts the lowercase alphabetic words of a text.
///
/// The text is lowercased first, then every maximal run of `a..=z`
/// becomes a word. Everything else (digits, punctuation, accents,
/// whitespace) acts as a separator.
///
/// Example:
/// `"Hello, World! it's 42"` → `["hello", "world", "it", "s"]`
pub fn extract_words(text: &str) -> Vec<String> {
	let mut words = Vec::new();
	let mut current = String::new();

	for c in text.chars().flat_map(char::to_lowercase) {
		if c.is_ascii_lowercase() {
			current.push(c);
		} else if !current.is_empty() {
			words.push(std::mem::take(&mut current));
		}
	}
	if !current.is_empty() {
		words.push(current);
	}

	words
}

/// Keeps the distinct words seen at least `min_frequency` times and
/// having at least `min_length` characters.
///
/// Words are returned once each, in first-seen order, so the output is
/// stable for a given input. Both thresholds are clamped to 1.
pub fn filter_words(words: &[String], min_frequency: usize, min_length: usize) -> Vec<String> {
	let min_frequency = min_frequency.max(1);
	let min_length = min_length.max(1);

	let mut counts: HashMap<&str, usize> = HashMap::new();
	let mut order: Vec<&str> = Vec::new();
	for word in words {
		let count = counts.entry(word.as_str()).or_insert(0);
		if *count == 0 {
			order.push(word.as_str());
		}
		*count += 1;
	}

	order
		.into_iter()
		.filter(|word| word.chars().count() >= min_length && counts[word] >= min_frequency)
		.map(str::to_owned)
		.collect()
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/input.txt` + `"json"` → `data/input.json`
pub fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| ModelError::InvalidConfig(format!("Input path has no filename: {}", input_path.display())))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/english.txt"` → `"english"`
/// - `"english.txt"` → `"english"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> Result<String> {
	let path = input_path.as_ref();
	let stem = path
		.file_stem()
		.ok_or_else(|| ModelError::InvalidConfig(format!("Path has no filename: {}", path.display())))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Normalize a folder path.
///
/// - `"."` or `"./"` resolves to the current working directory
/// - Other paths are returned as-is (not canonicalized)
pub fn normalize_folder(input: &str) -> PathBuf {
	if input == "." || input == "./" {
		env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
	} else {
		PathBuf::from(input)
	}
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted so that callers iterate
/// in a reproducible order.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<String>> {
	let dir = dir.as_ref();
	let mut files = Vec::new();

	for entry in fs::read_dir(dir).map_err(|err| ModelError::io(dir, err))? {
		let entry = entry.map_err(|err| ModelError::io(dir, err))?;
		let path = entry.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_extract_words() {
		let words = extract_words("Hello, World! it's 42");
		assert_eq!(words, vec!["hello", "world", "it", "s"]);
	}

	#[test]
	fn test_extract_words_drops_non_ascii_letters() {
		let words = extract_words("Café au lait");
		assert_eq!(words, vec!["caf", "au", "lait"]);
		assert!(extract_words("1234 --- !!").is_empty());
	}

	#[test]
	fn test_filter_words() {
		let words: Vec<String> = ["the", "a", "cat", "the", "a", "the", "cat", "dog"]
			.iter()
			.map(|w| w.to_string())
			.collect();

		assert_eq!(filter_words(&words, 2, 2), vec!["the", "cat"]);
		assert_eq!(filter_words(&words, 0, 0), vec!["the", "a", "cat", "dog"]);
	}

	#[test]
	fn test_build_output_path() {
		let output = build_output_path("data/english.txt", "json").unwrap();
		assert_eq!(output, PathBuf::from("data/english.json"));
		assert_eq!(get_filename("data/english.txt").unwrap(), "english");
	}
}
