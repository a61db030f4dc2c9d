use crate::error::{ModelError, Result};
use super::token::{MAX_TOKEN_LEN, TokenId, begin_label, end_label, surface, whole_label};
use super::vocabulary::Vocabulary;

/// One segment of a word.
///
/// `id` is `None` when the segment comes from the single-character
/// fallback and that label is not part of the vocabulary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Piece {
	pub label: String,
	pub id: Option<TokenId>,
}

impl Piece {
	/// Characters of the word covered by this piece.
	pub fn surface(&self) -> &str {
		surface(&self.label)
	}
}

/// Greedy, position-aware longest-match tokenizer.
///
/// The same algorithm segments words while training and at inference
/// time, so both sides always agree on token boundaries.
///
/// At each position, lengths are tried from `MAX_TOKEN_LEN` down to 1 and
/// the first label found in the vocabulary wins:
/// - at the first character: the whole-word form `^sub$` (only when `sub`
///   reaches the last character), then the beginning form `^sub`
/// - elsewhere: the end form `sub$` (only when `sub` reaches the last
///   character), then the bare form `sub`
///
/// When no length matches, exactly one character is consumed and
/// emitted with the marker of its position (`^c` first, `c$` last, `c`
/// otherwise). Segmentation is therefore total and lossless.
#[derive(Clone, Copy, Debug)]
pub struct Tokenizer<'a> {
	vocabulary: &'a Vocabulary,
}

impl<'a> Tokenizer<'a> {
	pub fn new(vocabulary: &'a Vocabulary) -> Self {
		Self { vocabulary }
	}

	/// Segments a word into pieces.
	///
	/// Concatenating the surface of every piece gives back `word`.
	/// An empty word yields no pieces.
	pub fn segment(&self, word: &str) -> Vec<Piece> {
		let chars: Vec<char> = word.chars().collect();
		let len = chars.len();
		let mut pieces = Vec::new();
		let mut position = 0;

		while position < len {
			let (label, consumed) = self
				.longest_match(&chars, position)
				.unwrap_or_else(|| (Self::fallback(&chars, position), 1));

			let id = self.vocabulary.id(&label);
			pieces.push(Piece { label, id });
			position += consumed;
		}

		pieces
	}

	/// Segments a word into vocabulary ids.
	///
	/// # Errors
	/// Returns `UnknownToken` when a fallback piece has no id. Callers
	/// building statistics skip such words entirely.
	pub fn encode(&self, word: &str) -> Result<Vec<TokenId>> {
		self.segment(word)
			.into_iter()
			.map(|piece| piece.id.ok_or(ModelError::UnknownToken(piece.label)))
			.collect()
	}

	/// Concatenates the surface forms of a sequence of ids.
	///
	/// # Errors
	/// Returns `UnknownToken` for an id outside the vocabulary.
	pub fn decode(&self, ids: &[TokenId]) -> Result<String> {
		ids.iter()
			.map(|&id| {
				self.vocabulary
					.token(id)
					.map(surface)
					.ok_or_else(|| ModelError::UnknownToken(format!("[UNK:{id}]")))
			})
			.collect()
	}

	/// Longest vocabulary label starting at `position`, with the number
	/// of characters it covers.
	fn longest_match(&self, chars: &[char], position: usize) -> Option<(String, usize)> {
		let len = chars.len();
		let is_beginning = position == 0;

		for length in (1..=MAX_TOKEN_LEN.min(len - position)).rev() {
			let substring: String = chars[position..position + length].iter().collect();
			let reaches_end = position + length == len;

			let candidates = if is_beginning {
				[reaches_end.then(|| whole_label(&substring)), Some(begin_label(&substring))]
			} else {
				[reaches_end.then(|| end_label(&substring)), Some(substring)]
			};

			if let Some(label) = candidates.into_iter().flatten().find(|label| self.vocabulary.contains(label)) {
				return Some((label, length));
			}
		}

		None
	}

	/// Single-character label used when nothing matches.
	fn fallback(chars: &[char], position: usize) -> String {
		let c = chars[position].to_string();
		if position == 0 {
			begin_label(&c)
		} else if position == chars.len() - 1 {
			end_label(&c)
		} else {
			c
		}
	}
}
