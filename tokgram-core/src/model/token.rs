//! Token labels, position classes and the fixed id layout.
//!
//! The constants in this module are part of the persisted format: a model
//! is meaningless if they are renumbered.

/// Integer id of a vocabulary entry, always `< VOCAB_SIZE`.
pub type TokenId = u16;

/// Marker prefixed to tokens that begin a word.
pub const BOS: char = '^';

/// Marker appended to tokens that end a word.
pub const EOS: char = '$';

/// Longest substring (in characters) a single token can cover.
pub const MAX_TOKEN_LEN: usize = 6;

/// Capacity of the beginning band, ids `[0, 256)`.
pub const NUM_BEGINNING_TOKENS: usize = 256;

/// Capacity of the end band, ids `[256, 512)`.
pub const NUM_END_TOKENS: usize = 256;

/// Capacity of the middle band, ids `[512, 1024)`.
pub const NUM_MIDDLE_TOKENS: usize = 512;

/// Total vocabulary size.
pub const VOCAB_SIZE: usize = NUM_BEGINNING_TOKENS + NUM_END_TOKENS + NUM_MIDDLE_TOKENS;

const _: () = assert!(VOCAB_SIZE == 1024, "band capacities must sum to 1024");
const _: () = assert!(VOCAB_SIZE <= TokenId::MAX as usize + 1, "ids must fit in TokenId");

/// Position class of a token inside a word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Position {
	Begin,
	End,
	Middle,
}

impl Position {
	/// All classes in band order.
	pub const ALL: [Position; 3] = [Position::Begin, Position::End, Position::Middle];

	/// First id of the band holding this class.
	pub const fn base(self) -> usize {
		match self {
			Position::Begin => 0,
			Position::End => NUM_BEGINNING_TOKENS,
			Position::Middle => NUM_BEGINNING_TOKENS + NUM_END_TOKENS,
		}
	}

	/// Number of ids in the band holding this class.
	pub const fn capacity(self) -> usize {
		match self {
			Position::Begin => NUM_BEGINNING_TOKENS,
			Position::End => NUM_END_TOKENS,
			Position::Middle => NUM_MIDDLE_TOKENS,
		}
	}

	/// Band of an id, `None` when the id is out of range.
	pub fn of_id(id: TokenId) -> Option<Position> {
		Position::ALL.into_iter().find(|position| {
			let id = id as usize;
			id >= position.base() && id < position.base() + position.capacity()
		})
	}

	/// Tag used in placeholder labels.
	fn placeholder_tag(self) -> &'static str {
		match self {
			Position::Begin => "BEG",
			Position::End => "END",
			Position::Middle => "MID",
		}
	}
}

/// `^sub`
pub fn begin_label(substring: &str) -> String {
	format!("{BOS}{substring}")
}

/// `sub$`
pub fn end_label(substring: &str) -> String {
	format!("{substring}{EOS}")
}

/// `^sub$`
pub fn whole_label(substring: &str) -> String {
	format!("{BOS}{substring}{EOS}")
}

/// Synthetic label filling slot `index` of a band.
///
/// The brackets can never appear in a word, so a placeholder never
/// matches a real substring.
pub fn placeholder_label(position: Position, index: usize) -> String {
	format!("[UNUSED_{}_{}]", position.placeholder_tag(), index)
}

/// Returns `true` for labels produced by `placeholder_label`.
pub fn is_placeholder(label: &str) -> bool {
	label.starts_with("[UNUSED_") && label.ends_with(']')
}

/// Text a token contributes to a word, boundary markers stripped.
pub fn surface(label: &str) -> &str {
	let without_prefix = label.strip_prefix(BOS).unwrap_or(label);
	without_prefix.strip_suffix(EOS).unwrap_or(without_prefix)
}

/// Returns `true` when the label closes a word (end or whole-word token).
pub fn ends_word(label: &str) -> bool {
	!is_placeholder(label) && label.ends_with(EOS)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_band_layout() {
		assert_eq!(VOCAB_SIZE, 1024);
		assert_eq!(Position::of_id(0), Some(Position::Begin));
		assert_eq!(Position::of_id(255), Some(Position::Begin));
		assert_eq!(Position::of_id(256), Some(Position::End));
		assert_eq!(Position::of_id(511), Some(Position::End));
		assert_eq!(Position::of_id(512), Some(Position::Middle));
		assert_eq!(Position::of_id(1023), Some(Position::Middle));
		assert_eq!(Position::of_id(1024), None);
	}

	#[test]
	fn test_labels() {
		assert_eq!(begin_label("ru"), "^ru");
		assert_eq!(end_label("ing"), "ing$");
		assert_eq!(whole_label("a"), "^a$");
		assert_eq!(surface("^a$"), "a");
		assert_eq!(surface("^run"), "run");
		assert_eq!(surface("ing$"), "ing");
		assert_eq!(surface("nn"), "nn");
	}

	#[test]
	fn test_placeholders() {
		let label = placeholder_label(Position::End, 7);
		assert_eq!(label, "[UNUSED_END_7]");
		assert!(is_placeholder(&label));
		assert!(!is_placeholder("^run"));
		assert!(!ends_word(&label));
		assert!(ends_word("^a$"));
	}
}
