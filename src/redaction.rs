use regex::Regex;
use lazy_static::lazy_static;

// Character used to black out redacted words.
pub const BLOCK_CHAR: char = '█';

lazy_static! {
  // Splitting on runs of whitespace. An empty string
  // still gives one (empty) word, and leading whitespace
  // gives an empty first word, which is what the
  // moderator sees in the editor anyway.
  static ref WHITESPACE_REGEX: Regex = Regex::new(r"\s+").unwrap();
}

fn words(text: &str) -> Vec<&str> {
  WHITESPACE_REGEX.split(text).collect()
}

fn blacked_out(word: &str) -> String {
  std::iter::repeat(BLOCK_CHAR)
    .take(word.chars().count())
    .collect()
}

/**
 * Produces the redacted version of `original` given
 * the text a moderator edited it into.
 *
 * Every edited word is searched for in the original,
 * left to right, starting after the last word that
 * matched. Matched original words are kept, all the
 * others are replaced by block characters (one per
 * character). Edited words that can't be found are
 * ignored, so moderators can only remove words, never
 * add any.
 */
pub fn redact(original: &str, edited: &str) -> String {
  if original == edited {
    return original.to_string();
  }
  let original_words = words(original);
  let mut keep = vec![false; original_words.len()];
  // Index right after the last match.
  let mut start = 0;
  for edited_word in words(edited) {
    let found = original_words.iter()
      .enumerate()
      .skip(start)
      .find(|(i, w)| **w == edited_word && !keep[*i])
      .map(|(i, _)| i);
    if let Some(i) = found {
      keep[i] = true;
      start = i + 1;
    }
  }
  original_words.iter()
    .zip(keep.iter())
    .map(|(word, kept)| if *kept { word.to_string() } else { blacked_out(word) })
    .collect::<Vec<String>>()
    .join(" ")
}

/**
 * Checks that `candidate` could have been produced by
 * redacting `original`: same amount of words, each one
 * either untouched or fully blacked out with the same
 * character length.
 */
pub fn is_redaction_of(original: &str, candidate: &str) -> bool {
  if original == candidate {
    return true;
  }
  let original_words = words(original);
  let candidate_words = words(candidate);
  if original_words.len() != candidate_words.len() {
    return false;
  }
  original_words.iter()
    .zip(candidate_words.iter())
    .all(|(o, c)| o == c || *c == blacked_out(o))
}
