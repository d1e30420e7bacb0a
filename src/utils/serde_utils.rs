// The article search provider sends empty strings
// for missing abstracts and snippets, which should
// count as absent when picking a description.
// Doing it with plain old functions rather than a
// custom deserializer, which I could never get right.
pub fn empty_string_to_none(value: Option<String>) -> Option<String> {
  match value {
    Some(s) => if s.trim().is_empty()
      { None } else { Some(s) },
    None => None
  }
}

// Picks the first value that isn't None or empty.
pub fn first_non_empty(values: Vec<Option<String>>) -> Option<String> {
  values.into_iter()
    .find_map(empty_string_to_none)
}
