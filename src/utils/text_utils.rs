// I was using String::truncate at first but it
// panics when cutting a multibyte unicode char
// in half. Cutting on char boundaries instead.
pub fn truncate_utf8(s: &mut String, max_chars: usize) {
  if let Some((idx, _)) = s.char_indices().nth(max_chars) {
    s.truncate(idx);
  }
}

// Trims in place-ish and truncates, returns None
// when nothing is left.
pub fn clean_body(body: &str, max_chars: usize) -> Option<String> {
  let mut cleaned = body.trim().to_string();
  truncate_utf8(&mut cleaned, max_chars);
  if cleaned.is_empty() {
    None
  } else {
    Some(cleaned)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn truncate_does_not_split_chars() {
    let mut sut = String::from("héllo wörld");
    truncate_utf8(&mut sut, 2);
    assert_eq!("hé", sut);
  }

  #[test]
  fn truncate_shorter_string_is_noop() {
    let mut sut = String::from("short");
    truncate_utf8(&mut sut, 30);
    assert_eq!("short", sut);
  }

  #[test]
  fn clean_body_rejects_blank() {
    assert_eq!(None, clean_body("   \n ", 10));
    assert_eq!(Some("hi there".to_string()), clean_body("  hi there ", 10));
  }
}
