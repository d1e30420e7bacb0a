use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::utils::serde_utils::first_non_empty;

// Average reading speed, in words per minute.
const WORDS_PER_MINUTE: f64 = 225.0;
// Used when the search provider has no word count.
const DEFAULT_WORD_COUNT: u32 = 500;
// Array style multimedia urls are relative to this.
const MULTIMEDIA_BASE_URL: &'static str = "https://www.nytimes.com/";

pub fn estimate_read_time(word_count: u32) -> String {
  let minutes = (f64::from(word_count) / WORDS_PER_MINUTE).round() as u32;
  format!("{} MIN READ", minutes)
}

/* --- Article search response --- */

#[derive(Debug, Deserialize, Default)]
pub struct SearchResponse {
  #[serde(default)]
  pub response: SearchDocs
}

#[derive(Debug, Deserialize, Default)]
pub struct SearchDocs {
  // Absent or null when the page is past the
  // last result.
  #[serde(default)]
  pub docs: Option<Vec<Article>>
}

impl SearchResponse {
  pub fn into_docs(self) -> Vec<Article> {
    self.response.docs.unwrap_or_default()
  }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Headline {
  #[serde(default)]
  pub main: String
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Article {
  #[serde(default)]
  pub headline: Headline,
  #[serde(rename = "abstract")]
  pub abstract_text: Option<String>,
  pub snippet: Option<String>,
  pub word_count: Option<u32>,
  // Either an array of {url} relative to the site
  // or an object with an absolute default.url,
  // depending on the API version.
  #[serde(default)]
  pub multimedia: Value
}

impl Article {

  pub fn title(&self) -> &str {
    &self.headline.main
  }

  pub fn image_url(&self) -> Option<String> {
    match &self.multimedia {
      Value::Array(items) => items.first()
        .and_then(|m| m.get("url"))
        .and_then(Value::as_str)
        .map(|url| format!("{}{}", MULTIMEDIA_BASE_URL, url)),
      Value::Object(_) => self.multimedia
        .get("default")
        .and_then(|d| d.get("url"))
        .and_then(Value::as_str)
        .map(String::from),
      _ => None
    }
  }

  pub fn description(&self) -> String {
    first_non_empty(vec![self.abstract_text.clone(), self.snippet.clone()])
      .unwrap_or_default()
  }

}

// What the article grid shows for one article.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ArticleCard {
  pub title: String,
  pub description: String,
  pub read_time: String,
  pub image_url: Option<String>,
  pub comment_count: i64
}

impl ArticleCard {
  pub fn new(article: &Article, comment_count: i64) -> Self {
    Self {
      title: article.title().to_string(),
      description: article.description(),
      read_time: estimate_read_time(
        article.word_count.unwrap_or(DEFAULT_WORD_COUNT)
      ),
      image_url: article.image_url(),
      comment_count
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn article(value: Value) -> Article {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn read_time_estimates() {
    assert_eq!("1 MIN READ", estimate_read_time(225));
    assert_eq!("0 MIN READ", estimate_read_time(0));
    assert_eq!("2 MIN READ", estimate_read_time(450));
    // 337.5 rounds up.
    assert_eq!("2 MIN READ", estimate_read_time(338));
  }

  #[test]
  fn decode_search_response() {
    let body = json!({
      "status": "OK",
      "response": {
        "docs": [
          {
            "headline": { "main": "Davis council votes" },
            "abstract": "The council voted.",
            "snippet": "Snippet",
            "word_count": 900,
            "multimedia": [{ "url": "images/2024/davis.jpg" }]
          }
        ]
      }
    });
    let resp: SearchResponse = serde_json::from_value(body).unwrap();
    let docs = resp.into_docs();
    assert_eq!(1, docs.len());
    let card = ArticleCard::new(&docs[0], 4);
    assert_eq!("Davis council votes", card.title);
    assert_eq!("The council voted.", card.description);
    assert_eq!("4 MIN READ", card.read_time);
    assert_eq!(
      Some("https://www.nytimes.com/images/2024/davis.jpg".to_string()),
      card.image_url
    );
    assert_eq!(4, card.comment_count);
  }

  #[test]
  fn null_docs_is_empty_page() {
    let resp: SearchResponse = serde_json::from_value(
      json!({ "response": { "docs": null } })
    ).unwrap();
    assert!(resp.into_docs().is_empty());
  }

  #[test]
  fn object_multimedia_uses_default_url() {
    let a = article(json!({
      "headline": { "main": "T" },
      "multimedia": { "default": { "url": "https://static01.nyt.com/a.jpg" } }
    }));
    assert_eq!(Some("https://static01.nyt.com/a.jpg".to_string()), a.image_url());
  }

  #[test]
  fn missing_fields_fall_back() {
    let a = article(json!({
      "headline": { "main": "T" },
      "abstract": "  ",
      "snippet": "From the snippet"
    }));
    let card = ArticleCard::new(&a, 0);
    assert_eq!("From the snippet", card.description);
    assert_eq!("2 MIN READ", card.read_time);
    assert_eq!(None, card.image_url);

    let bare = article(json!({ "headline": { "main": "T" }, "multimedia": [] }));
    assert_eq!("", bare.description());
    assert_eq!(None, bare.image_url());
  }
}
