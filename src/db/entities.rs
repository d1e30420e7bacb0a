use serde::{Deserialize, Serialize};

// Text shown in place of soft-deleted comments
// and replies.
pub const REMOVED_NOTICE: &'static str = "[Comment removed by a moderator]";

// I'm starting with ultra simple datatypes,
// which is something SQLite fits naturally into.
// The DTO-like objects the API sends are in
// app::dtos.

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
  pub id: i64,
  // The public identifier, the seed record
  // uses "123".
  pub user_id: String,
  pub email: String,
  pub hash: String,
  pub username: String,
  pub is_moderator: bool
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Comment {
  pub id: i64,
  pub article_title: String,
  pub username: String,
  pub text: String,
  pub date: i64,
  pub removed: bool,
  // Always in insertion order.
  pub replies: Vec<Reply>
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Reply {
  pub id: i64,
  pub comment_id: i64,
  // Set for replies to replies.
  pub parent_reply_id: Option<i64>,
  pub username: String,
  pub text: String,
  pub date: i64,
  pub removed: bool
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleStat {
  pub article_title: String,
  pub comment_count: i64
}
