use serde::{Deserialize, Serialize};
use derive_more::Display;
use crate::db::entities::*;
use crate::utils::time_utils;
use crate::config::SiteInfo;

// I'm using the From trait to convert entites to
// DTOs and test that. The reader deserializes the
// very same DTOs on the other side of the wire.

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
  pub id: i64,
  pub article_title: String,
  pub username: String,
  pub text: String,
  pub timestamp: String,
  #[serde(default)]
  pub removed: bool,
  #[serde(default)]
  pub replies: Vec<ReplyDto>
}

impl From<Comment> for CommentDto {
  fn from(comment: Comment) -> Self {
    Self {
      id: comment.id,
      article_title: comment.article_title,
      username: comment.username,
      text: comment.text,
      timestamp: time_utils::timestamp_to_iso_string(comment.date),
      removed: comment.removed,
      replies: comment.replies.into_iter().map(ReplyDto::from).collect()
    }
  }
}

// The nested reply marker has always been in snake
// case, and is absent for plain replies.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ReplyDto {
  pub id: i64,
  pub username: String,
  pub text: String,
  pub timestamp: String,
  #[serde(default)]
  pub removed: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub parent_reply_id: Option<i64>
}

impl From<Reply> for ReplyDto {
  fn from(reply: Reply) -> Self {
    Self {
      id: reply.id,
      username: reply.username,
      text: reply.text,
      timestamp: time_utils::timestamp_to_iso_string(reply.date),
      removed: reply.removed,
      parent_reply_id: reply.parent_reply_id
    }
  }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiKeyDto {
  pub key: String
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentCountDto {
  pub count: i64
}

// Anonymous visitors get a null username.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UserDto {
  pub username: Option<String>,
  #[serde(default)]
  pub is_moderator: bool
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UserDetailsDto {
  pub username: Option<String>,
  pub email: Option<String>
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
  pub error: String
}

/* --- Request bodies --- */

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCommentForm {
  pub article_title: String,
  pub text: String
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReplyForm {
  pub text: String
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedactForm {
  pub redacted_text: String
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginForm {
  pub email: String,
  pub password: String
}

/* --- End request bodies --- */

// I use this in responses that have nothing
// else to say.
#[derive(Debug, Deserialize, Serialize)]
pub struct JsonStatus {
  pub status: String,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id: Option<i64>
}

#[derive(Debug, Display)]
pub enum JsonStatusType {
  #[display(fmt = "success")]
  Success
}

impl JsonStatus {
  pub fn new_with_id(
    status: JsonStatusType,
    message: &str,
    id: i64
  ) -> Self {
    Self {
      status: status.to_string(),
      message: String::from(message),
      id: Some(id)
    }
  }
}

// Data given to the page shell templates.
#[derive(Serialize)]
pub struct PageData<'a> {
  pub site: &'a SiteInfo,
  pub date: String,
  pub username: Option<String>,
  pub is_moderator: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<&'a str>
}

impl<'a> PageData<'a> {
  pub fn new(site: &'a SiteInfo) -> Self {
    Self {
      site,
      date: time_utils::display_date(time_utils::current_timestamp()),
      username: None,
      is_moderator: false,
      error: None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_comment() -> Comment {
    Comment {
      id: 12,
      article_title: "Test Article".to_string(),
      username: "test_user".to_string(),
      text: "This is a test comment".to_string(),
      date: 1615150740,
      removed: false,
      replies: vec![
        Reply {
          id: 13,
          comment_id: 12,
          parent_reply_id: None,
          username: "another_user".to_string(),
          text: "This is a reply".to_string(),
          date: 1615150800,
          removed: false
        },
        Reply {
          id: 14,
          comment_id: 12,
          parent_reply_id: Some(13),
          username: "test_user".to_string(),
          text: "Nested".to_string(),
          date: 1615150900,
          removed: false
        }
      ]
    }
  }

  #[test]
  fn comment_to_dto() {
    let dto: CommentDto = sample_comment().into();
    assert_eq!(12, dto.id);
    assert_eq!(2, dto.replies.len());
    assert_eq!("2021-03-07T20:59:00Z", dto.timestamp);
  }

  #[test]
  fn comment_json_uses_api_field_names() {
    let dto: CommentDto = sample_comment().into();
    let json = serde_json::to_value(&dto).unwrap();
    assert_eq!("Test Article", json["articleTitle"]);
    // Plain replies have no parent marker at all:
    assert!(json["replies"][0].get("parent_reply_id").is_none());
    assert_eq!(13, json["replies"][1]["parent_reply_id"]);
  }

  #[test]
  fn redact_form_reads_camel_case() {
    let form: RedactForm =
      serde_json::from_str(r#"{"redactedText": "███ word"}"#).unwrap();
    assert_eq!("███ word", form.redacted_text);
  }

  #[test]
  fn anonymous_user_dto() {
    let json = serde_json::to_value(UserDto::default()).unwrap();
    assert!(json["username"].is_null());
    assert_eq!(false, json["is_moderator"]);
  }

}
