use serde::Serialize;
use crate::app::dtos::CommentDto;
use super::articles::ArticleCard;

// What the profile panel shows.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Profile {
  pub username: String,
  pub email: String,
  pub is_moderator: bool
}

// Comment and reply ids come from different tables,
// a reply is only identified with its comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextTarget {
  Comment(i64),
  Reply { comment_id: i64, reply_id: i64 }
}

// Sets the text of one comment or reply in a
// thread, returns false when it isn't there. The
// removed flag is never cleared.
pub fn set_thread_text(
  comments: &mut [CommentDto],
  target: TextTarget,
  text: &str,
  removed: bool
) -> bool {
  let (comment_id, reply_id) = match target {
    TextTarget::Comment(id) => (id, None),
    TextTarget::Reply { comment_id, reply_id } => (comment_id, Some(reply_id))
  };
  let comment = match comments.iter_mut().find(|c| c.id == comment_id) {
    Some(c) => c,
    None => return false
  };
  match reply_id {
    None => {
      comment.text = text.to_string();
      comment.removed = comment.removed || removed;
      true
    },
    Some(id) => match comment.replies.iter_mut().find(|r| r.id == id) {
      Some(r) => {
        r.text = text.to_string();
        r.removed = r.removed || removed;
        true
      },
      None => false
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextStyle {
  Plain,
  Removed,
  Redacted
}

/**
 * All the visible side effects of the reader go
 * through here. Methods take &self, implementations
 * that keep state need their own locking.
 */
pub trait Ui: Send + Sync {
  fn alert(&self, message: &str);
  // Returns true when the user agreed.
  fn confirm(&self, message: &str) -> bool;
  fn navigate(&self, path: &str);
  // Page 0 replaces what was shown, other pages
  // are appended.
  fn render_articles(&self, cards: &[ArticleCard], clear: bool);
  fn render_comments(&self, article_title: &str, comments: &[CommentDto], moderator: bool);
  fn set_comment_count(&self, count: i64);
  fn update_comment_text(&self, target: TextTarget, text: &str, style: TextStyle);
  fn show_profile(&self, profile: &Profile);
}
