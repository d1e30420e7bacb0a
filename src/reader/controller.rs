use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use log::{debug, error, info, warn};
use crate::app::dtos::CommentDto;
use crate::db::entities::REMOVED_NOTICE;
use crate::redaction;
use crate::utils::serde_utils::first_non_empty;
use super::api::{ApiError, ReaderApi};
use super::articles::ArticleCard;
use super::pager::{PageOutcome, Pager, ScrollMetrics};
use super::ui::{set_thread_text, Profile, TextStyle, TextTarget, Ui};

pub const LOGIN_PATH: &'static str = "/login";

// Everything the reader remembers between calls.
// Navigating away resets most of it.
#[derive(Debug)]
pub struct UiState {
  pub pager: Pager,
  pub is_moderator: bool,
  pub profile: Option<Profile>,
  pub article_title: Option<String>,
  pub comments: HashMap<String, Vec<CommentDto>>
}

impl UiState {

  pub fn new(max_pages: u32) -> Self {
    Self {
      pager: Pager::new(max_pages),
      is_moderator: false,
      profile: None,
      article_title: None,
      comments: HashMap::new()
    }
  }

  fn cached_text(&self, target: TextTarget) -> Option<String> {
    let title = self.article_title.as_ref()?;
    let comments = self.comments.get(title)?;
    match target {
      TextTarget::Comment(id) => comments.iter()
        .find(|c| c.id == id)
        .map(|c| c.text.clone()),
      TextTarget::Reply { comment_id, reply_id } => comments.iter()
        .find(|c| c.id == comment_id)
        .and_then(|c| c.replies.iter().find(|r| r.id == reply_id))
        .map(|r| r.text.clone())
    }
  }

  fn set_cached_text(&mut self, target: TextTarget, text: &str, removed: bool) {
    let title = match &self.article_title {
      Some(t) => t.clone(),
      None => return
    };
    if let Some(comments) = self.comments.get_mut(&title) {
      set_thread_text(comments, target, text, removed);
    }
  }

}

// Alerts for one kind of write.
struct FailureMessages {
  login: &'static str,
  forbidden: Option<&'static str>,
  failed: &'static str,
  transport: &'static str
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum WriteAction {
  Comment,
  Reply,
  NestedReply,
  DeleteComment,
  DeleteReply,
  RedactComment,
  RedactReply
}

impl WriteAction {
  fn messages(&self) -> FailureMessages {
    match self {
      WriteAction::Comment => FailureMessages {
        login: "Please log in to comment",
        forbidden: None,
        failed: "Failed to add comment. Please try again.",
        transport: "Error adding comment. Please check your connection."
      },
      WriteAction::Reply => FailureMessages {
        login: "Please log in to add a reply",
        forbidden: None,
        failed: "Failed to add reply. Please try again.",
        transport: "Error adding reply. Please check your connection."
      },
      WriteAction::NestedReply => FailureMessages {
        login: "Please log in to reply",
        forbidden: None,
        failed: "Failed to add reply. Please try again.",
        transport: "Error adding reply. Please check your connection."
      },
      WriteAction::DeleteComment => FailureMessages {
        login: "Please log in to remove comments",
        forbidden: Some("Only moderators can remove comments"),
        failed: "Failed to remove comment. Please try again.",
        transport: "Error removing comment. Please check your connection."
      },
      WriteAction::DeleteReply => FailureMessages {
        login: "Please log in to remove replies",
        forbidden: Some("Only moderators can remove replies"),
        failed: "Failed to remove reply. Please try again.",
        transport: "Error removing reply. Please check your connection."
      },
      WriteAction::RedactComment => FailureMessages {
        login: "Please log in to redact comments",
        forbidden: Some("Only moderators can redact comments"),
        failed: "Failed to redact comment. Please try again.",
        transport: "Error redacting comment. Please check your connection."
      },
      WriteAction::RedactReply => FailureMessages {
        login: "Please log in to redact replies",
        forbidden: Some("Only moderators can redact replies"),
        failed: "Failed to redact reply. Please try again.",
        transport: "Error redacting reply. Please check your connection."
      }
    }
  }
}

/**
 * Drives the reader: pagination of the article grid,
 * the comment sidebar and moderation. The state lock
 * is never held across an await, every access is a
 * short statement of its own.
 */
pub struct ReaderController<A: ReaderApi, U: Ui> {
  api: A,
  ui: U,
  state: Mutex<UiState>
}

impl<A: ReaderApi, U: Ui> ReaderController<A, U> {

  pub fn new(api: A, ui: U, max_pages: u32) -> Self {
    Self {
      api,
      ui,
      state: Mutex::new(UiState::new(max_pages))
    }
  }

  pub fn api(&self) -> &A {
    &self.api
  }

  pub fn ui(&self) -> &U {
    &self.ui
  }

  // A panic while holding the lock can't leave the
  // state half-updated in a way that matters here.
  pub fn state(&self) -> MutexGuard<'_, UiState> {
    self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /* --- Session --- */

  pub async fn refresh_session(&self) -> Option<Profile> {
    let user = match self.api.current_user().await {
      Ok(u) => u,
      Err(e) => {
        error!("Error fetching user info: {}", e);
        return None;
      }
    };
    let username = match first_non_empty(vec![user.username]) {
      Some(u) => u,
      None => {
        let mut state = self.state();
        state.is_moderator = false;
        state.profile = None;
        return None;
      }
    };
    self.state().is_moderator = user.is_moderator;

    let profile = match self.api.user_details().await {
      Ok(details) => Profile {
        username: first_non_empty(vec![details.username])
          .unwrap_or_else(|| String::from("User")),
        email: first_non_empty(vec![details.email])
          .unwrap_or_else(|| String::from("No email provided")),
        is_moderator: user.is_moderator
      },
      Err(e) => {
        error!("Error fetching user details: {}", e);
        Profile {
          username,
          email: String::from("Email not available"),
          is_moderator: user.is_moderator
        }
      }
    };
    self.state().profile = Some(profile.clone());
    self.ui.show_profile(&profile);
    Some(profile)
  }

  // The profile button: anonymous visitors are
  // sent to the login page.
  pub async fn open_profile(&self) {
    match self.api.current_user().await {
      Ok(user) if user.username.as_deref().map_or(false, |u| !u.trim().is_empty()) => {
        self.refresh_session().await;
      },
      Ok(_) => self.ui.navigate(LOGIN_PATH),
      Err(e) => {
        error!("Error checking login status: {}", e);
        self.ui.navigate(LOGIN_PATH);
      }
    }
  }

  /* --- Article grid --- */

  pub async fn fetch_page(&self, page: u32) {
    let started = self.state().pager.begin(page);
    if !started {
      debug!("Not fetching page {}", page);
      return;
    }
    let outcome = self.load_page(page).await;
    self.state().pager.finish(page, outcome);
  }

  async fn load_page(&self, page: u32) -> PageOutcome {
    let key = match self.api.api_key().await {
      Ok(k) => k,
      Err(e) => {
        error!("No API key available - {}", e);
        return PageOutcome::MissingKey;
      }
    };
    let articles = match self.api.search(&key, page).await {
      Ok(a) => a,
      Err(e) => {
        error!("Failed to fetch articles for page {} - {}", page, e);
        return PageOutcome::Failed;
      }
    };
    if articles.is_empty() {
      info!("No more articles after page {}", page);
      return PageOutcome::Empty;
    }
    let mut cards = Vec::with_capacity(articles.len());
    for article in articles.iter() {
      let count = match self.api.comment_count(article.title()).await {
        Ok(c) => c,
        Err(e) => {
          warn!("Could not get comment count for {} - {}", article.title(), e);
          0
        }
      };
      cards.push(ArticleCard::new(article, count));
    }
    self.ui.render_articles(&cards, page == 0);
    PageOutcome::Loaded
  }

  pub async fn on_scroll(&self, metrics: ScrollMetrics) {
    let next = self.state().pager.next_page_on_scroll(&metrics);
    if let Some(page) = next {
      self.fetch_page(page).await;
    }
  }

  /* --- Comment sidebar --- */

  pub async fn open_comments(&self, article_title: &str, known_count: i64) {
    self.state().article_title = Some(article_title.to_string());
    let count = match self.api.comment_count(article_title).await {
      Ok(c) => c,
      Err(e) => {
        warn!("Error getting comment count - {}", e);
        known_count
      }
    };
    self.ui.set_comment_count(count);
    self.load_comments(article_title).await;
  }

  pub async fn load_comments(&self, article_title: &str) {
    let comments = match self.api.comments(article_title).await {
      Ok(c) => c,
      Err(e) => {
        error!("Failed to fetch comments - {}", e);
        Vec::new()
      }
    };
    let moderator = {
      let mut state = self.state();
      state.comments.insert(article_title.to_string(), comments.clone());
      state.is_moderator
    };
    self.ui.render_comments(article_title, &comments, moderator);
  }

  pub fn cached_comments(&self, article_title: &str) -> Vec<CommentDto> {
    self.state().comments
      .get(article_title)
      .cloned()
      .unwrap_or_default()
  }

  fn current_title(&self) -> Option<String> {
    let title = self.state().article_title.clone();
    if title.is_none() {
      warn!("No article is opened in the comment sidebar");
    }
    title
  }

  async fn refresh_count(&self, article_title: &str) {
    match self.api.comment_count(article_title).await {
      Ok(count) => self.ui.set_comment_count(count),
      Err(e) => error!("Error updating comment count - {}", e)
    }
  }

  async fn after_write(&self, article_title: &str) {
    self.load_comments(article_title).await;
    self.refresh_count(article_title).await;
  }

  // Shows the alert for a failed write. Returns
  // true for failures that aren't about who the
  // user is.
  fn write_failed(&self, action: WriteAction, e: ApiError) -> bool {
    let messages = action.messages();
    match e {
      ApiError::Unauthorized => {
        self.ui.alert(messages.login);
        self.ui.navigate(LOGIN_PATH);
        false
      },
      ApiError::Forbidden => {
        self.ui.alert(messages.forbidden.unwrap_or(messages.failed));
        false
      },
      ApiError::Transport(msg) => {
        error!("{:?} failed: {}", action, msg);
        self.ui.alert(messages.transport);
        true
      },
      other => {
        error!("{:?} failed: {}", action, other);
        self.ui.alert(messages.failed);
        true
      }
    }
  }

  pub async fn submit_comment(&self, text: &str) {
    if text.trim().is_empty() {
      return;
    }
    let title = match self.current_title() {
      Some(t) => t,
      None => return
    };
    match self.api.post_comment(&title, text).await {
      Ok(comment) => {
        info!("Comment {} added", comment.id);
        self.after_write(&title).await;
      },
      Err(e) => {
        self.write_failed(WriteAction::Comment, e);
      }
    }
  }

  pub async fn submit_reply(&self, comment_id: i64, text: &str) {
    if text.trim().is_empty() {
      return;
    }
    let title = match self.current_title() {
      Some(t) => t,
      None => return
    };
    match self.api.post_reply(comment_id, text).await {
      Ok(reply) => {
        info!("Reply {} added to comment {}", reply.id, comment_id);
        self.after_write(&title).await;
      },
      Err(e) => {
        self.write_failed(WriteAction::Reply, e);
      }
    }
  }

  pub async fn submit_nested_reply(&self, comment_id: i64, reply_id: i64, text: &str) {
    if text.trim().is_empty() {
      return;
    }
    let title = match self.current_title() {
      Some(t) => t,
      None => return
    };
    match self.api.post_nested_reply(comment_id, reply_id, text).await {
      Ok(reply) => {
        info!("Reply {} added to reply {}", reply.id, reply_id);
        self.after_write(&title).await;
      },
      Err(e) => {
        self.write_failed(WriteAction::NestedReply, e);
      }
    }
  }

  fn mark_removed(&self, target: TextTarget) {
    self.state().set_cached_text(target, REMOVED_NOTICE, true);
    self.ui.update_comment_text(target, REMOVED_NOTICE, TextStyle::Removed);
  }

  pub async fn delete_comment(&self, comment_id: i64) {
    if !self.ui.confirm("Are you sure you want to remove this comment?") {
      return;
    }
    let title = match self.current_title() {
      Some(t) => t,
      None => return
    };
    match self.api.delete_comment(comment_id).await {
      Ok(()) => {
        self.mark_removed(TextTarget::Comment(comment_id));
        self.after_write(&title).await;
      },
      Err(e) => {
        self.write_failed(WriteAction::DeleteComment, e);
      }
    }
  }

  pub async fn delete_reply(&self, comment_id: i64, reply_id: i64) {
    if !self.ui.confirm("Are you sure you want to remove this reply?") {
      return;
    }
    let title = match self.current_title() {
      Some(t) => t,
      None => return
    };
    match self.api.delete_reply(comment_id, reply_id).await {
      Ok(()) => {
        self.mark_removed(TextTarget::Reply { comment_id, reply_id });
        self.after_write(&title).await;
      },
      Err(e) => {
        self.write_failed(WriteAction::DeleteReply, e);
      }
    }
  }

  // Gives the text that was sent, if any. The edit
  // only decides which words survive, see redaction.
  async fn redact(&self, target: TextTarget, edited: &str) -> Option<String> {
    let original = match self.state().cached_text(target) {
      Some(t) => t,
      None => {
        warn!("Nothing to redact for {:?}", target);
        return None;
      }
    };
    let redacted = redaction::redact(&original, edited);
    let (result, action) = match target {
      TextTarget::Comment(id) => (
        self.api.redact_comment(id, &redacted).await,
        WriteAction::RedactComment
      ),
      TextTarget::Reply { comment_id, reply_id } => (
        self.api.redact_reply(comment_id, reply_id, &redacted).await,
        WriteAction::RedactReply
      )
    };
    match result {
      Ok(()) => {
        self.state().set_cached_text(target, &redacted, false);
        self.ui.update_comment_text(target, &redacted, TextStyle::Redacted);
        Some(redacted)
      },
      Err(e) => {
        if self.write_failed(action, e) {
          self.ui.update_comment_text(target, &original, TextStyle::Plain);
        }
        None
      }
    }
  }

  pub async fn redact_comment(&self, comment_id: i64, edited: &str) -> Option<String> {
    self.redact(TextTarget::Comment(comment_id), edited).await
  }

  pub async fn redact_reply(
    &self,
    comment_id: i64,
    reply_id: i64,
    edited: &str
  ) -> Option<String> {
    self.redact(TextTarget::Reply { comment_id, reply_id }, edited).await
  }

  // Navigation: what belongs to the previous page
  // goes away, the session stays.
  pub fn reset(&self) {
    let mut state = self.state();
    state.pager.reset();
    state.comments.clear();
    state.article_title = None;
  }

}
