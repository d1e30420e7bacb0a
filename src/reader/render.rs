use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use color_eyre::Result;
use eyre::WrapErr;
use handlebars::Handlebars;
use log::{error, info};
use serde::Serialize;
use serde_json::Value;
use crate::app::dtos::CommentDto;
use crate::app::load_templates;
use super::articles::ArticleCard;
use super::ui::{set_thread_text, Profile, TextStyle, TextTarget, Ui};

const ARTICLE_GRID_TEMPLATE: &'static str = "reader/article_grid";
const COMMENT_THREAD_TEMPLATE: &'static str = "reader/comment_thread";

#[derive(Serialize)]
struct GridData<'a> {
  cards: &'a [ArticleCard]
}

#[derive(Serialize)]
struct ThreadData<'a> {
  article_title: &'a str,
  count_label: String,
  comments: Value,
  moderator: bool
}

// Comments as JSON with a "redacted" flag on the
// ones a moderator just blacked out.
fn thread_view(comments: &[CommentDto], redacted: &HashSet<TextTarget>) -> Result<Value> {
  let mut view = serde_json::to_value(comments)
    .context("Serializing comment thread")?;
  if let Value::Array(items) = &mut view {
    for (comment, item) in comments.iter().zip(items.iter_mut()) {
      if redacted.contains(&TextTarget::Comment(comment.id)) {
        item["redacted"] = Value::Bool(true);
      }
      if let Some(Value::Array(replies)) = item.get_mut("replies") {
        for (reply, r) in comment.replies.iter().zip(replies.iter_mut()) {
          let target = TextTarget::Reply { comment_id: comment.id, reply_id: reply.id };
          if redacted.contains(&target) {
            r["redacted"] = Value::Bool(true);
          }
        }
      }
    }
  }
  Ok(view)
}

// Turns reader data into HTML fragments, using the
// same template directory as the server.
pub struct HtmlRenderer {
  hb: Handlebars<'static>
}

impl HtmlRenderer {

  pub fn new(template_dir: &str) -> Result<Self> {
    Ok(Self { hb: load_templates(template_dir)? })
  }

  pub fn article_grid(&self, cards: &[ArticleCard]) -> Result<String> {
    self.hb.render(ARTICLE_GRID_TEMPLATE, &GridData { cards })
      .context("Rendering article grid")
  }

  pub fn comment_thread(
    &self,
    article_title: &str,
    count: Option<i64>,
    comments: &[CommentDto],
    redacted: &HashSet<TextTarget>,
    moderator: bool
  ) -> Result<String> {
    let data = ThreadData {
      article_title,
      count_label: count.map(|c| format!("({})", c)).unwrap_or_default(),
      comments: thread_view(comments, redacted)?,
      moderator
    };
    self.hb.render(COMMENT_THREAD_TEMPLATE, &data)
      .context("Rendering comment thread")
  }

}

// What an HtmlUi ended up showing.
#[derive(Debug, Default, Clone)]
pub struct HtmlPage {
  pub grid: String,
  pub thread: String,
  pub comment_count: Option<i64>,
  pub profile: Option<Profile>,
  pub alerts: Vec<String>,
  pub location: Option<String>
}

// Kept to render the thread again when one text
// or the count changes.
struct Thread {
  title: String,
  comments: Vec<CommentDto>,
  moderator: bool,
  redacted: HashSet<TextTarget>
}

#[derive(Default)]
struct Document {
  page: HtmlPage,
  thread: Option<Thread>
}

/**
 * Ui that accumulates rendered HTML instead of
 * showing anything. Confirmations get a fixed
 * answer since there's nobody to ask.
 */
pub struct HtmlUi {
  renderer: HtmlRenderer,
  confirm_answer: bool,
  doc: Mutex<Document>
}

impl HtmlUi {

  pub fn new(renderer: HtmlRenderer, confirm_answer: bool) -> Self {
    Self {
      renderer,
      confirm_answer,
      doc: Mutex::new(Document::default())
    }
  }

  fn doc(&self) -> MutexGuard<'_, Document> {
    self.doc.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn page(&self) -> HtmlPage {
    self.doc().page.clone()
  }

  fn render_thread(&self, doc: &mut Document) {
    let html = match &doc.thread {
      Some(thread) => self.renderer.comment_thread(
        &thread.title,
        doc.page.comment_count,
        &thread.comments,
        &thread.redacted,
        thread.moderator
      ),
      None => return
    };
    match html {
      Ok(html) => doc.page.thread = html,
      Err(e) => error!("{:?}", e)
    }
  }

}

impl Ui for HtmlUi {

  fn alert(&self, message: &str) {
    self.doc().page.alerts.push(message.to_string());
  }

  fn confirm(&self, message: &str) -> bool {
    info!("{} - answering {}", message, self.confirm_answer);
    self.confirm_answer
  }

  fn navigate(&self, path: &str) {
    self.doc().page.location = Some(path.to_string());
  }

  fn render_articles(&self, cards: &[ArticleCard], clear: bool) {
    let html = match self.renderer.article_grid(cards) {
      Ok(h) => h,
      Err(e) => {
        error!("{:?}", e);
        return;
      }
    };
    let mut doc = self.doc();
    if clear {
      doc.page.grid = html;
    } else {
      doc.page.grid.push_str(&html);
    }
  }

  fn render_comments(&self, article_title: &str, comments: &[CommentDto], moderator: bool) {
    let mut doc = self.doc();
    // Fresh data from the server, nothing is marked
    // as just redacted anymore.
    doc.thread = Some(Thread {
      title: article_title.to_string(),
      comments: comments.to_vec(),
      moderator,
      redacted: HashSet::new()
    });
    self.render_thread(&mut doc);
  }

  fn set_comment_count(&self, count: i64) {
    let mut doc = self.doc();
    doc.page.comment_count = Some(count);
    self.render_thread(&mut doc);
  }

  fn update_comment_text(&self, target: TextTarget, text: &str, style: TextStyle) {
    let mut doc = self.doc();
    if let Some(thread) = doc.thread.as_mut() {
      set_thread_text(&mut thread.comments, target, text, style == TextStyle::Removed);
      if style == TextStyle::Redacted {
        thread.redacted.insert(target);
      } else {
        thread.redacted.remove(&target);
      }
    }
    self.render_thread(&mut doc);
  }

  fn show_profile(&self, profile: &Profile) {
    self.doc().page.profile = Some(profile.clone());
  }

}
