use std::collections::HashMap;
use std::sync::Mutex;
use async_trait::async_trait;
use serde_json::json;
use crate::app::dtos::*;
use crate::db::entities::REMOVED_NOTICE;
use super::api::{ApiError, ReaderApi};
use super::articles::{Article, ArticleCard};
use super::controller::{ReaderController, LOGIN_PATH};
use super::pager::ScrollMetrics;
use super::ui::{Profile, TextStyle, TextTarget, Ui};

const TITLE: &'static str = "Test Article";

// Call log and canned answers. A None result
// stands for a network failure.
#[derive(Default)]
struct FakeState {
  calls: Vec<String>,
  key: Option<String>,
  pages: HashMap<u32, Vec<Article>>,
  search_error: Option<ApiError>,
  counts: HashMap<String, i64>,
  comments: Vec<CommentDto>,
  user: UserDto,
  details: Option<UserDetailsDto>,
  write_error: Option<ApiError>
}

#[derive(Default)]
struct FakeApi {
  state: Mutex<FakeState>
}

impl FakeApi {

  fn with(f: impl FnOnce(&mut FakeState)) -> Self {
    let api = FakeApi::default();
    f(&mut api.state.lock().unwrap());
    api
  }

  fn record(&self, call: String) {
    self.state.lock().unwrap().calls.push(call);
  }

  fn calls(&self) -> Vec<String> {
    self.state.lock().unwrap().calls.clone()
  }

  fn count_calls(&self, prefix: &str) -> usize {
    self.calls().iter().filter(|c| c.starts_with(prefix)).count()
  }

  fn write_result(&self) -> Result<(), ApiError> {
    match self.state.lock().unwrap().write_error.clone() {
      Some(e) => Err(e),
      None => Ok(())
    }
  }

}

fn reply_dto(id: i64) -> ReplyDto {
  ReplyDto {
    id,
    username: "alice".to_string(),
    text: "reply".to_string(),
    timestamp: "2021-03-07T20:59:00Z".to_string(),
    removed: false,
    parent_reply_id: None
  }
}

#[async_trait]
impl ReaderApi for FakeApi {

  async fn api_key(&self) -> Result<String, ApiError> {
    self.record("key".to_string());
    // Gives the other futures a chance to run,
    // like a real request would.
    tokio::task::yield_now().await;
    self.state.lock().unwrap().key.clone().ok_or(ApiError::MissingKey)
  }

  async fn search(&self, _key: &str, page: u32) -> Result<Vec<Article>, ApiError> {
    self.record(format!("search {}", page));
    tokio::task::yield_now().await;
    let state = self.state.lock().unwrap();
    if let Some(e) = &state.search_error {
      return Err(e.clone());
    }
    Ok(state.pages.get(&page).cloned().unwrap_or_default())
  }

  async fn login(&self, email: &str, _password: &str) -> Result<(), ApiError> {
    self.record(format!("login {}", email));
    Ok(())
  }

  async fn current_user(&self) -> Result<UserDto, ApiError> {
    self.record("user".to_string());
    Ok(self.state.lock().unwrap().user.clone())
  }

  async fn user_details(&self) -> Result<UserDetailsDto, ApiError> {
    self.record("user-details".to_string());
    self.state.lock().unwrap().details.clone()
      .ok_or_else(|| ApiError::Transport("connection refused".to_string()))
  }

  async fn comments(&self, article_title: &str) -> Result<Vec<CommentDto>, ApiError> {
    self.record(format!("comments {}", article_title));
    Ok(self.state.lock().unwrap().comments.clone())
  }

  async fn comment_count(&self, article_title: &str) -> Result<i64, ApiError> {
    self.record(format!("count {}", article_title));
    self.state.lock().unwrap().counts.get(article_title).copied()
      .ok_or(ApiError::Status(500))
  }

  async fn post_comment(&self, article_title: &str, text: &str) -> Result<CommentDto, ApiError> {
    self.record(format!("post comment {}", text));
    self.write_result()?;
    Ok(CommentDto {
      id: 10,
      article_title: article_title.to_string(),
      username: "alice".to_string(),
      text: text.to_string(),
      timestamp: "2021-03-07T20:59:00Z".to_string(),
      removed: false,
      replies: Vec::new()
    })
  }

  async fn post_reply(&self, comment_id: i64, text: &str) -> Result<ReplyDto, ApiError> {
    self.record(format!("post reply {} {}", comment_id, text));
    self.write_result()?;
    Ok(reply_dto(20))
  }

  async fn post_nested_reply(
    &self,
    comment_id: i64,
    reply_id: i64,
    text: &str
  ) -> Result<ReplyDto, ApiError> {
    self.record(format!("post nested reply {} {} {}", comment_id, reply_id, text));
    self.write_result()?;
    Ok(reply_dto(21))
  }

  async fn delete_comment(&self, comment_id: i64) -> Result<(), ApiError> {
    self.record(format!("delete comment {}", comment_id));
    self.write_result()
  }

  async fn delete_reply(&self, comment_id: i64, reply_id: i64) -> Result<(), ApiError> {
    self.record(format!("delete reply {} {}", comment_id, reply_id));
    self.write_result()
  }

  async fn redact_comment(&self, comment_id: i64, redacted_text: &str) -> Result<(), ApiError> {
    self.record(format!("redact comment {} {}", comment_id, redacted_text));
    self.write_result()
  }

  async fn redact_reply(
    &self,
    comment_id: i64,
    reply_id: i64,
    redacted_text: &str
  ) -> Result<(), ApiError> {
    self.record(format!("redact reply {} {} {}", comment_id, reply_id, redacted_text));
    self.write_result()
  }

}

// Every Ui call, in order.
#[derive(Debug, Clone, PartialEq)]
enum UiEvent {
  Alert(String),
  Navigate(String),
  Articles(Vec<ArticleCard>, bool),
  Comments(String, usize, bool),
  Count(i64),
  Text(TextTarget, String, TextStyle),
  Profile(Profile)
}

struct RecordingUi {
  confirm_answer: bool,
  events: Mutex<Vec<UiEvent>>
}

impl RecordingUi {

  fn new(confirm_answer: bool) -> Self {
    Self { confirm_answer, events: Mutex::new(Vec::new()) }
  }

  fn events(&self) -> Vec<UiEvent> {
    self.events.lock().unwrap().clone()
  }

  fn push(&self, event: UiEvent) {
    self.events.lock().unwrap().push(event);
  }

}

impl Ui for RecordingUi {
  fn alert(&self, message: &str) {
    self.push(UiEvent::Alert(message.to_string()));
  }

  fn confirm(&self, _message: &str) -> bool {
    self.confirm_answer
  }

  fn navigate(&self, path: &str) {
    self.push(UiEvent::Navigate(path.to_string()));
  }

  fn render_articles(&self, cards: &[ArticleCard], clear: bool) {
    self.push(UiEvent::Articles(cards.to_vec(), clear));
  }

  fn render_comments(&self, article_title: &str, comments: &[CommentDto], moderator: bool) {
    self.push(UiEvent::Comments(article_title.to_string(), comments.len(), moderator));
  }

  fn set_comment_count(&self, count: i64) {
    self.push(UiEvent::Count(count));
  }

  fn update_comment_text(&self, target: TextTarget, text: &str, style: TextStyle) {
    self.push(UiEvent::Text(target, text.to_string(), style));
  }

  fn show_profile(&self, profile: &Profile) {
    self.push(UiEvent::Profile(profile.clone()));
  }
}

fn article(title: &str) -> Article {
  serde_json::from_value(json!({
    "headline": { "main": title },
    "abstract": "Abstract",
    "word_count": 450
  })).unwrap()
}

fn comment(id: i64, text: &str) -> CommentDto {
  CommentDto {
    id,
    article_title: TITLE.to_string(),
    username: "alice".to_string(),
    text: text.to_string(),
    timestamp: "2021-03-07T20:59:00Z".to_string(),
    removed: false,
    replies: vec![ReplyDto { text: "Reply with secret words".to_string(), ..reply_dto(2) }]
  }
}

fn paged_api() -> FakeApi {
  FakeApi::with(|s| {
    s.key = Some("KEY".to_string());
    for page in 0..5 {
      s.pages.insert(page, vec![article(&format!("Article {}", page))]);
    }
    s.counts.insert("Article 0".to_string(), 7);
  })
}

fn controller(api: FakeApi, confirm: bool) -> ReaderController<FakeApi, RecordingUi> {
  ReaderController::new(api, RecordingUi::new(confirm), 3)
}

const AT_BOTTOM: ScrollMetrics = ScrollMetrics {
  scroll_top: 2000.0,
  viewport_height: 800.0,
  document_height: 2500.0
};

#[tokio::test]
async fn first_page_renders_cards_with_counts() {
  let sut = controller(paged_api(), true);
  sut.fetch_page(0).await;
  let events = sut.ui().events();
  assert_eq!(1, events.len());
  match &events[0] {
    UiEvent::Articles(cards, clear) => {
      assert!(*clear);
      assert_eq!("Article 0", cards[0].title);
      assert_eq!(7, cards[0].comment_count);
      assert_eq!("2 MIN READ", cards[0].read_time);
    },
    other => panic!("Unexpected event {:?}", other)
  }
  assert_eq!(0, sut.state().pager.current_page());
}

#[tokio::test]
async fn failed_count_falls_back_to_zero() {
  let sut = controller(paged_api(), true);
  sut.fetch_page(0).await;
  sut.on_scroll(AT_BOTTOM).await;
  match sut.ui().events().last() {
    Some(UiEvent::Articles(cards, clear)) => {
      assert!(!*clear);
      assert_eq!("Article 1", cards[0].title);
      assert_eq!(0, cards[0].comment_count);
    },
    other => panic!("Unexpected event {:?}", other)
  }
}

#[tokio::test]
async fn concurrent_fetches_send_one_request() {
  let sut = controller(paged_api(), true);
  futures::join!(sut.fetch_page(0), sut.fetch_page(0));
  assert_eq!(1, sut.api().count_calls("search"));
  assert!(!sut.state().pager.is_fetching());
}

#[tokio::test]
async fn pagination_stops_at_max_pages() {
  let sut = controller(paged_api(), true);
  sut.fetch_page(0).await;
  for _ in 0..10 {
    sut.on_scroll(AT_BOTTOM).await;
  }
  // Results remain for pages 3 and 4.
  assert_eq!(
    vec!["search 0", "search 1", "search 2"],
    sut.api().calls().into_iter()
      .filter(|c| c.starts_with("search"))
      .collect::<Vec<String>>()
  );
  assert!(!sut.state().pager.is_listening());
  sut.fetch_page(3).await;
  assert_eq!(3, sut.api().count_calls("search"));
}

#[tokio::test]
async fn missing_key_only_releases_the_latch() {
  let sut = controller(FakeApi::default(), true);
  sut.fetch_page(0).await;
  assert_eq!(0, sut.api().count_calls("search"));
  assert!(sut.ui().events().is_empty());
  let state = sut.state();
  assert!(!state.pager.is_fetching());
  assert!(state.pager.has_more());
}

#[tokio::test]
async fn empty_or_failed_page_stops_pagination() {
  let sut = controller(FakeApi::with(|s| s.key = Some("KEY".to_string())), true);
  sut.fetch_page(0).await;
  assert!(!sut.state().pager.has_more());
  assert!(sut.ui().events().is_empty());

  let sut = controller(FakeApi::with(|s| {
    s.key = Some("KEY".to_string());
    s.search_error = Some(ApiError::Status(429));
  }), true);
  sut.fetch_page(0).await;
  assert!(!sut.state().pager.has_more());
}

#[tokio::test]
async fn session_sets_moderator_and_profile() {
  let api = FakeApi::with(|s| {
    s.user = UserDto { username: Some("mod".to_string()), is_moderator: true };
    s.details = Some(UserDetailsDto { username: Some("mod".to_string()), email: None });
  });
  let sut = controller(api, true);
  let profile = sut.refresh_session().await.unwrap();
  assert_eq!("No email provided", profile.email);
  assert!(sut.state().is_moderator);

  // Details failing keeps the username we have.
  let api = FakeApi::with(|s| {
    s.user = UserDto { username: Some("alice".to_string()), is_moderator: false };
  });
  let sut = controller(api, true);
  let profile = sut.refresh_session().await.unwrap();
  assert_eq!("alice", profile.username);
  assert_eq!("Email not available", profile.email);
}

#[tokio::test]
async fn anonymous_profile_goes_to_login() {
  let sut = controller(FakeApi::default(), true);
  assert!(sut.refresh_session().await.is_none());
  sut.open_profile().await;
  assert_eq!(vec![UiEvent::Navigate(LOGIN_PATH.to_string())], sut.ui().events());
}

#[tokio::test]
async fn open_comments_count_fallback() {
  let api = FakeApi::with(|s| s.comments = vec![comment(1, "Hello")]);
  let sut = controller(api, true);
  sut.open_comments(TITLE, 42).await;
  assert_eq!(
    vec![
      UiEvent::Count(42),
      UiEvent::Comments(TITLE.to_string(), 1, false)
    ],
    sut.ui().events()
  );
  assert_eq!(1, sut.cached_comments(TITLE).len());
}

#[tokio::test]
async fn comment_submission_reloads_thread() {
  let api = FakeApi::with(|s| {
    s.counts.insert(TITLE.to_string(), 1);
  });
  let sut = controller(api, true);
  sut.open_comments(TITLE, 0).await;
  sut.submit_comment("   ").await;
  assert_eq!(0, sut.api().count_calls("post"));

  sut.submit_comment("Nice one").await;
  sut.submit_reply(1, "Agreed").await;
  sut.submit_nested_reply(1, 2, "Me too").await;
  let calls = sut.api().calls();
  assert!(calls.contains(&"post comment Nice one".to_string()));
  assert!(calls.contains(&"post reply 1 Agreed".to_string()));
  assert!(calls.contains(&"post nested reply 1 2 Me too".to_string()));
  // One load when opening, one per write.
  assert_eq!(4, sut.api().count_calls("comments"));
}

#[tokio::test]
async fn unauthorized_write_goes_to_login_without_changes() {
  let api = FakeApi::with(|s| {
    s.comments = vec![comment(1, "Hello")];
    s.write_error = Some(ApiError::Unauthorized);
  });
  let sut = controller(api, true);
  sut.open_comments(TITLE, 0).await;
  let before = sut.ui().events().len();

  sut.submit_comment("Hi").await;
  assert_eq!(
    vec![
      UiEvent::Alert("Please log in to comment".to_string()),
      UiEvent::Navigate(LOGIN_PATH.to_string())
    ],
    sut.ui().events()[before..].to_vec()
  );

  let before = sut.ui().events().len();
  assert!(sut.redact_comment(1, "").await.is_none());
  assert_eq!(
    vec![
      UiEvent::Alert("Please log in to redact comments".to_string()),
      UiEvent::Navigate(LOGIN_PATH.to_string())
    ],
    sut.ui().events()[before..].to_vec()
  );
  assert_eq!("Hello", sut.cached_comments(TITLE)[0].text);
}

#[tokio::test]
async fn forbidden_delete_alerts() {
  let api = FakeApi::with(|s| {
    s.comments = vec![comment(1, "Hello")];
    s.write_error = Some(ApiError::Forbidden);
  });
  let sut = controller(api, true);
  sut.open_comments(TITLE, 0).await;
  sut.delete_reply(1, 2).await;
  assert_eq!(
    Some(&UiEvent::Alert("Only moderators can remove replies".to_string())),
    sut.ui().events().last()
  );
}

#[tokio::test]
async fn delete_needs_confirmation() {
  let api = FakeApi::with(|s| s.comments = vec![comment(1, "Hello")]);
  let sut = controller(api, false);
  sut.open_comments(TITLE, 0).await;
  sut.delete_comment(1).await;
  assert_eq!(0, sut.api().count_calls("delete"));
}

#[tokio::test]
async fn delete_marks_comment_removed() {
  let api = FakeApi::with(|s| s.comments = vec![comment(1, "Hello")]);
  let sut = controller(api, true);
  sut.open_comments(TITLE, 0).await;
  sut.delete_comment(1).await;
  assert!(sut.ui().events().contains(&UiEvent::Text(
    TextTarget::Comment(1),
    REMOVED_NOTICE.to_string(),
    TextStyle::Removed
  )));
  assert_eq!(1, sut.api().count_calls("delete comment 1"));
}

#[tokio::test]
async fn redaction_sends_blacked_out_text() {
  let api = FakeApi::with(|s| {
    s.comments = vec![comment(1, "This contains sensitive information")];
  });
  let sut = controller(api, true);
  sut.open_comments(TITLE, 0).await;

  let sent = sut.redact_comment(1, "This contains information").await;
  let expected = "This contains █████████ information";
  assert_eq!(Some(expected.to_string()), sent);
  assert!(sut.api().calls().contains(&format!("redact comment 1 {}", expected)));
  assert_eq!(expected, sut.cached_comments(TITLE)[0].text);

  let sent = sut.redact_reply(1, 2, "Reply with words").await;
  assert_eq!(Some("Reply with ██████ words".to_string()), sent);
}

#[tokio::test]
async fn failed_redaction_restores_text() {
  let api = FakeApi::with(|s| {
    s.comments = vec![comment(1, "Some text")];
    s.write_error = Some(ApiError::Status(400));
  });
  let sut = controller(api, true);
  sut.open_comments(TITLE, 0).await;
  sut.redact_comment(1, "Some").await;
  let events = sut.ui().events();
  let n = events.len();
  assert_eq!(
    UiEvent::Alert("Failed to redact comment. Please try again.".to_string()),
    events[n - 2]
  );
  assert_eq!(
    UiEvent::Text(TextTarget::Comment(1), "Some text".to_string(), TextStyle::Plain),
    events[n - 1]
  );
}

#[tokio::test]
async fn reset_clears_navigation_state() {
  let api = FakeApi::with(|s| {
    s.user = UserDto { username: Some("mod".to_string()), is_moderator: true };
    s.comments = vec![comment(1, "Hello")];
  });
  let sut = controller(api, true);
  sut.refresh_session().await;
  sut.open_comments(TITLE, 0).await;
  sut.state().pager.begin(0);
  sut.reset();
  let state = sut.state();
  assert!(state.comments.is_empty());
  assert!(state.article_title.is_none());
  assert!(!state.pager.is_fetching());
  assert!(state.is_moderator);
}
