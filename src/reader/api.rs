use async_trait::async_trait;
use color_eyre::Result;
use derive_more::Display;
use eyre::{eyre, WrapErr};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use crate::app::dtos::*;
use crate::config::ReaderConfig;
use super::articles::{Article, SearchResponse};

// Everything that can go wrong talking to the
// backend or the search provider. The controller
// picks the message to show from it.
#[derive(Debug, Display, Clone, PartialEq)]
pub enum ApiError {
  #[display(fmt = "Unauthorized")]
  Unauthorized,
  #[display(fmt = "Forbidden")]
  Forbidden,
  #[display(fmt = "Not Found")]
  NotFound,
  #[display(fmt = "Unexpected status {}", _0)]
  Status(u16),
  #[display(fmt = "Transport error: {}", _0)]
  Transport(String),
  #[display(fmt = "Could not decode response: {}", _0)]
  Decode(String),
  #[display(fmt = "No API key available")]
  MissingKey
}

impl ApiError {
  pub fn from_status(status: StatusCode) -> Self {
    match status {
      StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
      StatusCode::FORBIDDEN => ApiError::Forbidden,
      StatusCode::NOT_FOUND => ApiError::NotFound,
      other => ApiError::Status(other.as_u16())
    }
  }
}

impl From<reqwest::Error> for ApiError {
  fn from(e: reqwest::Error) -> Self {
    if e.is_decode() {
      ApiError::Decode(e.to_string())
    } else {
      ApiError::Transport(e.to_string())
    }
  }
}

/**
 * Every call the reader makes. The comment endpoints
 * live on our backend, search goes to the article
 * search provider with the key the backend hands out.
 */
#[async_trait]
pub trait ReaderApi: Send + Sync {
  async fn api_key(&self) -> Result<String, ApiError>;
  async fn search(&self, key: &str, page: u32) -> Result<Vec<Article>, ApiError>;
  async fn login(&self, email: &str, password: &str) -> Result<(), ApiError>;
  async fn current_user(&self) -> Result<UserDto, ApiError>;
  async fn user_details(&self) -> Result<UserDetailsDto, ApiError>;
  async fn comments(&self, article_title: &str) -> Result<Vec<CommentDto>, ApiError>;
  async fn comment_count(&self, article_title: &str) -> Result<i64, ApiError>;
  async fn post_comment(&self, article_title: &str, text: &str) -> Result<CommentDto, ApiError>;
  async fn post_reply(&self, comment_id: i64, text: &str) -> Result<ReplyDto, ApiError>;
  async fn post_nested_reply(
    &self,
    comment_id: i64,
    reply_id: i64,
    text: &str
  ) -> Result<ReplyDto, ApiError>;
  async fn delete_comment(&self, comment_id: i64) -> Result<(), ApiError>;
  async fn delete_reply(&self, comment_id: i64, reply_id: i64) -> Result<(), ApiError>;
  async fn redact_comment(&self, comment_id: i64, redacted_text: &str) -> Result<(), ApiError>;
  async fn redact_reply(
    &self,
    comment_id: i64,
    reply_id: i64,
    redacted_text: &str
  ) -> Result<(), ApiError>;
}

// Talks to a running backend over HTTP. The cookie
// store keeps the session between calls, like a
// browser would.
pub struct HttpReaderApi {
  client: Client,
  backend_url: Url,
  search_url: Url,
  search_query: String
}

impl HttpReaderApi {

  pub fn new(config: &ReaderConfig) -> Result<Self> {
    let backend_url = Url::parse(&config.backend_url)
      .context(format!("Invalid backend URL {}", config.backend_url))?;
    if backend_url.cannot_be_a_base() {
      return Err(eyre!("Backend URL {} cannot have a path", backend_url));
    }
    let search_url = Url::parse(&config.search_url)
      .context(format!("Invalid search URL {}", config.search_url))?;
    let client = Client::builder()
      .cookie_store(true)
      .build()
      .context("Building HTTP client")?;
    Ok(Self {
      client,
      backend_url,
      search_url,
      search_query: config.search_query.clone()
    })
  }

  // Segments get percent-encoded, article titles
  // can contain about anything.
  fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.backend_url.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

}

fn checked(response: Response) -> Result<Response, ApiError> {
  let status = response.status();
  if status.is_success() {
    Ok(response)
  } else {
    Err(ApiError::from_status(status))
  }
}

async fn json_body<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
  let response = checked(response)?;
  let body = response.bytes().await?;
  serde_json::from_slice(&body)
    .map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait]
impl ReaderApi for HttpReaderApi {

  async fn api_key(&self) -> Result<String, ApiError> {
    let response = self.client.get(self.endpoint(&["api", "key"]))
      .send()
      .await?;
    if !response.status().is_success() {
      return Err(ApiError::MissingKey);
    }
    let dto: ApiKeyDto = json_body(response).await?;
    if dto.key.is_empty() {
      Err(ApiError::MissingKey)
    } else {
      Ok(dto.key)
    }
  }

  async fn search(&self, key: &str, page: u32) -> Result<Vec<Article>, ApiError> {
    let page = page.to_string();
    let response = self.client.get(self.search_url.clone())
      .query(&[
        ("q", self.search_query.as_str()),
        ("page", page.as_str()),
        ("api-key", key)
      ])
      .send()
      .await?;
    let body: SearchResponse = json_body(response).await?;
    Ok(body.into_docs())
  }

  // Redirects are followed, a good login ends up
  // on the app page with a 200.
  async fn login(&self, email: &str, password: &str) -> Result<(), ApiError> {
    let form = LoginForm {
      email: email.to_string(),
      password: password.to_string()
    };
    let response = self.client.post(self.endpoint(&["login"]))
      .form(&form)
      .send()
      .await?;
    checked(response).map(|_| ())
  }

  async fn current_user(&self) -> Result<UserDto, ApiError> {
    let response = self.client.get(self.endpoint(&["api", "user"]))
      .send()
      .await?;
    json_body(response).await
  }

  async fn user_details(&self) -> Result<UserDetailsDto, ApiError> {
    let response = self.client.get(self.endpoint(&["api", "user-details"]))
      .send()
      .await?;
    json_body(response).await
  }

  async fn comments(&self, article_title: &str) -> Result<Vec<CommentDto>, ApiError> {
    let response = self.client
      .get(self.endpoint(&["api", "comments", article_title]))
      .send()
      .await?;
    json_body(response).await
  }

  async fn comment_count(&self, article_title: &str) -> Result<i64, ApiError> {
    let response = self.client
      .get(self.endpoint(&["api", "comment-count", article_title]))
      .send()
      .await?;
    let dto: CommentCountDto = json_body(response).await?;
    Ok(dto.count)
  }

  async fn post_comment(&self, article_title: &str, text: &str) -> Result<CommentDto, ApiError> {
    let form = NewCommentForm {
      article_title: article_title.to_string(),
      text: text.to_string()
    };
    let response = self.client.post(self.endpoint(&["api", "comments"]))
      .json(&form)
      .send()
      .await?;
    json_body(response).await
  }

  async fn post_reply(&self, comment_id: i64, text: &str) -> Result<ReplyDto, ApiError> {
    let id = comment_id.to_string();
    let response = self.client
      .post(self.endpoint(&["api", "comments", &id, "replies"]))
      .json(&ReplyForm { text: text.to_string() })
      .send()
      .await?;
    json_body(response).await
  }

  async fn post_nested_reply(
    &self,
    comment_id: i64,
    reply_id: i64,
    text: &str
  ) -> Result<ReplyDto, ApiError> {
    let id = comment_id.to_string();
    let reply = reply_id.to_string();
    let response = self.client
      .post(self.endpoint(&["api", "comments", &id, "replies", &reply, "replies"]))
      .json(&ReplyForm { text: text.to_string() })
      .send()
      .await?;
    json_body(response).await
  }

  async fn delete_comment(&self, comment_id: i64) -> Result<(), ApiError> {
    let id = comment_id.to_string();
    let response = self.client
      .delete(self.endpoint(&["api", "comments", &id]))
      .send()
      .await?;
    checked(response).map(|_| ())
  }

  async fn delete_reply(&self, comment_id: i64, reply_id: i64) -> Result<(), ApiError> {
    let id = comment_id.to_string();
    let reply = reply_id.to_string();
    let response = self.client
      .delete(self.endpoint(&["api", "comments", &id, "replies", &reply]))
      .send()
      .await?;
    checked(response).map(|_| ())
  }

  async fn redact_comment(&self, comment_id: i64, redacted_text: &str) -> Result<(), ApiError> {
    let id = comment_id.to_string();
    let response = self.client
      .put(self.endpoint(&["api", "comments", &id, "partial-redact"]))
      .json(&RedactForm { redacted_text: redacted_text.to_string() })
      .send()
      .await?;
    checked(response).map(|_| ())
  }

  async fn redact_reply(
    &self,
    comment_id: i64,
    reply_id: i64,
    redacted_text: &str
  ) -> Result<(), ApiError> {
    let id = comment_id.to_string();
    let reply = reply_id.to_string();
    let response = self.client
      .put(self.endpoint(&["api", "comments", &id, "replies", &reply, "partial-redact"]))
      .json(&RedactForm { redacted_text: redacted_text.to_string() })
      .send()
      .await?;
    checked(response).map(|_| ())
  }

}
