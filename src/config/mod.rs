// Adding the context method to errors:
use eyre::WrapErr;
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use std::convert::From;

#[derive(Debug, Deserialize)]
pub struct Config {
  pub users_db_path: String,
  pub comments_db_path: String,
  pub bind_address: String,
  // Key for the article search provider, handed
  // out to the reader by /api/key.
  pub nyt_api_key: Option<String>,
  // Has to be at least 64 bytes long, a random
  // key is generated otherwise (sessions won't
  // survive restarts).
  pub session_secret: Option<String>,
  pub cookie_secure: bool,
  // Rate limiter settings:
  pub rl_max_requests: u32,
  pub rl_max_requests_time: u32,
  pub rl_block_duration: u32,
  pub template_dir: String,
  pub site_title: String,
  pub search_query: String
}

// Looks redundant but I thought having another
// struct would be better than moving all of this
// info around the app_state, especially since
// there could be sensible info in the config.
#[derive(Debug, Serialize, Clone)]
pub struct SiteInfo {
  pub title: String,
  pub search_query: String
}

impl From<&Config> for SiteInfo {
  fn from(config: &Config) -> Self {
    Self {
      title: config.site_title.clone(),
      search_query: config.search_query.clone()
    }
  }
}

impl Config {

  pub fn from_env() -> Result<Config> {
    // RUST_LOG is already set in main.rs if it
    // was absent.
    // You have to use lowercase when compared to
    // what's in the .env file.
    config::Config::builder()
      .set_default("users_db_path", "./users.sqlite")?
      .set_default("comments_db_path", "./comments.sqlite")?
      .set_default("bind_address", "127.0.0.1:8000")?
      .set_default("cookie_secure", false)?
      // Settings for the basic rate limiter on
      // comment and reply posting:
      .set_default("rl_max_requests", 120)?
      .set_default("rl_max_requests_time", 60)?
      .set_default("rl_block_duration", 60)?
      .set_default("template_dir", "./templates")?
      .set_default("site_title", "The Davis Times")?
      .set_default("search_query", DEFAULT_SEARCH_QUERY)?
      .add_source(config::Environment::default())
      .build()
      .and_then(|c| c.try_deserialize())
      // The error has to be given a context for
      // color_eyre to work here:
      .context("Loading configuration from env")
  }

}

pub const DEFAULT_SEARCH_QUERY: &'static str = "davis sacramento";
pub const DEFAULT_SEARCH_URL: &'static str =
  "https://api.nytimes.com/svc/search/v2/articlesearch.json";
// We want to show the footer too, so the
// article grid stops after that many pages.
pub const DEFAULT_MAX_PAGES: u32 = 3;

// Settings for the terminal reader. Shares the
// environment with the server config, the keys
// just don't overlap.
#[derive(Debug, Deserialize, Clone)]
pub struct ReaderConfig {
  pub backend_url: String,
  pub search_url: String,
  pub search_query: String,
  pub max_pages: u32
}

impl ReaderConfig {

  pub fn from_env() -> Result<ReaderConfig> {
    config::Config::builder()
      .set_default("backend_url", "http://127.0.0.1:8000")?
      .set_default("search_url", DEFAULT_SEARCH_URL)?
      .set_default("search_query", DEFAULT_SEARCH_QUERY)?
      .set_default("max_pages", i64::from(DEFAULT_MAX_PAGES))?
      .add_source(config::Environment::default())
      .build()
      .and_then(|c| c.try_deserialize())
      .context("Loading reader configuration from env")
  }

}

impl Default for ReaderConfig {
  fn default() -> Self {
    Self {
      backend_url: String::from("http://127.0.0.1:8000"),
      search_url: String::from(DEFAULT_SEARCH_URL),
      search_query: String::from(DEFAULT_SEARCH_QUERY),
      max_pages: DEFAULT_MAX_PAGES
    }
  }
}
