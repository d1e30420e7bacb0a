use actix_web::{cookie::Key, middleware, web, App, HttpServer};
use actix_cors::Cors;
use actix_session::{
  config::CookieContentSecurity,
  storage::CookieSessionStore,
  SessionMiddleware
};
use r2d2_sqlite::{self, SqliteConnectionManager};
use color_eyre::Result;
use eyre::{WrapErr, eyre};
use log::{debug, error, info, warn};
use handlebars::Handlebars;
use rate_limiter::BasicRateLimiter;
use std::sync::RwLock;
// We have to add crate here because of the other
// crate named "config" that we use as a dependency.
use crate::config::{Config, SiteInfo};
use crate::db::{self, Pool};
pub mod handlers;
pub mod dtos;
pub mod error;
pub mod helpers;
mod rate_limiter;

const SESSION_COOKIE_NAME: &'static str = "session";
const TEMPLATE_EXT: &'static str = ".hbs";

// Declare app state struct:
pub struct AppState {
  pub users_pool: Pool,
  pub comments_pool: Pool,
  pub rate_limiter: RwLock<BasicRateLimiter>,
  pub site_info: SiteInfo,
  pub search_key: Option<String>
}

impl AppState {

  pub fn new(
    users_pool: Pool,
    comments_pool: Pool,
    config: &Config
  ) -> Self {
    Self {
      users_pool,
      comments_pool,
      rate_limiter: RwLock::new(
        BasicRateLimiter::new(
          config.rl_max_requests,
          config.rl_max_requests_time,
          config.rl_block_duration
        )
      ),
      site_info: config.into(),
      search_key: config.nyt_api_key.clone()
    }
  }

  // Returns true when the request has to be
  // turned away.
  pub fn check_rate_limit(&self) -> bool {
    match self.rate_limiter.write() {
      Ok(mut rl) => rl.update(),
      Err(e) => {
        // I decided to ignore possible weird rate limiter lock
        // errors which should never happen.
        error!("Could not get a write handle on the \
          rate limiter, SHOULD NEVER HAPPEN - {}", e);
        false
      }
    }
  }

}

pub fn open_pool(path: &str) -> Result<Pool> {
  let manager = SqliteConnectionManager::file(path);
  Pool::new(manager)
    .context(format!("Opening database at {}", path))
}

pub fn load_templates(template_dir: &str) -> Result<Handlebars<'static>> {
  let mut handlebars = Handlebars::new();
  handlebars
    .register_templates_directory(TEMPLATE_EXT, template_dir)
    .context("Templates directory might be missing or not accessible")?;
  Ok(handlebars)
}

// The cookie holds the whole session, encrypted.
fn session_key(config: &Config) -> Result<Key> {
  match &config.session_secret {
    Some(secret) => Key::try_from(secret.as_bytes())
      .map_err(|e| eyre!("SESSION_SECRET is too short, needs 64 bytes - {}", e)),
    None => {
      warn!("No SESSION_SECRET set, sessions won't survive a restart");
      Ok(Key::generate())
    }
  }
}

pub fn session_middleware(key: Key, secure: bool) -> SessionMiddleware<CookieSessionStore> {
  SessionMiddleware::builder(CookieSessionStore::default(), key)
    .cookie_name(SESSION_COOKIE_NAME.to_string())
    .cookie_path("/".to_string())
    .cookie_secure(secure)
    .cookie_http_only(true)
    .cookie_content_security(CookieContentSecurity::Private)
    .build()
}

// Function to start the server, main.rs wraps it
// in the actix runtime.
pub async fn run() -> Result<()> {
  let config = Config::from_env()?;
  debug!("Current config: {:?}", config);

  // Both databases get their schema created if
  // the init-db binary was never run.
  let users_pool = open_pool(&config.users_db_path)?;
  db::create_users_schema(&users_pool)?;
  let comments_pool = open_pool(&config.comments_db_path)?;
  db::create_comments_schema(&comments_pool)?;

  let handlebars_ref = web::Data::new(load_templates(&config.template_dir)?);
  let key = session_key(&config)?;
  let cookie_secure = config.cookie_secure;
  let bind_address = config.bind_address.clone();

  let app_state = web::Data::new(
    AppState::new(users_pool, comments_pool, &config)
  );

  info!("Starting server on {}", bind_address);
  HttpServer::new(move|| {
    App::new()
      .app_data(app_state.clone())
      .app_data(handlebars_ref.clone())
      .app_data(web::PathConfig::default().error_handler(|_, _| {
        actix_web::error::ErrorBadRequest("Invalid path arguments")
      }))
      .app_data(web::JsonConfig::default().error_handler(|_, _| {
        actix_web::error::ErrorBadRequest("Invalid JSON body")
      }))
      .wrap(session_middleware(key.clone(), cookie_secure))
      .wrap(
        Cors::default()
          .allow_any_origin()
          .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
          .allowed_header(actix_web::http::header::CONTENT_TYPE)
          .max_age(3600)
      )
      .wrap(middleware::Logger::default())
      .configure(base_endpoints_config)
      .default_service(web::route().to(handlers::not_found))
  })
  .bind(bind_address)?
  .run()
  .await
  .context("Start Actix web server")
}

// Route configuration:
pub fn base_endpoints_config(cfg: &mut web::ServiceConfig) {
  cfg.route("/", web::get().to(handlers::index))
    .route("/app", web::get().to(handlers::index))
    .route("/login", web::get().to(handlers::login_page))
    .route("/login", web::post().to(handlers::login))
    .route("/logout", web::get().to(handlers::logout))
    .route("/api/key", web::get().to(handlers::api_key))
    .route("/api/user", web::get().to(handlers::current_user))
    .route("/api/user-details", web::get().to(handlers::user_details))
    .route("/api/comments", web::post().to(handlers::post_comment))
    .route("/api/comments/{article_title}", web::get().to(handlers::comments_for_article))
    .route("/api/comments/{comment_id}", web::delete().to(handlers::delete_comment))
    .route("/api/comment-count/{article_title}", web::get().to(handlers::comment_count))
    .route("/api/comments/{comment_id}/replies", web::post().to(handlers::post_reply))
    .route("/api/comments/{comment_id}/replies/{reply_id}", web::delete().to(handlers::delete_reply))
    .route("/api/comments/{comment_id}/replies/{reply_id}/replies", web::post().to(handlers::post_nested_reply))
    .route("/api/comments/{comment_id}/partial-redact", web::put().to(handlers::redact_comment))
    .route("/api/comments/{comment_id}/replies/{reply_id}/partial-redact", web::put().to(handlers::redact_reply));
}
