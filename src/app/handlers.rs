use actix_web::{
  http::header,
  web,
  HttpResponse,
  Result
};
use actix_session::Session;
use handlebars::Handlebars;
use log::{error, info, warn};
use crate::db::entities::*;
use crate::db;
use crate::redaction;
use crate::utils::{text_utils, time_utils};
use super::dtos::*;
use super::error::{Error, map_db_error};
use super::helpers::{self, SessionUser};
use super::AppState;

// Module with all the API handler functions.

const MAX_COMMENT_LENGTH: usize = 2000;

// Every handler answers with a Result, see the
// "error" module for the Error to response
// conversions.

fn render_page(
  hb: &Handlebars<'_>,
  template: &str,
  data: &PageData
) -> Result<String, Error> {
  hb.render(template, data)
    .map_err(|e| {
      error!("A template engine error occured when rendering {}: {}", template, e);
      Error::InternalServerError("Template engine error".to_string())
    })
}

// Serves both "/" and "/app".
pub async fn index(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  session: Session
) -> Result<HttpResponse, Error> {
  let mut data = PageData::new(&app_state.site_info);
  if let Some(user) = helpers::session_user(&session) {
    data.username = Some(user.username);
    data.is_moderator = user.is_moderator;
  }
  let body = render_page(&hb, "index", &data)?;
  Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(body))
}

pub async fn login_page(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>
) -> Result<HttpResponse, Error> {
  let body = render_page(&hb, "login", &PageData::new(&app_state.site_info))?;
  Ok(HttpResponse::Ok().content_type("text/html; charset=utf-8").body(body))
}

// Wrong credentials show the login page again,
// with a 401 so that non-browser clients know.
pub async fn login(
  app_state: web::Data<AppState>,
  hb: web::Data<Handlebars<'_>>,
  session: Session,
  form: web::Form<LoginForm>
) -> Result<HttpResponse, Error> {
  let email = form.email.trim();
  let user = db::user_by_email(&app_state.users_pool, email)
    .map_err(map_db_error)?
    .filter(|u| helpers::verify_password(&form.password, &u.hash));
  match user {
    Some(user) => {
      info!("User {} logged in", user.username);
      helpers::store_session_user(&session, SessionUser::from(user))?;
      Ok(
        HttpResponse::SeeOther()
          .insert_header((header::LOCATION, "/app"))
          .finish()
      )
    },
    None => {
      warn!("Failed login attempt for {}", email);
      let mut data = PageData::new(&app_state.site_info);
      data.error = Some("Invalid email or password");
      let body = render_page(&hb, "login", &data)?;
      Ok(
        HttpResponse::Unauthorized()
          .content_type("text/html; charset=utf-8")
          .body(body)
      )
    }
  }
}

pub async fn logout(session: Session) -> HttpResponse {
  session.purge();
  HttpResponse::SeeOther()
    .insert_header((header::LOCATION, "/"))
    .finish()
}

// Hands out the article search key. It's a 500
// when the server doesn't have one, the reader
// stops paginating in that case.
pub async fn api_key(
  app_state: web::Data<AppState>
) -> HttpResponse {
  match &app_state.search_key {
    Some(key) => HttpResponse::Ok().json(ApiKeyDto { key: key.clone() }),
    None => {
      error!("Article search API key requested but none is configured");
      HttpResponse::InternalServerError().json(ErrorBody {
        error: String::from("API key not found")
      })
    }
  }
}

pub async fn current_user(session: Session) -> HttpResponse {
  let dto = match helpers::session_user(&session) {
    Some(user) => UserDto {
      username: Some(user.username),
      is_moderator: user.is_moderator
    },
    None => UserDto::default()
  };
  HttpResponse::Ok().json(dto)
}

pub async fn user_details(session: Session) -> HttpResponse {
  let dto = match helpers::session_user(&session) {
    Some(user) => UserDetailsDto {
      username: Some(user.username),
      email: Some(user.email)
    },
    None => UserDetailsDto::default()
  };
  HttpResponse::Ok().json(dto)
}

// Actix decodes path segments except for "%2F",
// which article titles can contain.
fn path_title(raw: String) -> String {
  raw.replace("%2F", "/").replace("%2f", "/")
}

// Path variables have to be in a tuple.
pub async fn comments_for_article(
  app_state: web::Data<AppState>,
  path: web::Path<(String,)>
) -> Result<HttpResponse, Error> {
  let article_title = path_title(path.into_inner().0);
  let comments: Vec<CommentDto> = db::comments_for_article(
    &app_state.comments_pool,
    &article_title
  )
    .map_err(map_db_error)?
    .into_iter()
    .map(CommentDto::from)
    .collect();
  Ok(HttpResponse::Ok().json(comments))
}

pub async fn comment_count(
  app_state: web::Data<AppState>,
  path: web::Path<(String,)>
) -> Result<HttpResponse, Error> {
  let article_title = path_title(path.into_inner().0);
  let count = db::comment_count(&app_state.comments_pool, &article_title)
    .map_err(map_db_error)?;
  Ok(HttpResponse::Ok().json(CommentCountDto { count }))
}

fn clean_text(text: &str) -> Result<String, Error> {
  text_utils::clean_body(text, MAX_COMMENT_LENGTH)
    .ok_or_else(|| Error::BadRequest(String::from("Comment text cannot be empty")))
}

// Called after the auth and body checks, so that
// garbage requests don't count.
fn check_rate_limit(app_state: &AppState) -> Result<(), Error> {
  if app_state.check_rate_limit() {
    Err(Error::TooManyRequests)
  } else {
    Ok(())
  }
}

fn existing_comment(app_state: &AppState, comment_id: i64) -> Result<Comment, Error> {
  db::comment_by_id(&app_state.comments_pool, comment_id)
    .map_err(map_db_error)?
    .ok_or_else(|| Error::NotFound(String::from("Comment does not exist")))
}

fn existing_reply(
  app_state: &AppState,
  comment_id: i64,
  reply_id: i64
) -> Result<Reply, Error> {
  db::reply_by_id(&app_state.comments_pool, comment_id, reply_id)
    .map_err(map_db_error)?
    .ok_or_else(|| Error::NotFound(String::from("Reply does not exist")))
}

pub async fn post_comment(
  app_state: web::Data<AppState>,
  session: Session,
  body: web::Json<NewCommentForm>
) -> Result<HttpResponse, Error> {
  let user = helpers::require_user(&session)?;
  let article_title = body.article_title.trim();
  if article_title.is_empty() {
    return Err(Error::BadRequest(String::from("Missing article title")));
  }
  let text = clean_text(&body.text)?;
  check_rate_limit(&app_state)?;

  let mut comment = Comment {
    id: -1,
    article_title: article_title.to_string(),
    username: user.username,
    text,
    date: time_utils::current_timestamp(),
    removed: false,
    replies: Vec::new()
  };
  db::insert_comment(&app_state.comments_pool, &mut comment)
    .map_err(map_db_error)?;
  Ok(HttpResponse::Created().json(CommentDto::from(comment)))
}

fn insert_reply(
  app_state: &AppState,
  user: SessionUser,
  comment_id: i64,
  parent_reply_id: Option<i64>,
  text: String
) -> Result<HttpResponse, Error> {
  let mut reply = Reply {
    id: -1,
    comment_id,
    parent_reply_id,
    username: user.username,
    text,
    date: time_utils::current_timestamp(),
    removed: false
  };
  db::insert_reply(&app_state.comments_pool, &mut reply)
    .map_err(map_db_error)?;
  Ok(HttpResponse::Created().json(ReplyDto::from(reply)))
}

pub async fn post_reply(
  app_state: web::Data<AppState>,
  session: Session,
  path: web::Path<(i64,)>,
  body: web::Json<ReplyForm>
) -> Result<HttpResponse, Error> {
  let user = helpers::require_user(&session)?;
  let comment_id = path.into_inner().0;
  let text = clean_text(&body.text)?;
  existing_comment(&app_state, comment_id)?;
  check_rate_limit(&app_state)?;
  insert_reply(&app_state, user, comment_id, None, text)
}

// Replies to replies live in the same list as the
// other replies of the comment, they just point at
// the reply they answer.
pub async fn post_nested_reply(
  app_state: web::Data<AppState>,
  session: Session,
  path: web::Path<(i64, i64)>,
  body: web::Json<ReplyForm>
) -> Result<HttpResponse, Error> {
  let user = helpers::require_user(&session)?;
  let (comment_id, reply_id) = path.into_inner();
  let text = clean_text(&body.text)?;
  existing_reply(&app_state, comment_id, reply_id)?;
  check_rate_limit(&app_state)?;
  insert_reply(&app_state, user, comment_id, Some(reply_id), text)
}

// Deleting only replaces the text, the thread
// structure has to stay intact for the replies.
pub async fn delete_comment(
  app_state: web::Data<AppState>,
  session: Session,
  path: web::Path<(i64,)>
) -> Result<HttpResponse, Error> {
  let moderator = helpers::require_moderator(&session)?;
  let comment_id = path.into_inner().0;
  existing_comment(&app_state, comment_id)?;
  db::remove_comment(&app_state.comments_pool, comment_id)
    .map_err(map_db_error)?;
  info!("Moderator {} removed comment {}", moderator.username, comment_id);
  Ok(HttpResponse::Ok().json(
    JsonStatus::new_with_id(JsonStatusType::Success, "Comment removed", comment_id)
  ))
}

pub async fn delete_reply(
  app_state: web::Data<AppState>,
  session: Session,
  path: web::Path<(i64, i64)>
) -> Result<HttpResponse, Error> {
  let moderator = helpers::require_moderator(&session)?;
  let (comment_id, reply_id) = path.into_inner();
  existing_reply(&app_state, comment_id, reply_id)?;
  db::remove_reply(&app_state.comments_pool, comment_id, reply_id)
    .map_err(map_db_error)?;
  info!(
    "Moderator {} removed reply {} of comment {}",
    moderator.username, reply_id, comment_id
  );
  Ok(HttpResponse::Ok().json(
    JsonStatus::new_with_id(JsonStatusType::Success, "Reply removed", reply_id)
  ))
}

// Moderators can only black out words, anything
// that isn't a redaction of the stored text is
// refused. The removal notice stays as it is.
fn checked_redaction(original: &str, removed: bool, form: &RedactForm) -> Result<(), Error> {
  if removed {
    return Err(Error::BadRequest(
      String::from("Removed comments cannot be redacted")
    ));
  }
  if redaction::is_redaction_of(original, &form.redacted_text) {
    Ok(())
  } else {
    Err(Error::BadRequest(
      String::from("Redacted text does not match the original")
    ))
  }
}

pub async fn redact_comment(
  app_state: web::Data<AppState>,
  session: Session,
  path: web::Path<(i64,)>,
  body: web::Json<RedactForm>
) -> Result<HttpResponse, Error> {
  let moderator = helpers::require_moderator(&session)?;
  let comment_id = path.into_inner().0;
  let comment = existing_comment(&app_state, comment_id)?;
  checked_redaction(&comment.text, comment.removed, &body)?;
  db::update_comment_text(&app_state.comments_pool, comment_id, &body.redacted_text)
    .map_err(map_db_error)?;
  info!("Moderator {} redacted comment {}", moderator.username, comment_id);
  Ok(HttpResponse::Ok().json(
    JsonStatus::new_with_id(JsonStatusType::Success, "Comment redacted", comment_id)
  ))
}

pub async fn redact_reply(
  app_state: web::Data<AppState>,
  session: Session,
  path: web::Path<(i64, i64)>,
  body: web::Json<RedactForm>
) -> Result<HttpResponse, Error> {
  let moderator = helpers::require_moderator(&session)?;
  let (comment_id, reply_id) = path.into_inner();
  let reply = existing_reply(&app_state, comment_id, reply_id)?;
  checked_redaction(&reply.text, reply.removed, &body)?;
  db::update_reply_text(
    &app_state.comments_pool,
    comment_id,
    reply_id,
    &body.redacted_text
  ).map_err(map_db_error)?;
  info!(
    "Moderator {} redacted reply {} of comment {}",
    moderator.username, reply_id, comment_id
  );
  Ok(HttpResponse::Ok().json(
    JsonStatus::new_with_id(JsonStatusType::Success, "Reply redacted", reply_id)
  ))
}

// Default response when no route matched the request:
pub async fn not_found() -> Result<HttpResponse, Error> {
  Err(Error::NotFound(String::from("Endpoint doesn't exist")))
}
