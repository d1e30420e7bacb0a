use actix_session::Session;
use log::{error, warn};
use serde::{Deserialize, Serialize};
use crate::db::entities::User;
use super::error::Error;

// Key under which the signed-in user lives in
// the session cookie.
const SESSION_USER_KEY: &'static str = "user";

// What we keep in the (private) session cookie.
// Small on purpose, cookies max out around 4 KB.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SessionUser {
  pub user_id: String,
  pub username: String,
  pub email: String,
  pub is_moderator: bool
}

impl From<User> for SessionUser {
  fn from(user: User) -> Self {
    Self {
      user_id: user.user_id,
      username: user.username,
      email: user.email,
      is_moderator: user.is_moderator
    }
  }
}

// A session cookie we can't read is treated as no
// session at all, but it's worth a warning.
pub fn session_user(session: &Session) -> Option<SessionUser> {
  match session.get::<SessionUser>(SESSION_USER_KEY) {
    Ok(user) => user,
    Err(e) => {
      warn!("Could not read user from session - {}", e);
      None
    }
  }
}

pub fn store_session_user(session: &Session, user: SessionUser) -> Result<(), Error> {
  session.renew();
  session.insert(SESSION_USER_KEY, user)
    .map_err(|e| {
      error!("Could not write user to session - {}", e);
      Error::InternalServerError(e.to_string())
    })
}

pub fn require_user(session: &Session) -> Result<SessionUser, Error> {
  session_user(session)
    .ok_or_else(|| Error::Unauthorized(String::from("Please log in first")))
}

pub fn require_moderator(session: &Session) -> Result<SessionUser, Error> {
  let user = require_user(session)?;
  if user.is_moderator {
    Ok(user)
  } else {
    warn!("User {} attempted a moderator-only action", user.username);
    Err(Error::Forbidden(String::from("Only moderators can do this")))
  }
}

// Checked with bcrypt, a broken hash in the
// database counts as a wrong password.
pub fn verify_password(password: &str, hash: &str) -> bool {
  match bcrypt::verify(password, hash) {
    Ok(valid) => valid,
    Err(e) => {
      error!("Could not verify password hash - {}", e);
      false
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn verify_bcrypt_password() {
    let hash = bcrypt::hash("hunter2", 4).unwrap();
    assert!(verify_password("hunter2", &hash));
    assert!(!verify_password("hunter3", &hash));
  }

  #[test]
  fn invalid_hash_is_wrong_password() {
    assert!(!verify_password("hunter2", "not a hash"));
  }
}
