use eyre::{eyre, WrapErr};
use color_eyre::Result;
use super::entities::User;
use super::{insert_user, user_count, Pool};

// Provisioned by the first deployment, password
// is only known to whoever made the hash.
pub const SEED_EMAIL: &'static str = "alice@example.com";
pub const SEED_USERNAME: &'static str = "alice";
pub const SEED_USER_ID: &'static str = "123";
pub const SEED_HASH: &'static str =
  "$2a$10$CwTycUXWue0Thq9StjUM0uJ8DPLKXt1FYlwYpQW2G3cAwjKoh2WZK";

/**
 * Inserts the static alice record when the users
 * table is empty. Returns true if it did insert.
 */
pub fn seed_users(pool: &Pool) -> Result<bool> {
  if user_count(pool)? > 0 {
    return Ok(false);
  }
  let mut seed = User {
    id: -1,
    user_id: SEED_USER_ID.to_string(),
    email: SEED_EMAIL.to_string(),
    hash: SEED_HASH.to_string(),
    username: SEED_USERNAME.to_string(),
    is_moderator: false
  };
  insert_user(pool, &mut seed)?;
  Ok(true)
}

// Parses "email:username:password". The password
// is the last part so that it can contain colons.
pub fn parse_new_user(arg: &str, is_moderator: bool, cost: u32) -> Result<User> {
  let mut parts = arg.splitn(3, ':');
  let (email, username, password) = match (parts.next(), parts.next(), parts.next()) {
    (Some(e), Some(u), Some(p)) if !e.is_empty() && !u.is_empty() && !p.is_empty() =>
      (e, u, p),
    _ => return Err(eyre!("Expected email:username:password, got {}", arg))
  };
  let hash = bcrypt::hash(password, cost)
    .context("Hashing password")?;
  Ok(User {
    id: -1,
    user_id: email.to_string(),
    email: email.to_string(),
    hash,
    username: username.to_string(),
    is_moderator
  })
}
