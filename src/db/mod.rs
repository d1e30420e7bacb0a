use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
pub mod entities;
mod mappers;
mod schema;
mod seed;
use eyre::WrapErr;
use color_eyre::Result;
use entities::*;
use mappers::{map_comment, map_reply, map_user};
pub use seed::{parse_new_user, seed_users};

// Type alias to make function signatures much clearer:
pub type Pool = r2d2::Pool<r2d2_sqlite::SqliteConnectionManager>;

/**
 * All the DB stuff is done in a non-async way,
 * SQLite is fast enough for a comment section.
 */

// Stole most of the signature from the rusqlite doc.
fn select_many<T, P, F>(
  conn: &Connection,
  query: &str,
  params: P,
  mapper: F
) -> Result<Vec<T>>
  where
    P: rusqlite::Params,
    F: FnMut(&Row<'_>) -> Result<T, rusqlite::Error>,
{
  let mut stmt = conn.prepare(query)?;
  stmt.query_map(params, mapper)
    .and_then(Iterator::collect)
    .context("Generic select_many query")
}

pub fn create_users_schema(pool: &Pool) -> Result<()> {
  let conn = pool.get()?;
  conn.execute_batch(schema::USERS_SCHEMA)
    .context("Creating users schema")
}

pub fn create_comments_schema(pool: &Pool) -> Result<()> {
  let conn = pool.get()?;
  conn.execute_batch(schema::COMMENTS_SCHEMA)
    .context("Creating comments schema")
}

/* --- Users --- */

pub fn user_count(pool: &Pool) -> Result<i64> {
  let conn = pool.get()?;
  conn.query_row("SELECT count(*) FROM users", [], |row| row.get(0))
    .context("Counting users")
}

pub fn user_by_email(pool: &Pool, email: &str) -> Result<Option<User>> {
  let conn = pool.get()?;
  conn.query_row(
    "SELECT id, user_id, email, hash, username, is_moderator \
    FROM users WHERE email = ?",
    params![email],
    map_user
  ).optional()
    .context("Fetching user by email")
}

// Sets the id of the user that was passed in.
pub fn insert_user(pool: &Pool, user: &mut User) -> Result<()> {
  let conn = pool.get()?;
  conn.execute(
    "INSERT INTO users (user_id, email, hash, username, is_moderator) \
    VALUES (?, ?, ?, ?, ?)",
    params![
      user.user_id,
      user.email,
      user.hash,
      user.username,
      crate::utils::bool_to_i32(user.is_moderator)
    ]
  ).context("Inserting user")?;
  user.id = conn.last_insert_rowid();
  Ok(())
}

/* --- Comments --- */

const COMMENT_FIELDS: &'static str =
  "id, article_title, username, text, date, removed";
const REPLY_FIELDS: &'static str =
  "id, comment_id, parent_reply_id, username, text, date, removed";

fn replies_for_comment(conn: &Connection, comment_id: i64) -> Result<Vec<Reply>> {
  select_many(
    conn,
    &format!(
      "SELECT {} FROM replies WHERE comment_id = ? ORDER BY id ASC",
      REPLY_FIELDS
    ),
    params![comment_id],
    map_reply
  )
}

// Comments come in insertion order, and so do
// the replies attached to them.
pub fn comments_for_article(pool: &Pool, article_title: &str) -> Result<Vec<Comment>> {
  let conn = pool.get()?;
  let mut comments = select_many(
    &conn,
    &format!(
      "SELECT {} FROM comments WHERE article_title = ? ORDER BY id ASC",
      COMMENT_FIELDS
    ),
    params![article_title],
    map_comment
  )?;
  for comment in comments.iter_mut() {
    comment.replies = replies_for_comment(&conn, comment.id)?;
  }
  Ok(comments)
}

pub fn comment_by_id(pool: &Pool, comment_id: i64) -> Result<Option<Comment>> {
  let conn = pool.get()?;
  let comment = conn.query_row(
    &format!("SELECT {} FROM comments WHERE id = ?", COMMENT_FIELDS),
    params![comment_id],
    map_comment
  ).optional()
    .context("Fetching comment by id")?;
  match comment {
    Some(mut c) => {
      c.replies = replies_for_comment(&conn, c.id)?;
      Ok(Some(c))
    },
    None => Ok(None)
  }
}

// Replies are always looked up through their
// comment, a reply id from another comment is
// as good as missing.
pub fn reply_by_id(
  pool: &Pool,
  comment_id: i64,
  reply_id: i64
) -> Result<Option<Reply>> {
  let conn = pool.get()?;
  conn.query_row(
    &format!(
      "SELECT {} FROM replies WHERE id = ? AND comment_id = ?",
      REPLY_FIELDS
    ),
    params![reply_id, comment_id],
    map_reply
  ).optional()
    .context("Fetching reply by id")
}

fn add_to_comment_count(
  tx: &Transaction,
  article_title: &str,
  delta: i64
) -> Result<()> {
  tx.execute(
    "INSERT INTO article_stats (article_title, comment_count) \
    VALUES (?1, max(?2, 0)) \
    ON CONFLICT(article_title) DO UPDATE SET \
    comment_count = max(comment_count + ?2, 0)",
    params![article_title, delta]
  ).context("Updating article stats")?;
  Ok(())
}

fn article_title_for_comment(tx: &Transaction, comment_id: i64) -> Result<Option<String>> {
  tx.query_row(
    "SELECT article_title FROM comments WHERE id = ?",
    params![comment_id],
    |row| row.get(0)
  ).optional()
    .context("Fetching article title of comment")
}

// Sets the id of the comment that was passed in
// and bumps the comment count of its article.
pub fn insert_comment(pool: &Pool, comment: &mut Comment) -> Result<()> {
  let mut conn = pool.get()?;
  let tx = conn.transaction()?;
  tx.execute(
    "INSERT INTO comments (article_title, username, text, date, removed) \
    VALUES (?, ?, ?, ?, 0)",
    params![
      comment.article_title,
      comment.username,
      comment.text,
      comment.date
    ]
  ).context("Inserting comment")?;
  comment.id = tx.last_insert_rowid();
  add_to_comment_count(&tx, &comment.article_title, 1)?;
  tx.commit()?;
  Ok(())
}

// Replies count towards the article comment
// count too.
pub fn insert_reply(pool: &Pool, reply: &mut Reply) -> Result<()> {
  let mut conn = pool.get()?;
  let tx = conn.transaction()?;
  let article_title = article_title_for_comment(&tx, reply.comment_id)?
    .ok_or_else(|| eyre::eyre!("Comment {} does not exist", reply.comment_id))?;
  tx.execute(
    "INSERT INTO replies \
    (comment_id, parent_reply_id, username, text, date, removed) \
    VALUES (?, ?, ?, ?, ?, 0)",
    params![
      reply.comment_id,
      reply.parent_reply_id,
      reply.username,
      reply.text,
      reply.date
    ]
  ).context("Inserting reply")?;
  reply.id = tx.last_insert_rowid();
  add_to_comment_count(&tx, &article_title, 1)?;
  tx.commit()?;
  Ok(())
}

// Returns false if there was nothing to remove
// (missing or already removed). The comment
// count only goes down once per comment.
pub fn remove_comment(pool: &Pool, comment_id: i64) -> Result<bool> {
  let mut conn = pool.get()?;
  let tx = conn.transaction()?;
  let article_title = match article_title_for_comment(&tx, comment_id)? {
    Some(t) => t,
    None => return Ok(false)
  };
  let changed = tx.execute(
    "UPDATE comments SET text = ?, removed = 1 \
    WHERE id = ? AND removed = 0",
    params![REMOVED_NOTICE, comment_id]
  ).context("Removing comment")?;
  if changed > 0 {
    add_to_comment_count(&tx, &article_title, -1)?;
  }
  tx.commit()?;
  Ok(changed > 0)
}

pub fn remove_reply(pool: &Pool, comment_id: i64, reply_id: i64) -> Result<bool> {
  let mut conn = pool.get()?;
  let tx = conn.transaction()?;
  let article_title = match article_title_for_comment(&tx, comment_id)? {
    Some(t) => t,
    None => return Ok(false)
  };
  let changed = tx.execute(
    "UPDATE replies SET text = ?, removed = 1 \
    WHERE id = ? AND comment_id = ? AND removed = 0",
    params![REMOVED_NOTICE, reply_id, comment_id]
  ).context("Removing reply")?;
  if changed > 0 {
    add_to_comment_count(&tx, &article_title, -1)?;
  }
  tx.commit()?;
  Ok(changed > 0)
}

pub fn update_comment_text(pool: &Pool, comment_id: i64, text: &str) -> Result<bool> {
  let conn = pool.get()?;
  let changed = conn.execute(
    "UPDATE comments SET text = ? WHERE id = ?",
    params![text, comment_id]
  ).context("Updating comment text")?;
  Ok(changed > 0)
}

pub fn update_reply_text(
  pool: &Pool,
  comment_id: i64,
  reply_id: i64,
  text: &str
) -> Result<bool> {
  let conn = pool.get()?;
  let changed = conn.execute(
    "UPDATE replies SET text = ? WHERE id = ? AND comment_id = ?",
    params![text, reply_id, comment_id]
  ).context("Updating reply text")?;
  Ok(changed > 0)
}

// Articles nobody commented on have no stats
// row, that's a count of 0.
pub fn comment_count(pool: &Pool, article_title: &str) -> Result<i64> {
  let conn = pool.get()?;
  let count: Option<i64> = conn.query_row(
    "SELECT comment_count FROM article_stats WHERE article_title = ?",
    params![article_title],
    |row| row.get(0)
  ).optional()
    .context("Fetching comment count")?;
  Ok(count.unwrap_or(0))
}

pub fn article_stats(pool: &Pool) -> Result<Vec<ArticleStat>> {
  let conn = pool.get()?;
  select_many(
    &conn,
    "SELECT article_title, comment_count FROM article_stats \
    ORDER BY article_title ASC",
    [],
    |row| Ok(ArticleStat {
      article_title: row.get(0)?,
      comment_count: row.get(1)?
    })
  )
}

// In-memory databases only live as long as their
// connection, hence the pool of one.
#[cfg(test)]
pub fn memory_pool() -> Pool {
  let manager = r2d2_sqlite::SqliteConnectionManager::memory();
  let pool = Pool::builder()
    .max_size(1)
    .build(manager)
    .unwrap();
  create_users_schema(&pool).unwrap();
  create_comments_schema(&pool).unwrap();
  pool
}

#[cfg(test)]
mod tests {
  use super::*;

  fn new_comment(title: &str, text: &str) -> Comment {
    Comment {
      id: -1,
      article_title: title.to_string(),
      username: "alice".to_string(),
      text: text.to_string(),
      date: 1615150740,
      removed: false,
      replies: Vec::new()
    }
  }

  fn new_reply(comment_id: i64, parent_reply_id: Option<i64>) -> Reply {
    Reply {
      id: -1,
      comment_id,
      parent_reply_id,
      username: "bob".to_string(),
      text: "Some reply".to_string(),
      date: 1615150800,
      removed: false
    }
  }

  #[test]
  fn insert_and_find_user_by_email() {
    let pool = memory_pool();
    let mut user = User {
      id: -1,
      user_id: "123".to_string(),
      email: "alice@example.com".to_string(),
      hash: "hash".to_string(),
      username: "alice".to_string(),
      is_moderator: true
    };
    insert_user(&pool, &mut user).unwrap();
    assert!(user.id > 0);
    assert_eq!(1, user_count(&pool).unwrap());
    let found = user_by_email(&pool, "alice@example.com").unwrap().unwrap();
    assert_eq!("alice", found.username);
    assert!(found.is_moderator);
    assert!(user_by_email(&pool, "nobody@example.com").unwrap().is_none());
  }

  #[test]
  fn replies_keep_insertion_order() {
    let pool = memory_pool();
    let mut comment = new_comment("Test Article", "First");
    insert_comment(&pool, &mut comment).unwrap();
    let mut r1 = new_reply(comment.id, None);
    insert_reply(&pool, &mut r1).unwrap();
    let mut r2 = new_reply(comment.id, Some(r1.id));
    insert_reply(&pool, &mut r2).unwrap();
    let mut r3 = new_reply(comment.id, None);
    insert_reply(&pool, &mut r3).unwrap();

    let comments = comments_for_article(&pool, "Test Article").unwrap();
    assert_eq!(1, comments.len());
    let ids: Vec<i64> = comments[0].replies.iter().map(|r| r.id).collect();
    assert_eq!(vec![r1.id, r2.id, r3.id], ids);
    assert_eq!(Some(r1.id), comments[0].replies[1].parent_reply_id);
  }

  #[test]
  fn counts_follow_inserts_and_removals() {
    let pool = memory_pool();
    assert_eq!(0, comment_count(&pool, "Test Article").unwrap());
    let mut comment = new_comment("Test Article", "First");
    insert_comment(&pool, &mut comment).unwrap();
    let mut reply = new_reply(comment.id, None);
    insert_reply(&pool, &mut reply).unwrap();
    assert_eq!(2, comment_count(&pool, "Test Article").unwrap());

    assert!(remove_reply(&pool, comment.id, reply.id).unwrap());
    // Removing twice doesn't count twice:
    assert!(!remove_reply(&pool, comment.id, reply.id).unwrap());
    assert_eq!(1, comment_count(&pool, "Test Article").unwrap());

    assert!(remove_comment(&pool, comment.id).unwrap());
    assert_eq!(0, comment_count(&pool, "Test Article").unwrap());
    let stored = comment_by_id(&pool, comment.id).unwrap().unwrap();
    assert!(stored.removed);
    assert_eq!(REMOVED_NOTICE, stored.text);
  }

  #[test]
  fn reply_to_missing_comment_fails() {
    let pool = memory_pool();
    let mut reply = new_reply(42, None);
    assert!(insert_reply(&pool, &mut reply).is_err());
  }

  #[test]
  fn reply_lookup_is_scoped_to_comment() {
    let pool = memory_pool();
    let mut c1 = new_comment("A", "one");
    let mut c2 = new_comment("A", "two");
    insert_comment(&pool, &mut c1).unwrap();
    insert_comment(&pool, &mut c2).unwrap();
    let mut reply = new_reply(c1.id, None);
    insert_reply(&pool, &mut reply).unwrap();
    assert!(reply_by_id(&pool, c1.id, reply.id).unwrap().is_some());
    assert!(reply_by_id(&pool, c2.id, reply.id).unwrap().is_none());
  }

  #[test]
  fn update_texts() {
    let pool = memory_pool();
    let mut comment = new_comment("A", "secret words");
    insert_comment(&pool, &mut comment).unwrap();
    assert!(update_comment_text(&pool, comment.id, "██████ words").unwrap());
    assert!(!update_comment_text(&pool, 9999, "nope").unwrap());
    let stored = comment_by_id(&pool, comment.id).unwrap().unwrap();
    assert_eq!("██████ words", stored.text);
    assert_eq!(1, article_stats(&pool).unwrap()[0].comment_count);
  }

}
