use super::entities::*;
use crate::utils::i32_to_bool;
use rusqlite::{Row, Error};

pub fn map_user(row: &Row) -> Result<User, Error> {
  Ok(User {
    id: row.get(0)?,
    user_id: row.get(1)?,
    email: row.get(2)?,
    hash: row.get(3)?,
    username: row.get(4)?,
    is_moderator: i32_to_bool(row.get(5)?)
  })
}

// Replies are fetched separately.
pub fn map_comment(row: &Row) -> Result<Comment, Error> {
  Ok(Comment {
    id: row.get(0)?,
    article_title: row.get(1)?,
    username: row.get(2)?,
    text: row.get(3)?,
    date: row.get(4)?,
    removed: i32_to_bool(row.get(5)?),
    replies: Vec::new()
  })
}

pub fn map_reply(row: &Row) -> Result<Reply, Error> {
  Ok(Reply {
    id: row.get(0)?,
    comment_id: row.get(1)?,
    parent_reply_id: row.get(2)?,
    username: row.get(3)?,
    text: row.get(4)?,
    date: row.get(5)?,
    removed: i32_to_bool(row.get(6)?)
  })
}
