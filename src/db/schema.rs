// Both databases are created by the init-db
// binary, the server also runs these on startup
// since they're all "IF NOT EXISTS".

pub const USERS_SCHEMA: &'static str = "
  CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    hash TEXT NOT NULL,
    username TEXT NOT NULL UNIQUE,
    is_moderator INTEGER NOT NULL DEFAULT 0
  );
";

pub const COMMENTS_SCHEMA: &'static str = "
  CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    article_title TEXT NOT NULL,
    username TEXT NOT NULL,
    text TEXT NOT NULL,
    date INTEGER NOT NULL,
    removed INTEGER NOT NULL DEFAULT 0
  );
  CREATE INDEX IF NOT EXISTS comments_article_title
    ON comments (article_title);
  CREATE TABLE IF NOT EXISTS replies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    comment_id INTEGER NOT NULL,
    parent_reply_id INTEGER,
    username TEXT NOT NULL,
    text TEXT NOT NULL,
    date INTEGER NOT NULL,
    removed INTEGER NOT NULL DEFAULT 0
  );
  CREATE INDEX IF NOT EXISTS replies_comment_id
    ON replies (comment_id);
  CREATE TABLE IF NOT EXISTS article_stats (
    article_title TEXT PRIMARY KEY,
    comment_count INTEGER NOT NULL DEFAULT 0
  );
";
