use std::env;
use color_eyre::Result;
use eyre::eyre;
use dotenv::dotenv;
use log::info;
use getopts::Options;
use newsroom::app::open_pool;
use newsroom::config::Config;
use newsroom::db;

// Copy pasted this from getopts doc.
fn print_usage(program: &str, opts: Options) {
  let brief = format!("Usage: {} [options]", program);
  print!("{}", opts.usage(&brief));
}

/**
 * Creates both databases, inserts the seed user
 * when the users table is empty.
 */
fn main() -> Result<()> {
  dotenv().ok();
  if env::var("RUST_LOG").is_err() {
    env::set_var("RUST_LOG", "info");
  }
  env_logger::init();
  color_eyre::install()?;

  let args: Vec<String> = env::args().collect();
  let program = args[0].clone();
  let mut opts = Options::new();
  opts.optopt("a", "add-user", "Add a user", "EMAIL:USERNAME:PASSWORD");
  opts.optflag("m", "moderator", "Added user is a moderator");
  opts.optflag("s", "stats", "Print comment counts per article");
  opts.optflag("h", "help", "Program usage");
  let opt_matches = opts.parse(&args[1..])?;
  if opt_matches.opt_present("h") {
    print_usage(&program, opts);
    return Ok(());
  }

  let config = Config::from_env()?;

  let users_pool = open_pool(&config.users_db_path)?;
  db::create_users_schema(&users_pool)?;
  if db::seed_users(&users_pool)? {
    info!("Inserted seed user");
  } else {
    info!("Users table is not empty, skipping seed user");
  }

  let comments_pool = open_pool(&config.comments_db_path)?;
  db::create_comments_schema(&comments_pool)?;
  info!("Comments database ready at {}", config.comments_db_path);

  if let Some(arg) = opt_matches.opt_str("a") {
    let mut user = db::parse_new_user(
      &arg,
      opt_matches.opt_present("m"),
      bcrypt::DEFAULT_COST
    )?;
    if db::user_by_email(&users_pool, &user.email)?.is_some() {
      return Err(eyre!("A user with email {} already exists", user.email));
    }
    db::insert_user(&users_pool, &mut user)?;
    info!(
      "Added user {} ({}){}",
      user.username,
      user.email,
      if user.is_moderator { " as moderator" } else { "" }
    );
  }

  if opt_matches.opt_present("s") {
    for stat in db::article_stats(&comments_pool)? {
      println!("{}\t{}", stat.comment_count, stat.article_title);
    }
  }

  Ok(())
}
