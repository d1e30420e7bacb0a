use std::env;
use std::io::{self, BufRead, Write};
use color_eyre::Result;
use eyre::{eyre, WrapErr};
use dotenv::dotenv;
use getopts::Options;
use log::info;
use newsroom::app::dtos::CommentDto;
use newsroom::config::ReaderConfig;
use newsroom::reader::articles::ArticleCard;
use newsroom::reader::render::{HtmlRenderer, HtmlUi};
use newsroom::reader::ui::{Profile, TextStyle, TextTarget};
use newsroom::reader::{HttpReaderApi, ReaderApi, ReaderController, ScrollMetrics, Ui};

// A terminal is always scrolled to the bottom.
const AT_BOTTOM: ScrollMetrics = ScrollMetrics {
  scroll_top: 0.0,
  viewport_height: 0.0,
  document_height: 0.0
};

const COMMANDS: &'static str = "Commands:
    articles
    profile
    comments TITLE
    comment TITLE TEXT
    reply TITLE COMMENT_ID TEXT
    nested-reply TITLE COMMENT_ID REPLY_ID TEXT
    delete TITLE COMMENT_ID
    delete-reply TITLE COMMENT_ID REPLY_ID
    redact TITLE COMMENT_ID EDITED_TEXT
    redact-reply TITLE COMMENT_ID REPLY_ID EDITED_TEXT
";

// Copy pasted this from getopts doc.
fn print_usage(program: &str, opts: Options) {
  let brief = format!("Usage: {} [options] COMMAND [ARGS]", program);
  print!("{}\n{}", opts.usage(&brief), COMMANDS);
}

struct TerminalUi {
  assume_yes: bool
}

impl Ui for TerminalUi {

  fn alert(&self, message: &str) {
    eprintln!("! {}", message);
  }

  fn confirm(&self, message: &str) -> bool {
    if self.assume_yes {
      return true;
    }
    print!("{} [y/N] ", message);
    if io::stdout().flush().is_err() {
      return false;
    }
    let mut answer = String::new();
    match io::stdin().lock().read_line(&mut answer) {
      Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes"),
      Err(_) => false
    }
  }

  fn navigate(&self, path: &str) {
    println!("-> {} (use --email and --password)", path);
  }

  fn render_articles(&self, cards: &[ArticleCard], _clear: bool) {
    for card in cards {
      println!("{}", card.title);
      println!("  {} | {} comments", card.read_time, card.comment_count);
      if !card.description.is_empty() {
        println!("  {}", card.description);
      }
    }
  }

  fn render_comments(&self, article_title: &str, comments: &[CommentDto], moderator: bool) {
    println!(
      "Comments on \"{}\"{}",
      article_title,
      if moderator { " (moderating)" } else { "" }
    );
    if comments.is_empty() {
      println!("  No comments yet");
    }
    for c in comments {
      println!("  #{} {}: {}", c.id, c.username, c.text);
      for r in c.replies.iter() {
        let indent = if r.parent_reply_id.is_some() { "        " } else { "      " };
        println!("{}#{} {}: {}", indent, r.id, r.username, r.text);
      }
    }
  }

  fn set_comment_count(&self, count: i64) {
    println!("({})", count);
  }

  fn update_comment_text(&self, target: TextTarget, text: &str, style: TextStyle) {
    let label = match target {
      TextTarget::Comment(id) => format!("#{}", id),
      TextTarget::Reply { comment_id, reply_id } => format!("#{}/#{}", comment_id, reply_id)
    };
    match style {
      TextStyle::Plain => println!("{} unchanged: {}", label, text),
      TextStyle::Removed => println!("{} removed", label),
      TextStyle::Redacted => println!("{} redacted: {}", label, text)
    }
  }

  fn show_profile(&self, profile: &Profile) {
    println!(
      "Signed in as {}{} <{}>",
      profile.username,
      if profile.is_moderator { " (Moderator)" } else { "" },
      profile.email
    );
  }

}

fn arg<'a>(args: &'a [String], index: usize, name: &str) -> Result<&'a str> {
  args.get(index)
    .map(String::as_str)
    .ok_or_else(|| eyre!("Missing {} argument", name))
}

fn id_arg(args: &[String], index: usize, name: &str) -> Result<i64> {
  arg(args, index, name)?
    .parse::<i64>()
    .context(format!("{} has to be a number", name))
}

async fn run_command<A: ReaderApi, U: Ui>(
  controller: &ReaderController<A, U>,
  args: &[String],
  pages: u32
) -> Result<()> {
  let command = arg(args, 0, "COMMAND")?;
  // Every comment command works on the sidebar of
  // one article, which has to be opened first.
  if command != "articles" && command != "profile" {
    controller.open_comments(arg(args, 1, "TITLE")?, 0).await;
  }
  match command {
    "articles" => {
      controller.fetch_page(0).await;
      for _ in 1..pages {
        controller.on_scroll(AT_BOTTOM).await;
      }
    },
    "profile" => controller.open_profile().await,
    "comments" => (),
    "comment" => controller.submit_comment(arg(args, 2, "TEXT")?).await,
    "reply" => controller.submit_reply(
      id_arg(args, 2, "COMMENT_ID")?,
      arg(args, 3, "TEXT")?
    ).await,
    "nested-reply" => controller.submit_nested_reply(
      id_arg(args, 2, "COMMENT_ID")?,
      id_arg(args, 3, "REPLY_ID")?,
      arg(args, 4, "TEXT")?
    ).await,
    "delete" => controller.delete_comment(id_arg(args, 2, "COMMENT_ID")?).await,
    "delete-reply" => controller.delete_reply(
      id_arg(args, 2, "COMMENT_ID")?,
      id_arg(args, 3, "REPLY_ID")?
    ).await,
    "redact" => {
      controller.redact_comment(
        id_arg(args, 2, "COMMENT_ID")?,
        arg(args, 3, "EDITED_TEXT")?
      ).await;
    },
    "redact-reply" => {
      controller.redact_reply(
        id_arg(args, 2, "COMMENT_ID")?,
        id_arg(args, 3, "REPLY_ID")?,
        arg(args, 4, "EDITED_TEXT")?
      ).await;
    },
    other => return Err(eyre!("Unknown command {}", other))
  }
  Ok(())
}

async fn start<U: Ui>(
  api: HttpReaderApi,
  ui: U,
  config: &ReaderConfig,
  login: Option<(String, String)>,
  args: &[String],
  pages: u32
) -> Result<ReaderController<HttpReaderApi, U>> {
  let controller = ReaderController::new(api, ui, config.max_pages);
  if let Some((email, password)) = login {
    controller.api().login(&email, &password).await
      .map_err(|e| eyre!("Login failed - {}", e))?;
    info!("Logged in as {}", email);
  }
  controller.refresh_session().await;
  run_command(&controller, args, pages).await?;
  Ok(controller)
}

#[tokio::main]
async fn main() -> Result<()> {
  dotenv().ok();
  if env::var("RUST_LOG").is_err() {
    env::set_var("RUST_LOG", "warn");
  }
  env_logger::init();
  color_eyre::install()?;

  let args: Vec<String> = env::args().collect();
  let program = args[0].clone();
  let mut opts = Options::new();
  opts.optopt("e", "email", "Log in with this email", "EMAIL");
  opts.optopt("p", "password", "Password to log in with", "PASSWORD");
  opts.optopt("n", "pages", "How many article pages to load", "PAGES");
  opts.optopt("t", "templates", "Template directory for --html", "DIR");
  opts.optflag("", "html", "Print rendered HTML instead of text");
  opts.optflag("y", "yes", "Answer yes to confirmations");
  opts.optflag("h", "help", "Program usage");
  let opt_matches = opts.parse(&args[1..])?;
  if opt_matches.opt_present("h") || opt_matches.free.is_empty() {
    print_usage(&program, opts);
    return Ok(());
  }

  let config = ReaderConfig::from_env()?;
  let pages: u32 = match opt_matches.opt_str("n") {
    Some(n) => n.parse().context("PAGES has to be a number")?,
    None => config.max_pages
  };
  let login = match (opt_matches.opt_str("e"), opt_matches.opt_str("p")) {
    (Some(email), Some(password)) => Some((email, password)),
    (None, None) => None,
    _ => return Err(eyre!("Logging in needs both --email and --password"))
  };
  let api = HttpReaderApi::new(&config)?;
  let assume_yes = opt_matches.opt_present("y");

  if opt_matches.opt_present("html") {
    let template_dir = opt_matches.opt_str("t")
      .unwrap_or_else(|| String::from("./templates"));
    let ui = HtmlUi::new(HtmlRenderer::new(&template_dir)?, assume_yes);
    let controller = start(api, ui, &config, login, &opt_matches.free, pages).await?;
    let page = controller.ui().page();
    for alert in page.alerts.iter() {
      eprintln!("! {}", alert);
    }
    if let Some(location) = page.location {
      eprintln!("-> {}", location);
    }
    println!("{}{}", page.grid, page.thread);
  } else {
    let ui = TerminalUi { assume_yes };
    start(api, ui, &config, login, &opt_matches.free, pages).await?;
  }

  Ok(())
}
