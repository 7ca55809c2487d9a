use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use gate_core::model::{GroupId, ItemId, ItemStatus};
use services::{AnswerOutcome, OpenOutcome, QuestionPrompt, UnlockError, UnlockService};
use storage::repository::Storage;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- run   [--db <sqlite_url>] [--questions <path>] [--catalog <path>]");
    eprintln!("  cargo run -p app -- reset [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db        sqlite://quizgate.sqlite3");
    eprintln!("  --questions demos/questions.json");
    eprintln!("  --catalog   demos/catalog.json");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZGATE_DB_URL, QUIZGATE_QUESTIONS, QUIZGATE_CATALOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Run,
    Reset,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "run" => Some(Self::Run),
            "reset" => Some(Self::Reset),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Args {
    db_url: String,
    questions: PathBuf,
    catalog: PathBuf,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("QUIZGATE_DB_URL")
            .ok()
            .map_or_else(|| normalize_sqlite_url("quizgate.sqlite3"), normalize_sqlite_url);
        let mut questions = std::env::var("QUIZGATE_QUESTIONS")
            .ok()
            .map_or_else(|| PathBuf::from("demos/questions.json"), PathBuf::from);
        let mut catalog = std::env::var("QUIZGATE_CATALOG")
            .ok()
            .map_or_else(|| PathBuf::from("demos/catalog.json"), PathBuf::from);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--questions" => {
                    questions = PathBuf::from(require_value(args, "--questions")?);
                }
                "--catalog" => {
                    catalog = PathBuf::from(require_value(args, "--catalog")?);
                }
                other => return Err(ArgsError::UnknownArg(other.to_string())),
            }
        }

        Ok(Self {
            db_url,
            questions,
            catalog,
        })
    }
}

/// Accepts bare file paths as well as full sqlite URLs, and asks SQLite to
/// create the database file on first run.
fn normalize_sqlite_url(raw: impl Into<String>) -> String {
    let raw = raw.into();
    let mut url = if raw.starts_with("sqlite:") {
        raw
    } else {
        format!("sqlite://{raw}")
    };
    if !url.contains('?') && !url.contains(":memory:") {
        url.push_str("?mode=rwc");
    }
    url
}

fn status_badge(status: ItemStatus) -> String {
    match status {
        ItemStatus::Unlocked => "[unlocked]".into(),
        ItemStatus::Locked => "[locked]".into(),
        ItemStatus::Pending { attempts_left } => format!("[{attempts_left} attempts left]"),
    }
}

fn prompt_line(prompt: &str) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None); // EOF
    }
    Ok(Some(line.trim().to_string()))
}

fn print_question(prompt: &QuestionPrompt) {
    println!();
    println!("{} — {} attempts left", prompt.title, prompt.attempts_left);
    println!("{}", prompt.prompt);
    for (idx, choice) in prompt.choices.iter().enumerate() {
        println!("  {}) {choice}", idx + 1);
    }
}

/// Run one quiz interaction to resolution or cancellation.
async fn run_quiz(svc: &mut UnlockService, mut prompt: QuestionPrompt) -> io::Result<()> {
    loop {
        print_question(&prompt);
        let Some(input) = prompt_line("answer (number, or c to cancel)> ")? else {
            return Ok(());
        };
        if input == "c" {
            println!("cancelled; attempts are kept for next time");
            return Ok(());
        }
        let Ok(choice) = input.parse::<usize>() else {
            println!("please enter a choice number");
            continue;
        };
        let Some(display_index) = choice.checked_sub(1) else {
            println!("please enter a choice number starting at 1");
            continue;
        };

        match svc.submit_answer(display_index).await {
            Ok(AnswerOutcome::Correct { title, body }) => {
                println!();
                println!("Correct! {title} is unlocked.");
                println!("{body}");
                return Ok(());
            }
            Ok(AnswerOutcome::IncorrectContinue {
                attempts_left,
                next,
            }) => {
                println!("Incorrect… {attempts_left} attempts remaining.");
                prompt = next;
            }
            Ok(AnswerOutcome::IncorrectLocked { message }) => {
                println!("Incorrect. {message}");
                return Ok(());
            }
            Err(err @ UnlockError::ChoiceOutOfRange { .. }) => {
                println!("{err}");
            }
            Err(err) => {
                eprintln!("error: {err}");
                return Ok(());
            }
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = services::load_catalog(&args.catalog)?;

    // a missing or invalid bank is reported once; unlocked content stays
    // viewable without it
    let pool = match services::load_question_pool(&args.questions) {
        Ok(pool) => Some(pool),
        Err(err) => {
            eprintln!("question bank unavailable: {err}");
            eprintln!("quizzes are disabled; already-unlocked items remain viewable");
            None
        }
    };

    let storage = Storage::sqlite(&args.db_url).await?;
    let mut svc = UnlockService::new(storage.ledger, catalog, pool);

    loop {
        // rebuild the listing each pass; item state may have changed
        let mut entries: Vec<(GroupId, ItemId)> = Vec::new();
        let groups: Vec<(GroupId, String)> = svc
            .catalog()
            .groups()
            .iter()
            .map(|group| (group.id.clone(), group.title.clone()))
            .collect();
        println!();
        for (group_id, group_title) in groups {
            println!("{group_title}");
            let overview = svc.group_overview(&group_id).await?;
            for row in overview {
                entries.push((group_id.clone(), row.key.item()));
                println!(
                    "  {}) {} {} — {}",
                    entries.len(),
                    row.title,
                    status_badge(row.status),
                    row.summary
                );
            }
        }

        let Some(input) = prompt_line("open (number), r = reset all, q = quit> ")? else {
            return Ok(());
        };
        match input.as_str() {
            "q" => return Ok(()),
            "r" => {
                svc.reset_all().await?;
                println!("all unlock state erased");
                continue;
            }
            _ => {}
        }
        let Some(entry) = input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| entries.get(idx))
        else {
            println!("please pick an item number, r, or q");
            continue;
        };
        let (group_id, item_id) = entry.clone();

        match svc.open_item(&group_id, &item_id).await {
            Ok(OpenOutcome::Unlocked { title, body }) => {
                println!();
                println!("{title}");
                println!("{body}");
            }
            Ok(OpenOutcome::PermanentlyLocked { title, message }) => {
                println!();
                println!("{title}: {message}");
            }
            Ok(OpenOutcome::Question(prompt)) => run_quiz(&mut svc, prompt).await?,
            Err(UnlockError::QuizUnavailable) => {
                println!("this item needs a quiz, but no question bank is loaded");
            }
            Err(err) => eprintln!("error: {err}"),
        }
    }
}

async fn reset(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let storage = Storage::sqlite(&args.db_url).await?;
    storage.ledger.reset().await?;
    println!("all unlock state erased");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();

    let mut raw_args = std::env::args().skip(1);
    let command = match raw_args.next().as_deref().and_then(Command::from_arg) {
        Some(command) => command,
        None => {
            print_usage();
            return Err("expected a command: run or reset".into());
        }
    };
    let args = match Args::parse(&mut raw_args) {
        Ok(args) => args,
        Err(err) => {
            print_usage();
            return Err(err.into());
        }
    };

    match command {
        Command::Run => run(args).await,
        Command::Reset => reset(args).await,
    }
}
