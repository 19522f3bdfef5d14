use std::fmt;
use std::io::BufRead;
use std::sync::Arc;

use exam_core::Clock;
use exam_core::model::{ExamSettings, SubjectId};
use exam_core::timer::format_remaining;
use services::{AppServices, ExamInput, ExamOutcome, SessionCommand, run_exam};
use storage::repository::QuestionBank;
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt as log_fmt, prelude::*};

mod seed;
mod terminal;

use terminal::{TerminalEnvironment, TerminalHost};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidSubjectId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidMinutes { raw: String },
    InvalidLimit { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidSubjectId { raw } => write!(f, "invalid --subject value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidMinutes { raw } => write!(f, "invalid --minutes value: {raw}"),
            ArgsError::InvalidLimit { raw } => write!(f, "invalid --limit value: {raw}"),
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Take,
    Seed,
    Results,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "take" => Some(Self::Take),
            "seed" => Some(Self::Seed),
            "results" => Some(Self::Results),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    subject_id: SubjectId,
    /// Exam duration written by `seed`; 0 seeds an untimed exam.
    minutes: u32,
    limit: u32,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- take    [--db <sqlite_url>] [--subject <id>]");
    eprintln!("  cargo run -p app -- seed    [--db <sqlite_url>] [--subject <id>] [--minutes <n>]");
    eprintln!("  cargo run -p app -- results [--db <sqlite_url>] [--subject <id>] [--limit <n>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://exam.sqlite3");
    eprintln!("  --subject 1");
    eprintln!("  --minutes 10");
    eprintln!("  --limit 10");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_DB_URL, EXAM_SUBJECT_ID, RUST_LOG");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("EXAM_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://exam.sqlite3".into(), normalize_sqlite_url);
        let mut subject_id = std::env::var("EXAM_SUBJECT_ID")
            .ok()
            .and_then(|value| value.parse::<SubjectId>().ok())
            .unwrap_or_else(|| SubjectId::new(1));
        let mut minutes = 10;
        let mut limit = 10;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--subject" => {
                    let value = require_value(args, "--subject")?;
                    subject_id = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidSubjectId { raw: value.clone() })?;
                }
                "--minutes" => {
                    let value = require_value(args, "--minutes")?;
                    minutes = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidMinutes { raw: value.clone() })?;
                }
                "--limit" => {
                    let value = require_value(args, "--limit")?;
                    limit = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidLimit { raw: value.clone() })?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            subject_id,
            minutes,
            limit,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1).peekable();

    let first = argv.peek().cloned();
    let cmd = match first.as_deref() {
        None => Command::Take,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Take,
        Some(first) => {
            let cmd = Command::from_arg(first).ok_or_else(|| {
                eprintln!("unknown subcommand: {first}");
                print_usage();
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
            })?;
            argv.next();
            cmd
        }
    };

    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services =
        AppServices::new_sqlite(&parsed.db_url, Clock::default_clock(), ExamSettings::default())
            .await?;

    match cmd {
        Command::Seed => seed_exam(&services, &parsed).await,
        Command::Results => list_results(&services, &parsed).await,
        Command::Take => take_exam(&services, &parsed).await,
    }
}

async fn seed_exam(services: &AppServices, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let minutes = (args.minutes > 0).then_some(args.minutes);
    let exam = seed::sample_exam(args.subject_id, minutes)?;
    services.questions().upsert_exam(&exam).await?;
    println!(
        "Seeded \"{}\" ({} questions) for subject {} into {}",
        exam.name(),
        exam.total_questions(),
        args.subject_id,
        args.db_url
    );
    Ok(())
}

async fn list_results(
    services: &AppServices,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let items = services
        .result_history()
        .list_recent(args.subject_id, args.limit)
        .await?;
    if items.is_empty() {
        println!("No results for subject {} yet.", args.subject_id);
        return Ok(());
    }
    for item in items {
        println!(
            "#{:<4} {}  {:>3}%  {}/{}  {}  violations: {}",
            item.id,
            item.completed_at.format("%Y-%m-%d %H:%M"),
            item.score,
            item.correct_count,
            item.total_questions,
            format_remaining(item.time_taken_secs),
            item.integrity_violation_count
        );
    }
    Ok(())
}

async fn take_exam(services: &AppServices, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let exam_loop = services.exam_loop();
    let controller = exam_loop
        .new_controller(
            args.subject_id,
            Box::new(TerminalEnvironment::default()),
            Arc::new(TerminalHost::default()),
        )
        .await?;

    terminal::print_exam(controller.session().exam());
    terminal::print_help();
    println!();
    println!("Type `start` to begin.");

    let (tx, rx) = mpsc::channel::<ExamInput>(32);
    tx.send(SessionCommand::RequestStart.into()).await?;
    // Blocking reads on a plain thread; the runtime does not wait for it at exit.
    std::thread::spawn(move || read_stdin(&tx));

    match run_exam(controller, rx).await? {
        ExamOutcome::Completed { result_id, result } => {
            println!();
            println!(
                "Score: {}% ({}/{} correct) in {}",
                result.score(),
                result.correct_count(),
                result.total_questions(),
                format_remaining(result.time_taken_secs())
            );
            if result.integrity_violation_count() > 0 {
                println!(
                    "Integrity events recorded: {}",
                    result.integrity_violation_count()
                );
            }
            println!("Saved as result #{result_id}.");
        }
        ExamOutcome::Discarded => println!("Exam left without submitting."),
    }
    Ok(())
}

fn read_stdin(tx: &mpsc::Sender<ExamInput>) {
    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                tracing::warn!("stdin closed: {err}");
                break;
            }
        };
        if line.trim() == "help" {
            terminal::print_help();
            continue;
        }
        match terminal::parse_line(&line) {
            Ok(inputs) => {
                for input in inputs {
                    if tx.blocking_send(input).is_err() {
                        return;
                    }
                }
            }
            Err(msg) => eprintln!("{msg}"),
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(log_fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
