use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use quiz_core::Clock;
use quiz_core::model::QuestionDraft;
use services::AppServices;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "quiz", version, about = "Open and prepare the local quiz store")]
struct Cli {
    /// SQLite database URL or path
    #[arg(long, env = "QUIZ_DB_URL", default_value = "sqlite://quiz.sqlite3", global = true)]
    db: String,

    /// Default log filter, overridden by RUST_LOG
    #[arg(long, env = "QUIZ_LOG", default_value = "info", global = true)]
    log: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    /// Create the store if needed and print its status
    Init,
    /// Add demo questions when the store has none
    Seed,
}

const DEMO_QUESTIONS: [(&str, [&str; 4], &str); 3] = [
    (
        "Which planet is closest to the sun?",
        ["Venus", "Mercury", "Mars", "Earth"],
        "Mercury",
    ),
    ("How many sides does a hexagon have?", ["5", "6", "7", "8"], "6"),
    (
        "What is the chemical symbol for gold?",
        ["Ag", "Gd", "Au", "Go"],
        "Au",
    ),
];

fn normalize_sqlite_url(raw: &str) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") || raw.contains("mode=memory") {
        return raw.to_owned();
    }

    let trimmed = raw.trim();
    let path = Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_dir(db_url: &str) -> std::io::Result<()> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .ok()
        .or_else(|| EnvFilter::try_new(default_directive).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn open_services(db_url: &str, clock: Clock) -> AppServices {
    if let Err(err) = prepare_sqlite_dir(db_url) {
        tracing::warn!(error = %err, "could not create database directory");
    }
    match AppServices::new_sqlite(db_url, clock).await {
        Ok(services) => services,
        Err(err) => {
            tracing::error!(error = %err, db = db_url, "store initialization failed");
            AppServices::degraded(err.to_string(), clock)
        }
    }
}

async fn print_status(
    services: &AppServices,
    db_url: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let questions = services.questions().count_questions().await?;
    let users = services.users().list_regular_users().await?.len();
    let answered = services.reports().users_with_responses().await?.len();
    println!("store:     {db_url}");
    println!("questions: {questions}");
    println!("users:     {users} ({answered} with responses)");
    Ok(())
}

async fn seed_demo_questions(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let questions = services.questions();
    if questions.count_questions().await? > 0 {
        println!("seed: store already has questions, nothing to do");
        return Ok(());
    }
    for (text, options, answer) in DEMO_QUESTIONS {
        questions
            .create_question(QuestionDraft::new(text, options, answer))
            .await?;
    }
    println!("seed: added {} questions", DEMO_QUESTIONS.len());
    Ok(())
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db_url = normalize_sqlite_url(&cli.db);
    let services = open_services(&db_url, Clock::default_clock()).await;

    match cli.command.unwrap_or(Command::Init) {
        Command::Init => print_status(&services, &db_url).await,
        Command::Seed => seed_demo_questions(&services).await,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use storage::repository::Storage;

    #[test]
    fn relative_paths_become_absolute_urls() {
        let url = normalize_sqlite_url("sqlite:data/quiz.sqlite3");
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/quiz.sqlite3"));
    }

    #[test]
    fn memory_and_absolute_urls_pass_through() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:///tmp/quiz.sqlite3"),
            "sqlite:///tmp/quiz.sqlite3"
        );
        let shared = "sqlite:file:quiz?mode=memory&cache=shared";
        assert_eq!(normalize_sqlite_url(shared), shared);
    }

    #[test]
    fn subcommand_defaults_to_init() {
        let cli = Cli::try_parse_from(["quiz", "--db", "sqlite::memory:"]).unwrap();
        assert!(cli.command.is_none());
        let cli = Cli::try_parse_from(["quiz", "seed"]).unwrap();
        assert_eq!(cli.command, Some(Command::Seed));
    }

    #[tokio::test]
    async fn seeding_is_skipped_when_questions_exist() {
        let services = AppServices::new(Storage::in_memory(), Clock::default_clock());
        seed_demo_questions(&services).await.unwrap();
        seed_demo_questions(&services).await.unwrap();
        assert_eq!(
            services.questions().count_questions().await.unwrap(),
            DEMO_QUESTIONS.len() as u64
        );
    }
}
