use std::fmt;
use std::time::Instant;

use kana_core::model::{
    AppSettingsPatch, Category, EmojiScript, FontSize, PhraseCategory, QuizMode,
};
use services::{AppServices, Clock, CompletionReason, QuizEvent, QuizLoopService};
use tokio::io::{AsyncBufReadExt, BufReader};

const DEFAULT_DB_URL: &str = "sqlite://kana.sqlite3";
const DEFAULT_COUNT: usize = 10;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidValue { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidValue { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
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

fn parse_flag<T: std::str::FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, ArgsError> {
    let raw = require_value(args, flag)?;
    raw.parse().map_err(|_| ArgsError::InvalidValue { flag, raw })
}

fn parse_switch(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<bool, ArgsError> {
    let raw = require_value(args, flag)?;
    match raw.as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        _ => Err(ArgsError::InvalidValue { flag, raw }),
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  kana-quiz quiz     [--db <sqlite_url>] [--mode <mode>] [--category <category>]");
    eprintln!("                     [--count <n>] [--emoji <script>] [--seed <n>]");
    eprintln!("  kana-quiz progress [--db <sqlite_url>]");
    eprintln!("  kana-quiz reset    [--db <sqlite_url>]");
    eprintln!("  kana-quiz settings [--db <sqlite_url>] [--audio on|off] [--dark-mode on|off]");
    eprintln!("                     [--toggle-dark-mode] [--font-size small|medium|large]");
    eprintln!("  kana-quiz phrases  [--category <topic>]");
    eprintln!();
    eprintln!("Modes: recognition, production, typing, speed, mixed");
    eprintln!("Categories: basic, dakuten, handakuten, combinations");
    eprintln!("Emoji scripts: japanese, hiragana, romaji");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!("  --mode recognition --count {DEFAULT_COUNT}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  KANA_DB_URL, KANA_MODE, KANA_COUNT, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quiz,
    Progress,
    Reset,
    Settings,
    Phrases,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "quiz" => Some(Self::Quiz),
            "progress" => Some(Self::Progress),
            "reset" => Some(Self::Reset),
            "settings" => Some(Self::Settings),
            "phrases" => Some(Self::Phrases),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    mode: QuizMode,
    category: Option<Category>,
    count: usize,
    emoji: Option<EmojiScript>,
    seed: Option<u64>,
    settings: AppSettingsPatch,
    toggle_dark_mode: bool,
    phrase_category: Option<PhraseCategory>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("KANA_DB_URL")
                .ok()
                .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url),
            mode: std::env::var("KANA_MODE")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(QuizMode::Recognition),
            category: None,
            count: std::env::var("KANA_COUNT")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(DEFAULT_COUNT),
            emoji: None,
            seed: None,
            settings: AppSettingsPatch::new(),
            toggle_dark_mode: false,
            phrase_category: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--mode" => parsed.mode = parse_flag(args, "--mode")?,
                "--category" => {
                    let raw = require_value(args, "--category")?;
                    if let Ok(category) = raw.parse::<Category>() {
                        parsed.category = Some(category);
                    } else if let Some(topic) = parse_phrase_category(&raw) {
                        parsed.phrase_category = Some(topic);
                    } else {
                        return Err(ArgsError::InvalidValue {
                            flag: "--category",
                            raw,
                        });
                    }
                }
                "--count" => parsed.count = parse_flag(args, "--count")?,
                "--emoji" => parsed.emoji = Some(parse_flag(args, "--emoji")?),
                "--seed" => parsed.seed = Some(parse_flag(args, "--seed")?),
                "--audio" => parsed.settings.audio_enabled = Some(parse_switch(args, "--audio")?),
                "--dark-mode" => {
                    parsed.settings.dark_mode = Some(parse_switch(args, "--dark-mode")?);
                }
                "--toggle-dark-mode" => parsed.toggle_dark_mode = true,
                "--font-size" => {
                    let raw = require_value(args, "--font-size")?;
                    parsed.settings.font_size = Some(match raw.as_str() {
                        "small" => FontSize::Small,
                        "medium" => FontSize::Medium,
                        "large" => FontSize::Large,
                        _ => {
                            return Err(ArgsError::InvalidValue {
                                flag: "--font-size",
                                raw,
                            });
                        }
                    });
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }
}

fn parse_phrase_category(raw: &str) -> Option<PhraseCategory> {
    PhraseCategory::ALL
        .into_iter()
        .find(|topic| topic.as_str() == raw.trim())
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

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand starts a quiz.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Quiz,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Quiz,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    if cmd == Command::Phrases {
        let services = AppServices::in_memory(Clock::default_clock())?;
        print_phrases(&services, parsed.phrase_category);
        return Ok(());
    }

    // Open + migrate SQLite here so the library crates never touch the filesystem.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, Clock::default_clock()).await?;

    match cmd {
        Command::Quiz => run_quiz(&services, &parsed).await,
        Command::Progress => {
            print_progress(&services.quiz_loop().await);
            Ok(())
        }
        Command::Reset => {
            services.quiz_loop().await.reset_progress().await;
            println!("Progress cleared.");
            Ok(())
        }
        Command::Settings => {
            let app_settings = services.app_settings();
            let mut settings = app_settings.update(&parsed.settings).await?;
            if parsed.toggle_dark_mode {
                settings = app_settings.toggle_dark_mode().await?;
            }
            println!("audio:     {}", on_off(settings.audio_enabled()));
            println!("dark mode: {}", on_off(settings.dark_mode()));
            println!("font size: {:?}", settings.font_size());
            Ok(())
        }
        Command::Phrases => Ok(()),
    }
}

async fn run_quiz(services: &AppServices, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut quiz = services.quiz_loop().await.with_auto_advance(false);
    if let Some(seed) = args.seed {
        quiz = quiz.with_seed(seed);
    }
    match args.emoji {
        Some(script) => quiz.generate_emoji_session(script, args.count)?,
        None => quiz.generate_session(args.mode, args.category, args.count)?,
    };

    println!("Answer with the option number or the text itself. Enter q to stop.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut last_input = Instant::now();

    loop {
        let Some(snapshot) = quiz.snapshot() else {
            break;
        };
        if let Some(done) = snapshot.final_score {
            if done.reason == CompletionReason::TimeUp {
                println!("Time's up!");
            }
            println!("Final score: {}/{}", done.score, done.total);
            break;
        }

        let Some(prompt) = snapshot.prompt.as_deref() else {
            break;
        };
        println!();
        match snapshot.time_left {
            Some(left) => println!(
                "[{}/{}] {prompt}   ({left}s left)",
                snapshot.index + 1,
                snapshot.progress.total
            ),
            None => println!("[{}/{}] {prompt}", snapshot.index + 1, snapshot.progress.total),
        }
        for (n, option) in snapshot.options.iter().enumerate() {
            println!("  {}. {option}", n + 1);
        }

        let Some(line) = lines.next_line().await? else {
            quiz.end_session();
            break;
        };
        let waited = u64::try_from(last_input.elapsed().as_millis()).unwrap_or(u64::MAX);
        last_input = Instant::now();
        if fire_timers(&mut quiz, waited) {
            continue;
        }

        let line = line.trim();
        if line.eq_ignore_ascii_case("q") {
            if let Some(score) = quiz.end_session() {
                println!("Stopped at {}/{}", score.score, score.total);
            }
            break;
        }

        let answer = line
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| snapshot.options.get(i))
            .map_or(line, String::as_str);
        let result = quiz.submit_answer(answer).await?;
        if result.record.correct {
            println!("Correct!");
        } else {
            println!("Wrong, the answer was {}", result.record.expected);
        }
        quiz.advance()?;
    }

    Ok(())
}

/// Feed real elapsed time to the quiz timers; true when that ended the quiz.
fn fire_timers(quiz: &mut QuizLoopService, elapsed_ms: u64) -> bool {
    quiz.elapse(elapsed_ms)
        .into_iter()
        .any(|event| matches!(event, QuizEvent::Completed(_)))
}

fn print_progress(quiz: &QuizLoopService) {
    let progress = quiz.progress_snapshot();
    println!(
        "Mastered {}/{} characters ({:.0}%)",
        progress.mastered, progress.total_characters, progress.overall_percent
    );
    println!("Answers recorded: {}", progress.total_answers);
    println!(
        "Recent success: {:.0}% over the last {} answers",
        progress.recent_success_percent,
        progress.recent.len()
    );
    println!("Streak: {} day(s)", progress.streak);
    println!("Practice time: {}s", progress.time_spent_ms / 1_000);
    for (kind, ms) in &progress.time_by_kind {
        println!("  {kind}: {}s", ms / 1_000);
    }

    if progress.mastery.is_empty() {
        return;
    }
    println!("Needs practice:");
    for entry in progress.mastery.iter().take(10) {
        let rate = entry
            .success_rate
            .map_or_else(|| "-".to_string(), |r| format!("{:.0}%", r * 100.0));
        println!(
            "  {} ({}) mastery {:.0}, success {rate}",
            entry.character,
            entry.romaji.as_deref().unwrap_or("?"),
            entry.mastery
        );
    }
}

fn print_phrases(services: &AppServices, topic: Option<PhraseCategory>) {
    let catalog = services.catalog();
    let topics: Vec<PhraseCategory> = match topic {
        Some(topic) => vec![topic],
        None => PhraseCategory::ALL.to_vec(),
    };
    for topic in topics {
        let phrases = catalog.phrases(topic);
        println!("{} ({})", topic.as_str(), phrases.len());
        for phrase in phrases {
            println!("  {} / {} ({})", phrase.japanese, phrase.romaji, phrase.english);
            for (word, meaning) in &phrase.word_breakdown {
                println!("      {word}: {meaning}");
            }
        }
    }
}

fn on_off(value: bool) -> &'static str {
    if value { "on" } else { "off" }
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

#[tokio::main]
async fn main() {
    env_logger::init();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
