use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DB_URL_ENV: &str = "QUIZ_DB_URL";
pub const PACK_ENV: &str = "QUIZ_PACK";
const DEFAULT_DB: &str = "sqlite:quiz.sqlite3";

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidSeconds { flag: &'static str, raw: String },
    MissingPack,
    MissingFile,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidSeconds { flag, raw } => {
                write!(f, "invalid {flag} value: {raw} (expected whole seconds)")
            }
            ArgsError::MissingPack => write!(f, "--pack (or {PACK_ENV}) is required"),
            ArgsError::MissingFile => write!(f, "--file is required"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    List,
    Play,
    Seed,
    Export,
    Import,
    Help,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "list" => Some(Self::List),
            "play" => Some(Self::Play),
            "seed" => Some(Self::Seed),
            "export" => Some(Self::Export),
            "import" => Some(Self::Import),
            "help" => Some(Self::Help),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub db_url: String,
    pub pack: Option<String>,
    pub file: Option<PathBuf>,
    pub auto_advance: Option<Duration>,
}

impl Args {
    /// Pack name for commands that need one.
    pub fn require_pack(&self) -> Result<&str, ArgsError> {
        self.pack.as_deref().ok_or(ArgsError::MissingPack)
    }

    pub fn require_file(&self) -> Result<&Path, ArgsError> {
        self.file.as_deref().ok_or(ArgsError::MissingFile)
    }
}

/// Environment values consulted before flags.
#[derive(Debug, Clone, Default)]
pub struct Env {
    pub db_url: Option<String>,
    pub pack: Option<String>,
}

impl Env {
    pub fn from_process() -> Self {
        Self {
            db_url: std::env::var(DB_URL_ENV).ok(),
            pack: std::env::var(PACK_ENV).ok(),
        }
    }
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app [play] [--db <sqlite_url>] [--pack <name>] [--auto-advance <secs>]");
    eprintln!("  app list   [--db <sqlite_url>]");
    eprintln!("  app seed   [--db <sqlite_url>]");
    eprintln!("  app export --pack <name> --file <path> [--db <sqlite_url>]");
    eprintln!("  app import --file <path> [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB}");
    eprintln!("  --pack the default pack");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  {DB_URL_ENV}, {PACK_ENV}, RUST_LOG");
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

/// Parse the command line (without the program name).
///
/// Running without a subcommand, or starting with a flag, means `play`.
pub fn parse(
    argv: impl IntoIterator<Item = String>,
    env: Env,
) -> Result<(Command, Args), ArgsError> {
    let mut argv = argv.into_iter().peekable();

    let command = match argv.peek().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => Command::Help,
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => {
            let command = Command::from_arg(first)
                .ok_or_else(|| ArgsError::UnknownCommand(first.to_owned()))?;
            argv.next();
            command
        }
    };

    let mut db_url = env
        .db_url
        .filter(|value| !value.trim().is_empty())
        .map_or_else(|| normalize_sqlite_url(DEFAULT_DB.to_owned()), normalize_sqlite_url);
    let mut pack = env.pack.filter(|value| !value.trim().is_empty());
    let mut file = None;
    let mut auto_advance = None;

    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--db" => {
                let value = require_value(&mut argv, "--db")?;
                if value.trim().is_empty() {
                    return Err(ArgsError::InvalidDbUrl { raw: value });
                }
                db_url = normalize_sqlite_url(value);
            }
            "--pack" => pack = Some(require_value(&mut argv, "--pack")?),
            "--file" => file = Some(PathBuf::from(require_value(&mut argv, "--file")?)),
            "--auto-advance" => {
                let value = require_value(&mut argv, "--auto-advance")?;
                let secs: u64 = value.trim().parse().map_err(|_| ArgsError::InvalidSeconds {
                    flag: "--auto-advance",
                    raw: value.clone(),
                })?;
                auto_advance = Some(Duration::from_secs(secs));
            }
            "--help" | "-h" => return Ok((Command::Help, Args::defaults())),
            _ => return Err(ArgsError::UnknownArg(arg)),
        }
    }

    Ok((
        command,
        Args {
            db_url,
            pack,
            file,
            auto_advance,
        },
    ))
}

impl Args {
    fn defaults() -> Self {
        Self {
            db_url: normalize_sqlite_url(DEFAULT_DB.to_owned()),
            pack: None,
            file: None,
            auto_advance: None,
        }
    }
}

/// Turns `sqlite:relative.db` into an absolute `sqlite://` URL.
fn normalize_sqlite_url(raw: String) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_owned();
    }

    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file (and its directory) so `SQLite` can open it.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" || db_url.starts_with("sqlite://file:") {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_owned(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_owned(),
        }
        .into());
    }

    let path = Path::new(path);
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
