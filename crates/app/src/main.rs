mod config;
mod terminal;

use services::default_pack::DEFAULT_PACK_NAME;
use services::{AppServices, Backend, Clock, PlayerOptions};
use tracing_subscriber::EnvFilter;

use config::{Args, Command, Env};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn open_services(
    args: &Args,
    clock: Clock,
) -> Result<AppServices, Box<dyn std::error::Error>> {
    // Keep file handling in the binary glue so services stay storage-agnostic.
    if let Err(err) = config::prepare_sqlite_file(&args.db_url) {
        tracing::warn!(%err, db_url = %args.db_url, "cannot prepare database file");
    }
    Ok(AppServices::connect_or_fallback(&args.db_url, clock).await?)
}

async fn list(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let packs = services.pack_service().list_packs().await?;
    if packs.is_empty() {
        println!("No packs stored.");
        return Ok(());
    }
    for pack in packs {
        println!(
            "{:<32} {:<6} {:>3} questions  {:>3}s",
            pack.name, pack.difficulty, pack.question_count, pack.time_limit_secs
        );
    }
    Ok(())
}

async fn play(services: &AppServices, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let name = args.pack.as_deref().unwrap_or(DEFAULT_PACK_NAME);
    let mut options = PlayerOptions::default();
    if let Some(delay) = args.auto_advance {
        options = options.with_auto_advance(delay);
    }

    let player = services.start_quiz(name, options).await?;
    let result = terminal::play(&player).await?;
    tracing::info!(pack = name, %result, "quiz over");
    Ok(())
}

async fn export(services: &AppServices, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let name = args.require_pack()?;
    let path = args.require_file()?;
    let json = services.pack_service().export_json(name).await?;
    tokio::fs::write(path, json).await?;
    println!("Exported \"{name}\" to {}", path.display());
    Ok(())
}

async fn import(services: &AppServices, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let path = args.require_file()?;
    let json = tokio::fs::read_to_string(path).await?;
    let id = services.pack_service().import_json(&json).await?;
    println!("Imported {} as pack {id}", path.display());
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (command, args) = config::parse(std::env::args().skip(1), Env::from_process())
        .inspect_err(|e| {
            eprintln!("{e}");
            config::print_usage();
        })?;

    if command == Command::Help {
        config::print_usage();
        return Ok(());
    }

    let clock = Clock::default();
    let services = open_services(&args, clock).await?;
    if services.backend() == Backend::InMemory && command != Command::Play {
        eprintln!("warning: database unavailable, changes will not be saved");
    }

    match command {
        Command::List => list(&services).await,
        Command::Play => play(&services, &args).await,
        Command::Seed => {
            if services.seed_default_pack(clock).await? {
                println!("Stored \"{DEFAULT_PACK_NAME}\".");
            } else {
                println!("\"{DEFAULT_PACK_NAME}\" already exists.");
            }
            Ok(())
        }
        Command::Export => export(&services, &args).await,
        Command::Import => import(&services, &args).await,
        Command::Help => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
