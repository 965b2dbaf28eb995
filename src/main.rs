use anyhow::Result;
use baloto::utils::{describe_guard, describe_period, format_entry, format_numbers};
use baloto::{GuardError, PickController, SaveOutcome, SqliteStore, SystemClock, config};
use std::env;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let command = env::args().nth(1).unwrap_or_else(|| "status".to_string());

    let store = SqliteStore::open(&config.database_url)?;
    let mut controller = PickController::new(store, Arc::new(SystemClock));
    controller.mount().await?;

    match command.as_str() {
        "status" => print_status(&controller),
        "play" => play(&mut controller).await?,
        "history" => print_history(&controller),
        "snapshot" => println!("{}", serde_json::to_string_pretty(&controller.snapshot())?),
        other => {
            eprintln!("Unknown command: {}", other);
            eprintln!("Usage: baloto [status|play|history|snapshot]");
            std::process::exit(2);
        }
    }

    Ok(())
}

fn print_status(controller: &PickController<SqliteStore>) {
    let snapshot = controller.snapshot();
    println!("🎯 Draw period: {}", describe_period(snapshot.period));
    println!("🔒 Guard: {}", describe_guard(snapshot.guard));
    println!("📋 Saved picks: {}", snapshot.history.len());
}

async fn play(controller: &mut PickController<SqliteStore>) -> Result<()> {
    let numbers = controller.generate();
    println!("🎲 Generated: {}", format_numbers(&numbers));

    match controller.save().await {
        Ok(SaveOutcome::Saved(entry)) => {
            println!("✅ Saved for {} ({})", entry.period, entry.created_at);
        }
        Ok(outcome) => {
            if let Some(notice) = outcome.notice() {
                println!("⚠ {}", notice);
            }
        }
        Err(GuardError::RaceLost { period }) => {
            println!("⚠ Another pick was saved for {} first.", period);
        }
        Err(e) => {
            eprintln!("❌ Could not save: {}. Try again.", e);
            return Err(e.into());
        }
    }

    println!();
    print_history(controller);
    Ok(())
}

fn print_history(controller: &PickController<SqliteStore>) {
    let history = controller.history();
    if history.is_empty() {
        println!("📭 No saved picks yet.");
        return;
    }

    println!("📋 History ({} picks):", history.len());
    for entry in history {
        println!("   • {}", format_entry(entry));
    }
}
