use std::{io::Write, path::PathBuf};

use anyhow::{bail, Context, Result};
use tokio::{
    io::{AsyncBufReadExt, BufReader, Lines, Stdin},
    sync::{broadcast, mpsc},
};

use cuffsim::{
    audio::AudioEngineHandle,
    auth::IdentityStore,
    bridge,
    db::Database,
    models::{BpReading, UserProgress},
    scenario::{validation, ScenarioKey},
    settings::SettingsStore,
    simulation::{SimulationController, SimulationEvent},
};

type InputLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("cuffsim starting up...");

    let data_dir = std::env::var("CUFFSIM_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(".cuffsim"));
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let db = Database::new(data_dir.join("cuffsim.sqlite3"))?;
    let settings = SettingsStore::new(data_dir.join("settings.json"))?;
    let audio = AudioEngineHandle::new();

    let mut identity = IdentityStore::new(db);
    if identity.restore_session().await? {
        if let Some(ledger) = identity.ledger() {
            println!("welcome back, {}", ledger.progress().user.name);
        }
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if identity.ledger().is_none() {
            if !auth_menu(&mut identity, &mut lines).await? {
                break;
            }
            continue;
        }

        println!();
        println!("1) practice  2) dashboard  3) pulse sound on/off  4) log out  5) quit");
        match prompt(&mut lines, "choice: ").await?.as_str() {
            "1" => run_practice(&mut identity, &audio, &settings, &mut lines).await?,
            "2" => {
                if let Some(ledger) = identity.ledger() {
                    print_dashboard(ledger.progress());
                }
            }
            "3" => {
                let mut sound = settings.pulse_sound();
                sound.enabled = !sound.enabled;
                let enabled = sound.enabled;
                settings.update_pulse_sound(sound)?;
                println!(
                    "pulse sound {}",
                    if enabled { "enabled" } else { "disabled" }
                );
            }
            "4" => identity.logout().await?,
            "5" => break,
            _ => println!("pick 1-5"),
        }
    }

    println!("goodbye");
    Ok(())
}

/// Returns false when the user chose to quit.
async fn auth_menu(identity: &mut IdentityStore, lines: &mut InputLines) -> Result<bool> {
    println!();
    println!("1) log in  2) sign up  3) quit");
    match prompt(lines, "choice: ").await?.as_str() {
        "1" => {
            let email = prompt(lines, "email: ").await?;
            let password = prompt(lines, "password: ").await?;
            if identity.login(&email, &password).await? {
                if let Some(ledger) = identity.ledger() {
                    println!("welcome back, {}", ledger.progress().user.name);
                }
            } else {
                println!("no account matches that email and password");
            }
        }
        "2" => {
            let email = prompt(lines, "email: ").await?;
            let name = prompt(lines, "name: ").await?;
            let password = prompt(lines, "password: ").await?;
            if identity.signup(&email, &name, &password).await? {
                println!("account created");
            } else {
                println!("an account with that email already exists");
            }
        }
        "3" => return Ok(false),
        _ => println!("pick 1-3"),
    }
    Ok(true)
}

async fn run_practice(
    identity: &mut IdentityStore,
    audio: &AudioEngineHandle,
    settings: &SettingsStore,
    lines: &mut InputLines,
) -> Result<()> {
    let Some(ledger) = identity.ledger() else {
        return Ok(());
    };

    println!();
    println!("scenarios:");
    let scenarios: Vec<(ScenarioKey, bool)> = ledger
        .progress()
        .scenarios
        .iter()
        .map(|entry| (entry.scenario_key, entry.unlocked))
        .collect();
    for (index, (key, unlocked)) in scenarios.iter().enumerate() {
        let range = validation::display_range(*key);
        let marker = if *unlocked { " " } else { "*" };
        println!(
            "{}{}) {:<14} {} (systolic {}-{}, diastolic {}-{})",
            marker,
            index + 1,
            key.display_name(),
            range.description,
            range.systolic_min,
            range.systolic_max,
            range.diastolic_min,
            range.diastolic_max,
        );
    }
    println!("   (* = locked)");

    let choice = prompt(lines, "scenario: ").await?;
    let Some(&(scenario, unlocked)) = choice
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|index| scenarios.get(index))
    else {
        println!("not a scenario number");
        return Ok(());
    };
    if !unlocked {
        println!(
            "{} is locked until you reach {} total correct readings",
            scenario.display_name(),
            scenario.required_correct()
        );
        return Ok(());
    }

    // Optional hardware pump; missing device degrades to manual input only.
    let bridge_settings = settings.bridge();
    let (bridge_handle, pump_rx) = if bridge_settings.enabled {
        let (pump_tx, pump_rx) = mpsc::channel(8);
        match bridge::connect(&bridge_settings.address, pump_tx).await {
            Some(handle) => (Some(handle), Some(pump_rx)),
            None => (None, None),
        }
    } else {
        (None, None)
    };

    let controller = SimulationController::new(
        scenario,
        audio.clone(),
        settings.pulse_sound(),
        bridge_handle,
    );

    let mut tasks = Vec::new();
    if let Some(mut pump_rx) = pump_rx {
        let pump_controller = controller.clone();
        tasks.push(tokio::spawn(async move {
            while pump_rx.recv().await.is_some() {
                pump_controller.pump().await;
            }
        }));
    }

    let mut events = controller.subscribe();
    tasks.push(tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(SimulationEvent::PulseStarted) => println!("  * pulse audible"),
                Ok(SimulationEvent::PulseStopped) => println!("  - pulse silent"),
                Ok(SimulationEvent::DeflationFinished) => println!("  cuff fully deflated"),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }));

    println!();
    println!("Enter = pump, 'read' = submit your reading, 'quit' = abandon");
    let submitted = loop {
        match prompt(lines, "> ").await?.as_str() {
            "" => {
                controller.pump().await;
                println!("  pressure: {} mmHg", controller.pressure().await);
            }
            "read" | "r" => break true,
            "quit" | "q" => break false,
            _ => println!("  Enter = pump, 'read' = submit, 'quit' = abandon"),
        }
    };

    controller.stop().await;
    for task in &tasks {
        task.abort();
    }
    if !submitted {
        return Ok(());
    }

    let true_reading = controller.true_reading().await;
    let systolic = prompt_reading(lines, "systolic (mmHg)").await?;
    let diastolic = prompt_reading(lines, "diastolic (mmHg)").await?;

    let Some(ledger) = identity.ledger_mut() else {
        return Ok(());
    };
    let outcome = ledger
        .record_attempt(scenario, true_reading, BpReading::new(systolic, diastolic))
        .await?;

    println!();
    println!("true reading was {true_reading}");
    println!(
        "accuracy {}%: {}",
        outcome.accuracy,
        if outcome.is_correct {
            "correct, within tolerance"
        } else {
            "outside the ±5 mmHg tolerance"
        }
    );
    for badge in &outcome.new_badges {
        println!(
            "new badge: {} {}: {}",
            badge.icon, badge.name, badge.description
        );
    }

    Ok(())
}

fn print_dashboard(progress: &UserProgress) {
    println!();
    println!(
        "{} — level {} ({} xp)",
        progress.user.name, progress.level, progress.experience
    );
    println!(
        "attempts: {} total, {} correct ({}% overall)",
        progress.total_attempts, progress.total_correct, progress.overall_accuracy
    );
    println!(
        "streak: {} current, {} best",
        progress.current_streak, progress.best_streak
    );
    for entry in &progress.scenarios {
        let status = if entry.completed {
            "completed"
        } else if entry.unlocked {
            "unlocked"
        } else {
            "locked"
        };
        println!(
            "  {:<14} {:>3} attempts, {:>3} correct, avg {:>3}%, best {:>3}%  [{status}]",
            entry.scenario_name,
            entry.attempts,
            entry.correct_attempts,
            entry.average_accuracy,
            entry.best_accuracy,
        );
    }
    if progress.badges.is_empty() {
        println!("badges: none yet");
    } else {
        let names: Vec<String> = progress
            .badges
            .iter()
            .map(|b| format!("{} {}", b.icon, b.name))
            .collect();
        println!("badges: {}", names.join(", "));
    }
}

async fn prompt(lines: &mut InputLines, message: &str) -> Result<String> {
    print!("{message}");
    std::io::stdout().flush()?;
    match lines.next_line().await? {
        Some(line) => Ok(line.trim().to_string()),
        None => bail!("stdin closed"),
    }
}

/// Keeps asking until it gets a positive whole number.
async fn prompt_reading(lines: &mut InputLines, label: &str) -> Result<i32> {
    loop {
        let value = prompt(lines, &format!("{label}: ")).await?;
        match value.parse::<i32>() {
            Ok(v) if v > 0 => return Ok(v),
            _ => println!("enter a positive whole number"),
        }
    }
}
