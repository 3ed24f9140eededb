//! `presence-cli` – entry point for the teleoperation rig.
//!
//! Wires the whole stack together:
//!
//! 1. Loads `~/.presence/config.toml` (writing defaults on first run).
//! 2. Starts the ambient collaborators (lights, sound, voice, speech
//!    pipeline) on the cue bus.
//! 3. Attaches a robot session and starts the remote command server.
//! 4. Runs the periodic control tick until Ctrl-C, or exits with a
//!    non-zero status when the robot session is lost so an external
//!    supervisor can restart the rig.

mod config;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use tokio::sync::{Mutex, mpsc};
use tracing::{error, info, warn};

use presence_ambient::{
    CannedChat, CueBus, LightsConfig, LightsEngine, PuzzleClient, SoundConfig, SoundEngine,
    SpeechPipeline, VoiceConfig, VoiceEngine,
};
use presence_core::ControlSession;
use presence_hal::sim::SimRobot;
use presence_server::{RemoteCommandServer, SessionSlot};
use presence_types::PresenceError;

#[tokio::main]
async fn main() {
    init_tracing();
    print_banner();

    // ── Configuration vault ───────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            // The written file holds the plain defaults; env overrides
            // apply to this run only.
            match config::save(&config::Config::default()) {
                Ok(()) => println!(
                    "  No configuration found – wrote defaults to {}",
                    config::config_path().display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Config error".red(), e),
            }
            config::default_with_env()
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::default_with_env()
        }
    };

    // ── Shared shutdown flag + Ctrl-C handler ─────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping the rig …".yellow().bold());
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler");
    }

    // ── Ambient collaborators ─────────────────────────────────────────────
    let bus = CueBus::default();

    let lights = LightsEngine::new(LightsConfig {
        controller: cfg.lights_controller.clone(),
        bulb_addr: cfg.bulb_addr.clone(),
    });
    tokio::spawn(lights.run(bus.subscribe()));

    let (effects_tx, effects_rx) = mpsc::channel(8);
    let sound = SoundEngine::new(SoundConfig {
        player: cfg.sound_player.clone(),
        sound_dir: cfg.sound_dir.clone().into(),
    });
    tokio::spawn(sound.run(bus.subscribe(), effects_rx));

    let voice = VoiceEngine::new(VoiceConfig {
        program: cfg.tts_program.clone(),
        ..VoiceConfig::default()
    });
    let puzzle = PuzzleClient::new(
        cfg.puzzle_url.clone(),
        (!cfg.puzzle_api_key.is_empty()).then(|| cfg.puzzle_api_key.clone()),
    );
    let pipeline = Arc::new(
        SpeechPipeline::new(Box::new(CannedChat), puzzle, voice).with_effects(effects_tx),
    );

    // ── Robot session ─────────────────────────────────────────────────────
    let (robot, _handle) = SimRobot::new();
    let mut session = ControlSession::new(Box::new(robot));
    if let Err(e) = session.set_mouse_look(cfg.mouse_look_default) {
        warn!(error = %e, "failed to apply mouse-look default");
    }
    let slot: SessionSlot = Arc::new(Mutex::new(Some(session)));

    // ── Remote command server ─────────────────────────────────────────────
    let (fatal_tx, mut fatal_rx) = mpsc::channel::<PresenceError>(1);
    let server = RemoteCommandServer::new(Arc::clone(&slot), fatal_tx)
        .with_pipeline(Arc::clone(&pipeline))
        .with_port(cfg.server_port);
    tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!(error = %e, "remote command server failed");
            std::process::exit(1);
        }
    });

    println!(
        "  Remote control listening on port {}\n",
        cfg.server_port.to_string().bold().cyan()
    );

    // ── Control tick loop ─────────────────────────────────────────────────
    let mut ticker = tokio::time::interval(Duration::from_millis(cfg.tick_interval_ms));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
                let mut guard = slot.lock().await;
                if let Some(session) = guard.as_mut() {
                    match session.tick() {
                        Ok(Some(cue)) => {
                            bus.publish(cue);
                        }
                        Ok(None) => {}
                        Err(err) => {
                            error!(%err, "robot session lost; exiting for supervisor restart");
                            std::process::exit(1);
                        }
                    }
                }
            }
            Some(err) = fatal_rx.recv() => {
                error!(%err, "fatal error reported by command server; exiting");
                std::process::exit(1);
            }
        }
    }

    // ── Graceful shutdown ─────────────────────────────────────────────────
    {
        let mut guard = slot.lock().await;
        if let Some(session) = guard.as_mut()
            && let Err(err) = session.reset()
        {
            warn!(%err, "failed to stop actuators during shutdown");
        }
    }
    info!("shutdown complete");
    println!("{}", "  ✓ Actuators stopped. Goodbye.".green());
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging
// ─────────────────────────────────────────────────────────────────────────────

/// Initialise tracing-subscriber using `RUST_LOG` (defaults to "info").
/// Set `PRESENCE_LOG_FORMAT=json` to emit newline-delimited JSON logs for
/// log aggregators. User-facing output still uses `println!`.
fn init_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("PRESENCE_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   ___                              "#.bold().cyan());
    println!("{}", r#"  / _ \_______ ___ ___ ___  _______ "#.bold().cyan());
    println!("{}", r#" / ___/ __/ -_|_-</ -_) _ \/ __/ -_)"#.bold().cyan());
    println!("{}", r#"/_/  /_/  \__/___/\__/_//_/\__/\__/ "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "Presence".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Robot teleoperation and entertainment rig");
    println!();
}
