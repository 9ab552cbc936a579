//! DrainGuard backend
//!
//! Runs the monitoring pipeline against the simulator or a hardware link.
//!
//! ```text
//! drainguard --mode simulator                  # no hardware needed
//! drainguard --mode serial --port /dev/ttyUSB0
//! drainguard --mode serial --port tcp://192.168.4.1:23
//! ```
//!
//! In simulator mode, type `anomaly [TYPE]` on stdin to inject a burst and
//! `quit` to stop. SIGINT and SIGTERM stop the service the same way as `quit`.

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, ValueEnum};
use drainguard_connectors::{
    AnomalyTrigger, HardwareSource, SimulatedSource, SimulatorConfig, TelemetrySource,
};
use drainguard_core::{RiskType, Settings};
use drainguard_service::Pipeline;

/// DrainGuard monitoring backend
#[derive(Parser, Debug)]
#[command(name = "drainguard")]
#[command(about = "DrainGuard drainage monitoring backend", long_about = None)]
#[command(version)]
struct Cli {
    /// Telemetry source
    #[arg(long, value_enum, default_value_t = Mode::Simulator)]
    mode: Mode,

    /// Serial device path or `tcp://host:port` bridge (serial mode)
    #[arg(long)]
    port: Option<String>,

    /// JSON settings file; absent fields keep their defaults
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Model artifact path
    #[arg(long)]
    model: Option<PathBuf>,

    /// Stop after this many seconds instead of waiting for `quit`
    #[arg(long, value_name = "SECS")]
    run_for: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Simulator,
    Serial,
}

/// Operator command read from stdin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Anomaly(Option<RiskType>),
    Quit,
}

fn parse_command(line: &str) -> Result<Option<Command>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    match verb.to_ascii_lowercase().as_str() {
        "quit" | "exit" => Ok(Some(Command::Quit)),
        "anomaly" => {
            let kind = words.next().map(str::parse::<RiskType>).transpose()?;
            Ok(Some(Command::Anomaly(kind)))
        }
        other => bail!("unknown command: {}", other),
    }
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.settings {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };

    if let Some(port) = &cli.port {
        settings.serial.port = port.clone();
    }
    if let Some(model) = &cli.model {
        settings.paths.model = model.clone();
    }

    settings.validate().context("invalid settings")?;
    std::fs::create_dir_all(&settings.paths.data_dir)
        .with_context(|| format!("creating data directory {}", settings.paths.data_dir.display()))?;
    Ok(settings)
}

fn spawn_stdin_reader(tx: Sender<Command>) -> Result<()> {
    thread::Builder::new()
        .name("drainguard-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match parse_command(&line) {
                    Ok(Some(command)) => {
                        if tx.send(command).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => log::warn!("{} (try `anomaly [TYPE]` or `quit`)", err),
                }
            }
        })
        .context("spawning stdin reader")?;
    Ok(())
}

/// Route SIGINT/SIGTERM into the command channel as `quit`
fn install_signal_handler(tx: Sender<Command>) -> Result<()> {
    ctrlc::set_handler(move || {
        log::info!("Shutdown signal received");
        // The receiver is gone once shutdown is underway
        let _ = tx.send(Command::Quit);
    })
    .context("installing signal handler")
}

/// Serve operator commands until `quit` or the deadline
fn wait_for_shutdown(commands: Receiver<Command>, trigger: Option<&AnomalyTrigger>, deadline: Option<Instant>) {
    let mut commands = Some(commands);
    loop {
        let wait = match deadline {
            Some(deadline) => {
                let left = deadline.saturating_duration_since(Instant::now());
                if left.is_zero() {
                    return;
                }
                left.min(Duration::from_secs(1))
            }
            None => Duration::from_secs(1),
        };

        let Some(rx) = &commands else {
            thread::sleep(wait);
            continue;
        };

        match rx.recv_timeout(wait) {
            Ok(Command::Quit) => return,
            Ok(Command::Anomaly(kind)) => match trigger {
                Some(trigger) => trigger.request(kind),
                None => log::warn!("anomaly injection is only available in simulator mode"),
            },
            Err(RecvTimeoutError::Timeout) => {}
            // Every sender dropped; only the deadline can end the wait
            Err(RecvTimeoutError::Disconnected) => commands = None,
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;

    println!("{}", "=".repeat(60));
    println!("  DrainGuard - Backend Service");
    println!("  Mode: {}", format!("{:?}", cli.mode).to_uppercase());
    println!("  Started: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("{}", "=".repeat(60));

    log::info!("Initializing components...");
    let (source, trigger): (Box<dyn TelemetrySource>, Option<AnomalyTrigger>) = match cli.mode {
        Mode::Simulator => {
            let source = SimulatedSource::new(SimulatorConfig::from_settings(&settings));
            let trigger = source.trigger();
            (Box::new(source), Some(trigger))
        }
        Mode::Serial => (Box::new(HardwareSource::from_settings(&settings)), None),
    };

    let (tx, commands) = mpsc::channel();
    install_signal_handler(tx.clone())?;

    let mut pipeline = Pipeline::from_settings(&settings, source).context("wiring pipeline")?;
    pipeline.start().context("starting pipeline")?;

    spawn_stdin_reader(tx)?;
    let deadline = cli.run_for.map(|secs| Instant::now() + Duration::from_secs(secs));
    wait_for_shutdown(commands, trigger.as_ref(), deadline);

    pipeline.stop().context("stopping pipeline")?;
    log::info!("{}", pipeline.status());
    log::info!("Backend stopped.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use drainguard_connectors::BurstRequest;

    #[test]
    fn commands() {
        assert_eq!(parse_command("quit").unwrap(), Some(Command::Quit));
        assert_eq!(parse_command("  ").unwrap(), None);
        assert_eq!(parse_command("anomaly").unwrap(), Some(Command::Anomaly(None)));
        assert_eq!(
            parse_command("anomaly gas_hazard").unwrap(),
            Some(Command::Anomaly(Some(RiskType::GasHazard)))
        );
        assert!(parse_command("anomaly volcano").is_err());
        assert!(parse_command("reboot").is_err());
    }

    #[test]
    fn cli_overrides_settings() {
        let dir = tempfile::tempdir().unwrap();
        let settings_path = dir.path().join("settings.json");
        let data_dir = dir.path().join("data");
        std::fs::write(
            &settings_path,
            serde_json::json!({ "paths": { "data_dir": data_dir } }).to_string(),
        )
        .unwrap();

        let cli = Cli::parse_from([
            "drainguard",
            "--mode",
            "serial",
            "--port",
            "tcp://127.0.0.1:7000",
            "--settings",
            settings_path.to_str().unwrap(),
            "--model",
            "model.json",
            "--run-for",
            "5",
        ]);
        assert_eq!(cli.mode, Mode::Serial);
        assert_eq!(cli.run_for, Some(5));

        let settings = load_settings(&cli).unwrap();
        assert_eq!(settings.serial.port, "tcp://127.0.0.1:7000");
        assert_eq!(settings.paths.model, PathBuf::from("model.json"));
        assert!(data_dir.is_dir());
    }

    #[test]
    fn deadline_ends_wait() {
        let (_tx, rx) = mpsc::channel();
        let started = Instant::now();
        wait_for_shutdown(rx, None, Some(Instant::now() + Duration::from_millis(50)));
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn quit_from_another_sender_ends_wait() {
        let (tx, rx) = mpsc::channel();
        let signal = tx.clone();
        drop(tx);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            signal.send(Command::Quit).unwrap();
        });

        let started = Instant::now();
        wait_for_shutdown(rx, None, Some(Instant::now() + Duration::from_secs(10)));
        assert!(started.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn quit_ends_wait() {
        let (tx, rx) = mpsc::channel();
        tx.send(Command::Anomaly(Some(RiskType::Leakage))).unwrap();
        tx.send(Command::Quit).unwrap();
        let trigger = AnomalyTrigger::default();
        wait_for_shutdown(rx, Some(&trigger), None);
        assert_eq!(trigger.take(), Some(BurstRequest::Kind(RiskType::Leakage)));
    }
}
