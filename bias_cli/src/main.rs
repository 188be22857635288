mod cli;
mod error_fmt;
mod rt;
mod service;

use clap::Parser;
use cli::{Cli, Commands, FILE_GUARD};
use bias_core::{BiasReadback, RequestSender};
use bias_hardware::FileBiasStore;
use bias_traits::BiasStore;
use eyre::WrapErr;
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if cli.json {
                eprintln!("{}", error_fmt::format_error_json(&err));
            } else {
                eprintln!("{}", error_fmt::humanize(&err));
            }
            ExitCode::from(error_fmt::exit_code(&err))
        }
    }
}

fn run(cli: &Cli) -> eyre::Result<()> {
    let config = load_config(cli)?;
    init_logging(cli, config.as_ref());
    match &cli.cmd {
        Commands::Run { rt, rt_prio } => cmd_run(cli, config.as_ref(), *rt, *rt_prio),
        Commands::Adjust { percent } => cmd_adjust(cli, config.as_ref(), *percent),
        Commands::Calibrate => cmd_calibrate(cli, config.as_ref()),
        Commands::Status => cmd_status(cli, config.as_ref()),
        Commands::SelfCheck => cmd_self_check(cli, config.as_ref()),
    }
}

fn load_config(cli: &Cli) -> eyre::Result<Option<bias_config::Config>> {
    if !cli.config.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(&cli.config).wrap_err("read config file")?;
    let cfg = bias_config::load_toml(&text).wrap_err("parse config file")?;
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(Some(cfg))
}

fn init_logging(cli: &Cli, config: Option<&bias_config::Config>) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let logging = config.map(|c| &c.logging);
    if let Some(file) = logging.and_then(|l| l.file.as_deref()) {
        let path = std::path::Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        let name = path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_else(|| "bias_module.log".into());
        let appender = match logging.and_then(|l| l.rotation.as_deref()) {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_writer(writer)
            .init();
    } else {
        // Logs on stderr; stdout carries results and status reports.
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn shutdown_flag() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let handler_flag = flag.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::Relaxed)) {
        tracing::warn!(error = %e, "could not install ctrl-c handler");
    }
    flag
}

fn cmd_run(
    cli: &Cli,
    config: Option<&bias_config::Config>,
    rt: bool,
    rt_prio: Option<i32>,
) -> eyre::Result<()> {
    rt::setup_rt_once(rt, rt_prio);
    let shutdown = shutdown_flag();
    let mut node = service::build_loop(cli, config, shutdown.clone())?;
    let _reader = spawn_request_reader(node.sender(), node.readback(), shutdown);
    node.run()
}

/// The stand-in receive context: a thread turning stdin lines into intake
/// submissions and bias polls.
fn spawn_request_reader(
    sender: RequestSender,
    readback: BiasReadback,
    shutdown: Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("adjust") => match parts.next().and_then(|s| s.parse::<u8>().ok()) {
                    Some(percent) => {
                        if sender.submit_adjustment(percent) {
                            tracing::info!(percent, "adjustment request latched");
                        } else {
                            tracing::warn!("adjustment already pending, request dropped");
                        }
                    }
                    None => tracing::warn!("usage: adjust <percent>"),
                },
                Some("calibrate") => {
                    sender.submit_calibration();
                    tracing::info!("calibration request latched");
                }
                Some("bias?") => println!("bias {}%", readback.get()),
                Some("quit") | Some("exit") => break,
                Some(other) => tracing::warn!(request = other, "unknown request"),
                None => {}
            }
        }
        shutdown.store(true, Ordering::Relaxed);
    })
}

fn cmd_adjust(cli: &Cli, config: Option<&bias_config::Config>, percent: u8) -> eyre::Result<()> {
    let shutdown = shutdown_flag();
    let mut node = service::build_loop(cli, config, shutdown)?;
    node.sender().submit_adjustment(percent);
    let state = node.run_until_idle()?;
    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "event": "adjustment_complete",
                "bias_actual": state.bias_actual,
                "step_pos": state.step_pos,
                "step_range": state.step_range,
            })
        );
    } else {
        println!(
            "bias {}% (step {} of {})",
            state.bias_actual, state.step_pos, state.step_range
        );
    }
    Ok(())
}

fn cmd_calibrate(cli: &Cli, config: Option<&bias_config::Config>) -> eyre::Result<()> {
    let shutdown = shutdown_flag();
    let mut node = service::build_loop(cli, config, shutdown)?;
    node.sender().submit_calibration();
    let state = node.run_until_idle()?;
    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "event": "calibration_complete",
                "step_range": state.step_range,
                "step_pos": state.step_pos,
                "bias_actual": state.bias_actual,
            })
        );
    } else {
        println!(
            "calibrated: {} steps of travel, re-homed to step {} ({}%)",
            state.step_range, state.step_pos, state.bias_actual
        );
    }
    Ok(())
}

fn cmd_status(cli: &Cli, config: Option<&bias_config::Config>) -> eyre::Result<()> {
    let mut store = FileBiasStore::new(service::state_path(cli, config));
    match store.load().map_err(|e| eyre::eyre!(e))? {
        Some(state) => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({
                        "bias_actual": state.bias_actual,
                        "step_pos": state.step_pos,
                        "step_range": state.step_range,
                    })
                );
            } else {
                println!(
                    "bias {}% (step {} of {})",
                    state.bias_actual, state.step_pos, state.step_range
                );
            }
        }
        None => {
            if cli.json {
                println!("{}", serde_json::json!({ "first_boot": true }));
            } else {
                println!("no committed bias state (first boot)");
            }
        }
    }
    Ok(())
}

fn cmd_self_check(cli: &Cli, config: Option<&bias_config::Config>) -> eyre::Result<()> {
    let shutdown = shutdown_flag();
    let node = service::build_loop(cli, config, shutdown)?;
    let state = node.position();
    tracing::info!(
        step_range = state.step_range,
        step_pos = state.step_pos,
        bias_actual = state.bias_actual,
        "module assembled"
    );
    if cli.json {
        println!("{}", serde_json::json!({ "self_check": "ok" }));
    } else {
        println!("self-check ok");
    }
    Ok(())
}
