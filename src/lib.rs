use std::env;
use std::str::FromStr;
use clap::Parser;
use crate::cli::Cli;
use crate::gui::application::run_application;
use crate::error::AppRunError;

pub mod cli;
pub mod config;
pub mod device;
pub mod error;
pub mod gui;
pub mod os;

fn log_level() -> log::LevelFilter {
    env::var("LOG_LEVEL")
        .ok()
        .and_then(|level| log::LevelFilter::from_str(&level).ok())
        .unwrap_or(log::LevelFilter::Info)
}

pub fn init_logging() {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339(std::time::SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log_level())
        // iced and its windowing stack are very chatty at info level
        .level_for("wgpu_core", log::LevelFilter::Warn)
        .level_for("winit", log::LevelFilter::Warn)
        .level_for("cosmic_text", log::LevelFilter::Warn)
        .chain(std::io::stderr());

    if let Ok(log_file) = env::var("LOG_FILE") {
        dispatch = dispatch.chain(
            fern::log_file(log_file).expect("Failed to open LOG_FILE")
        );
    }

    dispatch.apply().expect("Failed to initialize logger");
}

pub fn run(args: env::Args) -> Result<(), AppRunError> {
    let cli = Cli::parse_from(args);
    run_application(cli)?;
    Ok(())
}
