//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `studylog_core` linkage.
//! - Optionally open a configured store and print what it holds.
//!
//! Usage: `studylog [config.json]`

use log::info;
use std::process::ExitCode;
use studylog_core::{
    init_from_config, SessionService, StudyConfig, TopicService, TransactionManager,
};

fn main() -> ExitCode {
    println!("studylog_core ping={}", studylog_core::ping());
    println!("studylog_core version={}", studylog_core::core_version());

    let Some(config_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match summarize_store(&config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("studylog error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn summarize_store(config_path: &str) -> Result<(), String> {
    let config = StudyConfig::load(config_path).map_err(|err| err.to_string())?;
    let logging_enabled = init_from_config(&config).map_err(|err| err.to_string())?;
    let manager =
        TransactionManager::from_location(&config.store).map_err(|err| err.to_string())?;

    let topics = TopicService::new(&manager)
        .get_all_topics()
        .map_err(|err| err.to_string())?;
    let sessions = SessionService::new(&manager)
        .get_all_sessions()
        .map_err(|err| err.to_string())?;
    let completed = sessions.iter().filter(|session| session.is_complete).count();

    info!(
        "event=cli_summary module=cli status=ok topics={} sessions={} completed={completed}",
        topics.len(),
        sessions.len()
    );
    println!("studylog logging={}", if logging_enabled { "on" } else { "off" });
    println!("studylog topics={}", topics.len());
    println!("studylog sessions={} completed={completed}", sessions.len());
    Ok(())
}
