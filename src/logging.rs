use std::path::PathBuf;

use directories::ProjectDirs;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter,
    filter::Directive,
    fmt::{self},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::{app::cli::LogLevel, errors::AppError};

const DATA_DIR_ENV: &str = "COMMENT_EXPLORER_DATA";
const LOG_FILE: &str = "comment-explorer.log";

/// `$COMMENT_EXPLORER_DATA` if set, else the platform data directory, else
/// a `.data` directory under the working directory.
pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|dir| !dir.is_empty()) {
        return PathBuf::from(dir);
    }
    ProjectDirs::from("", "", "comment-explorer")
        .map(|dirs| dirs.data_local_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".data"))
}

pub fn init(level: LogLevel) -> Result<(), AppError> {
    let dir = get_data_dir();
    std::fs::create_dir_all(&dir)?;
    let log_file = std::fs::File::create(dir.join(LOG_FILE))?;
    let filter = EnvFilter::builder()
        .with_default_directive(Directive::try_from(level)?)
        .from_env_lossy();
    let file_subscriber = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(log_file)
        .with_target(true)
        .with_ansi(false);
    tracing_subscriber::registry()
        .with(filter)
        .with(file_subscriber)
        .with(ErrorLayer::default())
        .try_init()?;

    Ok(())
}
