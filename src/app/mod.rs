use tracing::info;

use crate::errors::AppError;
use crate::{logging, ui};

pub struct App {
    state: ui::AppState,
    log_level: cli::LogLevel,
}

impl App {
    pub fn new(cli: cli::Cli) -> Result<Self, AppError> {
        let comments_path = cli.args.comments.ok_or_else(|| {
            AppError::Other(anyhow::anyhow!("a comments file is required"))
        })?;
        Ok(Self {
            state: ui::AppState {
                comments_path,
                page_size: usize::from(cli.args.page_size),
                search: cli.args.search.filter(|term| !term.is_empty()),
            },
            log_level: cli.args.log_level,
        })
    }

    pub async fn run(self) -> Result<(), AppError> {
        logging::init(self.log_level)?;
        info!(path = %self.state.comments_path.display(), page_size = self.state.page_size, "Starting");
        ui::run(self.state).await
    }
}

pub mod cli;
