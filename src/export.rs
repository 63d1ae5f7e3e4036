//! The boundary to the image export pipeline.
//!
//! The explorer only ever names a comment and a preset; rendering the image is
//! someone else's job.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    CommentOnly,
    IphoneDark,
    IphoneLight,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [
        ExportFormat::CommentOnly,
        ExportFormat::IphoneDark,
        ExportFormat::IphoneLight,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::CommentOnly => "comment-only",
            ExportFormat::IphoneDark => "iphone-dark",
            ExportFormat::IphoneLight => "iphone-light",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::CommentOnly => "Comment only",
            ExportFormat::IphoneDark => "iPhone dark",
            ExportFormat::IphoneLight => "iPhone light",
        }
    }
}

impl Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fire-and-forget export requests. Implementations report progress through
/// their own channels; the caller never waits on the outcome.
pub trait ExportService {
    fn request_export(&mut self, comment_id: &str, format: ExportFormat);
}

/// Records requests in the log and keeps the most recent one for display.
#[derive(Debug, Default)]
pub struct LogExportService {
    last: Option<(String, ExportFormat)>,
}

impl LogExportService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_notice(&self) -> Option<String> {
        self.last
            .as_ref()
            .map(|(id, format)| format!("Export queued: {id} as {}", format.label()))
    }
}

impl ExportService for LogExportService {
    fn request_export(&mut self, comment_id: &str, format: ExportFormat) {
        info!(comment_id, %format, "Export requested");
        self.last = Some((comment_id.to_string(), format));
    }
}
