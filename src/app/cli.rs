use std::{fmt::Display, path::PathBuf, str::FromStr};

use clap::Parser;
use tracing_subscriber::filter::{self, Directive};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
pub struct Cli {
    #[clap(flatten)]
    pub args: Args,
}

#[derive(clap::Args, Clone, Debug)]
pub struct Args {
    /// JSON file holding an array of comments, or an object with a `comments` array
    #[clap(required_unless_present = "print_log_dir")]
    pub comments: Option<PathBuf>,
    /// Comments rendered per page while scrolling
    #[clap(long, default_value_t = 20, value_parser = clap::value_parser!(u16).range(1..))]
    pub page_size: u16,
    /// Term to highlight on startup
    #[clap(long, short)]
    pub search: Option<String>,
    #[clap(long, short, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
    #[clap(long, short)]
    pub print_log_dir: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    None,
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::None => "off",
        };
        write!(f, "{s}")
    }
}

impl TryFrom<LogLevel> for Directive {
    type Error = filter::ParseError;
    fn try_from(value: LogLevel) -> Result<Self, Self::Error> {
        Directive::from_str(&value.to_string())
    }
}
