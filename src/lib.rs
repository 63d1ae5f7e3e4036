pub mod app;
pub mod comments;
pub mod errors;
pub mod export;
pub mod logging;
pub mod markup;
pub mod ui;
