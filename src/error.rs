use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Game page unknown, supported pages: {}", .known_pages.join(", "))]
    PageUnknown { known_pages: Vec<String> },
    #[error("Request human takeover: {0}")]
    HumanTakeover(String),
    #[error("Game not running")]
    GameNotRunning,
    #[error("Page is not declared: {0}")]
    UndeclaredPage(String),
    #[error("Invalid page graph: {0}")]
    InvalidGraph(String),
    #[error("Device error: {0}")]
    Device(String),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Coordinator error: {0}")]
    Coordinator(String),
}

impl AppError {
    /// Errors after which autonomous operation must stop and wait for an operator.
    pub fn requires_human(&self) -> bool {
        matches!(
            self,
            AppError::PageUnknown { .. } | AppError::HumanTakeover(_) | AppError::GameNotRunning
        )
    }

    /// Static-data defects: a page or stage was requested that nobody declared.
    pub fn is_programming_error(&self) -> bool {
        matches!(
            self,
            AppError::UndeclaredPage(_) | AppError::InvalidGraph(_) | AppError::Coordinator(_)
        )
    }
}
