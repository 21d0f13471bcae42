pub mod common;
pub mod config;
pub mod coordinator;
pub mod device;
pub mod error;
pub mod ui;

pub use config::Settings;
pub use coordinator::{Coordinator, CoordinatorBuilder};
pub use error::AppError;

pub use ui::{CheckCondition, InterruptChain, Navigator, PageGraph, PageId};
