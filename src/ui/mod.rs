pub mod catalog;
pub mod check;
pub mod interrupt;
pub mod navigator;
pub mod page;
pub mod perception;
pub mod retry;

pub use check::CheckCondition;
pub use interrupt::{InterruptChain, InterruptDaemon, InterruptRule};
pub use navigator::{NavState, Navigator, TraversalSession};
pub use page::{Page, PageGraph, PageGraphBuilder, PageId, RoutingTable};
pub use perception::Perception;
pub use retry::{ClickAndConfirm, IndexAligner};
