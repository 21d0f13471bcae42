use tracing::debug;

use crate::error::AppError;
use crate::ui::interrupt::InterruptChain;
use crate::ui::perception::Perception;

/// Keeps dismissing overlays while no navigation is running.
///
/// Has no loop of its own: whoever owns the session calls [`InterruptDaemon::tick`]
/// on its own cadence.
#[derive(Debug, Default)]
pub struct InterruptDaemon {
    ticks: u64,
    handled: u64,
}

impl InterruptDaemon {
    pub fn new() -> Self {
        Self::default()
    }

    /// One fresh sample and one pass over the chain.
    pub async fn tick(
        &mut self,
        ui: &mut Perception,
        chain: &mut InterruptChain,
    ) -> Result<bool, AppError> {
        ui.screenshot().await?;
        self.ticks += 1;
        let handled = chain.run_once(ui).await?;
        if handled {
            self.handled += 1;
            debug!("Daemon tick {}: handled", self.ticks);
        }
        Ok(handled)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn handled(&self) -> u64 {
        self.handled
    }
}
