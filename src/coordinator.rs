use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    common::Button,
    config::Settings,
    device::{Device, Matcher},
    error::AppError,
    ui::{
        catalog, interrupt::default_chain, ClickAndConfirm, IndexAligner, InterruptChain,
        InterruptDaemon, Navigator, PageGraph, PageId, Perception,
    },
};

/// One automation session: the device, what is known about the screen, and the
/// navigation and interrupt state built on top of it.
pub struct Coordinator {
    settings: Settings,
    ui: Perception,
    navigator: Navigator,
    chain: InterruptChain,
    daemon: InterruptDaemon,
}

impl Coordinator {
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn chain_mut(&mut self) -> &mut InterruptChain {
        &mut self.chain
    }

    pub fn perception_mut(&mut self) -> &mut Perception {
        &mut self.ui
    }

    /// Blocks until `destination` is displayed.
    pub async fn navigate(&mut self, destination: PageId) -> Result<(), AppError> {
        self.navigator
            .navigate(&mut self.ui, &mut self.chain, destination)
            .await
    }

    /// `Ok(false)` when already at `destination`.
    pub async fn ensure(&mut self, destination: PageId) -> Result<bool, AppError> {
        self.navigator
            .ensure(&mut self.ui, &mut self.chain, destination)
            .await
    }

    pub async fn current_page(&mut self) -> Result<PageId, AppError> {
        self.navigator
            .get_current_page(&mut self.ui, &mut self.chain, true)
            .await
    }

    /// Runs `action` with the interrupt chain as its hook.
    pub async fn click_and_confirm(&mut self, action: &ClickAndConfirm) -> Result<u32, AppError> {
        action.perform(&mut self.ui, Some(&mut self.chain)).await
    }

    /// A click-and-confirm using the configured retry timings.
    pub fn click_action(&self, click: Button, check: Button) -> ClickAndConfirm {
        ClickAndConfirm::new(click, check).with_settings(&self.settings.retry)
    }

    pub async fn ensure_index(
        &mut self,
        aligner: &IndexAligner,
        index: i32,
    ) -> Result<u32, AppError> {
        aligner.ensure_index(&mut self.ui, index).await
    }

    /// Restores the click budgets of the interrupt chain.
    pub fn reset_budgets(&mut self) {
        self.chain.reset_budgets();
    }

    pub async fn daemon_tick(&mut self) -> Result<bool, AppError> {
        self.daemon.tick(&mut self.ui, &mut self.chain).await
    }

    /// Ticks the interrupt daemon on the configured cadence until cancelled.
    ///
    /// Returns the number of ticks. A fatal error from the chain stops the loop.
    pub async fn run_daemon(&mut self, cancel_token: CancellationToken) -> Result<u64, AppError> {
        let mut ticker = tokio::time::interval(self.settings.daemon.cadence());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Daemon started");

        loop {
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {
                    info!(
                        "Daemon stopped after {} ticks, {} handled",
                        self.daemon.ticks(),
                        self.daemon.handled()
                    );
                    return Ok(self.daemon.ticks());
                }
                _ = ticker.tick() => {
                    self.daemon_tick().await?;
                }
            }
        }
    }
}

pub struct CoordinatorBuilder {
    settings: Settings,
    device: Option<Box<dyn Device>>,
    matcher: Option<Box<dyn Matcher>>,
    graph: Option<PageGraph>,
    recovery: Vec<Button>,
    chain: Option<InterruptChain>,
}

impl CoordinatorBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            device: None,
            matcher: None,
            graph: None,
            recovery: catalog::RECOVERY_BUTTONS.to_vec(),
            chain: None,
        }
    }

    pub fn device<D: Device + 'static>(mut self, device: D) -> Self {
        self.device = Some(Box::new(device));
        self
    }

    pub fn matcher<M: Matcher + 'static>(mut self, matcher: M) -> Self {
        self.matcher = Some(Box::new(matcher));
        self
    }

    // Replaces the game client's standard pages.
    pub fn graph(mut self, graph: PageGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn recovery_buttons(mut self, buttons: impl IntoIterator<Item = Button>) -> Self {
        self.recovery = buttons.into_iter().collect();
        self
    }

    // Replaces the standard interrupt chain.
    pub fn chain(mut self, chain: InterruptChain) -> Self {
        self.chain = Some(chain);
        self
    }

    // Sets the click budget, this will override the configuration.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.settings.retry.max_attempts = max_attempts;
        self
    }

    // Sets the daemon cadence, this will override the configuration.
    pub fn daemon_cadence(mut self, cadence: Duration) -> Self {
        self.settings.daemon.cadence_ms = cadence.as_millis() as u64;
        self
    }

    pub fn build(self) -> Result<Coordinator, AppError> {
        let device = self
            .device
            .ok_or(AppError::Coordinator("Device not set".to_string()))?;
        let matcher = self
            .matcher
            .ok_or(AppError::Coordinator("Matcher not set".to_string()))?;

        let navigation = self.settings.navigation.clone();
        let navigator = match self.graph {
            Some(graph) => Navigator::new(graph, navigation),
            None => Navigator::standard(navigation)?,
        }
        .with_recovery_buttons(self.recovery)
        .with_diagnostics(self.settings.diagnostics());

        Ok(Coordinator {
            ui: Perception::new(device, matcher),
            navigator,
            chain: self.chain.unwrap_or_else(default_chain),
            daemon: InterruptDaemon::new(),
            settings: self.settings,
        })
    }
}
