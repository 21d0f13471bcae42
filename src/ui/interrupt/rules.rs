use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::common::{Button, Offset};
use crate::device::DEFAULT_SIMILARITY;
use crate::error::AppError;
use crate::ui::interrupt::InterruptRule;
use crate::ui::perception::Perception;

const DEFAULT_OFFSET: Offset = Offset::symmetric(30, 30);
const DEFAULT_INTERVAL: Duration = Duration::from_secs(3);

/// Click the element itself when it shows up.
pub struct AppearThenClick {
    button: Button,
    offset: Offset,
    interval: Duration,
    similarity: f32,
    resets: Vec<Button>,
}

impl AppearThenClick {
    pub fn new(button: Button) -> Self {
        Self {
            button,
            offset: DEFAULT_OFFSET,
            interval: DEFAULT_INTERVAL,
            similarity: DEFAULT_SIMILARITY,
            resets: Vec::new(),
        }
    }

    pub fn offset(mut self, offset: Offset) -> Self {
        self.offset = offset;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn similarity(mut self, similarity: f32) -> Self {
        self.similarity = similarity;
        self
    }

    /// Intervals reset after a click, so related popups are not matched on a stale frame.
    pub fn resets(mut self, buttons: &[Button]) -> Self {
        self.resets.extend_from_slice(buttons);
        self
    }
}

#[async_trait]
impl InterruptRule for AppearThenClick {
    fn name(&self) -> &str {
        self.button.name
    }

    async fn handle(&mut self, ui: &mut Perception) -> Result<bool, AppError> {
        if !ui.appear_with_similarity(&self.button, self.offset, self.interval, self.similarity) {
            return Ok(false);
        }
        ui.click(&self.button).await?;
        for button in &self.resets {
            ui.interval_reset(button);
        }
        Ok(true)
    }
}

/// Seeing one element means clicking another.
///
/// With fallbacks, or when the target must be visible, the first visible target
/// is clicked and the rule does not handle anything if none is.
pub struct RedirectRule {
    triggers: Vec<(Button, Offset)>,
    target: Button,
    fallbacks: Vec<Button>,
    require_visible: bool,
    interval: Duration,
    similarity: f32,
    resets: Vec<Button>,
}

impl RedirectRule {
    pub fn new(trigger: Button, target: Button) -> Self {
        Self {
            triggers: vec![(trigger, DEFAULT_OFFSET)],
            target,
            fallbacks: Vec::new(),
            require_visible: false,
            interval: DEFAULT_INTERVAL,
            similarity: DEFAULT_SIMILARITY,
            resets: Vec::new(),
        }
    }

    /// Tolerance box of the most recently added trigger.
    pub fn trigger_offset(mut self, offset: Offset) -> Self {
        if let Some(last) = self.triggers.last_mut() {
            last.1 = offset;
        }
        self
    }

    pub fn or_trigger(mut self, trigger: Button, offset: Offset) -> Self {
        self.triggers.push((trigger, offset));
        self
    }

    pub fn require_visible(mut self) -> Self {
        self.require_visible = true;
        self
    }

    pub fn fallback(mut self, target: Button) -> Self {
        self.fallbacks.push(target);
        self.require_visible = true;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn similarity(mut self, similarity: f32) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn resets(mut self, buttons: &[Button]) -> Self {
        self.resets.extend_from_slice(buttons);
        self
    }

    fn triggered(&self, ui: &mut Perception) -> Option<Button> {
        self.triggers
            .iter()
            .find(|(button, offset)| {
                ui.appear_with_similarity(button, *offset, self.interval, self.similarity)
            })
            .map(|(button, _)| *button)
    }

    fn visible_target(&self, ui: &Perception) -> Option<Button> {
        std::iter::once(&self.target)
            .chain(self.fallbacks.iter())
            .find(|target| ui.matches(target, DEFAULT_OFFSET))
            .copied()
    }
}

#[async_trait]
impl InterruptRule for RedirectRule {
    fn name(&self) -> &str {
        self.triggers
            .first()
            .map(|(button, _)| button.name)
            .unwrap_or(self.target.name)
    }

    async fn handle(&mut self, ui: &mut Perception) -> Result<bool, AppError> {
        let Some(trigger) = self.triggered(ui) else {
            return Ok(false);
        };
        let target = if self.require_visible {
            match self.visible_target(ui) {
                Some(target) => target,
                None => return Ok(false),
            }
        } else {
            self.target
        };
        info!("UI additional: {} -> {}", trigger, target);
        ui.click(&target).await?;
        for button in &self.resets {
            ui.interval_reset(button);
        }
        Ok(true)
    }
}

/// A click that signals an unmet precondition when it keeps being needed.
///
/// Once `max_clicks` clicks were issued, the next time the element shows up
/// fails with [`AppError::HumanTakeover`] instead of clicking again. The owner
/// restores the budget with [`InterruptRule::reset_budget`] when the flow that
/// needed the clicks is over.
pub struct BoundedClick {
    button: Button,
    offset: Offset,
    interval: Duration,
    max_clicks: u32,
    clicks: u32,
    hints: Vec<&'static str>,
    resets: Vec<Button>,
}

impl BoundedClick {
    pub fn new(button: Button, max_clicks: u32) -> Self {
        Self {
            button,
            offset: DEFAULT_OFFSET,
            interval: DEFAULT_INTERVAL,
            max_clicks,
            clicks: 0,
            hints: Vec::new(),
            resets: Vec::new(),
        }
    }

    pub fn offset(mut self, offset: Offset) -> Self {
        self.offset = offset;
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Operator-facing explanation logged when the budget runs out.
    pub fn hint(mut self, hint: &'static str) -> Self {
        self.hints.push(hint);
        self
    }

    pub fn resets(mut self, buttons: &[Button]) -> Self {
        self.resets.extend_from_slice(buttons);
        self
    }

    pub fn clicks(&self) -> u32 {
        self.clicks
    }
}

#[async_trait]
impl InterruptRule for BoundedClick {
    fn name(&self) -> &str {
        self.button.name
    }

    fn reset_budget(&mut self) {
        if self.clicks > 0 {
            debug!("{} click budget restored after {} clicks", self.button, self.clicks);
        }
        self.clicks = 0;
    }

    async fn handle(&mut self, ui: &mut Perception) -> Result<bool, AppError> {
        if !ui.appear(&self.button, self.offset, self.interval) {
            return Ok(false);
        }
        if self.clicks >= self.max_clicks {
            error!("Too many click on {}", self.button);
            for (i, hint) in self.hints.iter().enumerate() {
                error!("Possible reason #{}: {}", i + 1, hint);
            }
            return Err(AppError::HumanTakeover(format!(
                "Too many click on {}",
                self.button
            )));
        }
        ui.click(&self.button).await?;
        self.clicks += 1;
        for button in &self.resets {
            ui.interval_reset(button);
        }
        Ok(true)
    }
}

/// Waits for an animation to settle before trusting the element.
///
/// The element is clicked only if it is still there on a fresh frame taken
/// after the pause; otherwise the rule falls through.
pub struct SettleThenClick {
    button: Button,
    offset: Offset,
    interval: Duration,
    settle: Duration,
}

impl SettleThenClick {
    pub fn new(button: Button, settle: Duration) -> Self {
        Self {
            button,
            offset: DEFAULT_OFFSET,
            interval: DEFAULT_INTERVAL,
            settle,
        }
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

#[async_trait]
impl InterruptRule for SettleThenClick {
    fn name(&self) -> &str {
        self.button.name
    }

    async fn handle(&mut self, ui: &mut Perception) -> Result<bool, AppError> {
        if !ui.appear(&self.button, self.offset, self.interval) {
            return Ok(false);
        }
        info!("{} found, wait until the page settles", self.button);
        ui.sleep(self.settle).await;
        ui.screenshot().await?;

        let clicked = ui
            .appear_then_click(&self.button, self.offset, Duration::ZERO)
            .await?;
        ui.interval_reset(&self.button);
        if !clicked {
            warn!("{} does not exist anymore", self.button);
        }
        Ok(clicked)
    }
}

/// Brightness-only match of any of several screens, sharing one interval timer.
pub struct LumaRule {
    checks: Vec<Button>,
    target: Button,
    offset: Offset,
    interval: Duration,
}

impl LumaRule {
    pub fn new(check: Button, target: Button) -> Self {
        Self {
            checks: vec![check],
            target,
            offset: Offset::symmetric(5, 5),
            interval: DEFAULT_INTERVAL,
        }
    }

    pub fn or_check(mut self, check: Button) -> Self {
        self.checks.push(check);
        self
    }

    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    fn timer_key(&self) -> &Button {
        &self.checks[0]
    }
}

#[async_trait]
impl InterruptRule for LumaRule {
    fn name(&self) -> &str {
        self.timer_key().name
    }

    async fn handle(&mut self, ui: &mut Perception) -> Result<bool, AppError> {
        let key = *self.timer_key();
        if !ui.interval_timer(&key, self.interval).reached() {
            return Ok(false);
        }
        let Some(check) = self
            .checks
            .iter()
            .find(|check| ui.match_luma(check, self.offset))
            .copied()
        else {
            return Ok(false);
        };
        info!("UI additional: {} -> {}", check, self.target);
        ui.click(&self.target).await?;
        ui.interval_timer(&key, self.interval).reset();
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Area;
    use crate::device::simulator::Simulator;

    const fn button(name: &'static str) -> Button {
        Button::simple(name, Area::new(0, 0, 10, 10), [0, 0, 0])
    }

    const RESET_FLEET: Button = button("RESET_FLEET");
    const PLAYER_CHECK: Button = button("PLAYER_CHECK");
    const GOTO_MAIN: Button = button("GOTO_MAIN");
    const BACK_ARROW: Button = button("BACK_ARROW");
    const WITHDRAW: Button = button("WITHDRAW");
    const IDLE: Button = button("IDLE");
    const IDLE_2: Button = button("IDLE_2");
    const REWARD_GOTO_MAIN: Button = button("REWARD_GOTO_MAIN");

    fn perception(sim: &Simulator) -> Perception {
        Perception::new(Box::new(sim.device()), Box::new(sim.matcher()))
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_click_escalates_after_budget() {
        let sim = Simulator::builder()
            .screen("fleet", [RESET_FLEET])
            .start("fleet")
            .build()
            .unwrap();
        let mut ui = perception(&sim);
        let mut rule = BoundedClick::new(RESET_FLEET, 3).hint("No fleet configured");

        for _ in 0..3 {
            ui.screenshot().await.unwrap();
            assert!(rule.handle(&mut ui).await.unwrap());
            tokio::time::advance(Duration::from_secs(4)).await;
        }
        ui.screenshot().await.unwrap();
        let err = rule.handle(&mut ui).await.unwrap_err();
        assert!(matches!(err, AppError::HumanTakeover(_)));
        assert_eq!(sim.click_count(&RESET_FLEET), 3);

        rule.reset_budget();
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(rule.handle(&mut ui).await.unwrap());
        assert_eq!(rule.clicks(), 1);
        assert_eq!(sim.click_count(&RESET_FLEET), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn spent_budget_is_harmless_while_element_is_gone() {
        let sim = Simulator::builder()
            .screen("fleet", [RESET_FLEET])
            .screen("clean", Vec::<Button>::new())
            .show_at(2, "clean")
            .start("fleet")
            .build()
            .unwrap();
        let mut ui = perception(&sim);
        let mut rule = BoundedClick::new(RESET_FLEET, 1);

        ui.screenshot().await.unwrap();
        assert!(rule.handle(&mut ui).await.unwrap());
        tokio::time::advance(Duration::from_secs(4)).await;
        ui.screenshot().await.unwrap();
        assert!(!rule.handle(&mut ui).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn redirect_uses_first_visible_target() {
        let sim = Simulator::builder()
            .screen("player", [PLAYER_CHECK, BACK_ARROW])
            .start("player")
            .build()
            .unwrap();
        let mut ui = perception(&sim);
        let mut rule = RedirectRule::new(PLAYER_CHECK, GOTO_MAIN).fallback(BACK_ARROW);

        ui.screenshot().await.unwrap();
        assert!(rule.handle(&mut ui).await.unwrap());
        assert_eq!(sim.clicked_buttons(), vec!["BACK_ARROW"]);
    }

    #[tokio::test(start_paused = true)]
    async fn redirect_without_visible_target_falls_through() {
        let sim = Simulator::builder()
            .screen("player", [PLAYER_CHECK])
            .start("player")
            .build()
            .unwrap();
        let mut ui = perception(&sim);
        let mut rule = RedirectRule::new(PLAYER_CHECK, GOTO_MAIN).require_visible();

        ui.screenshot().await.unwrap();
        assert!(!rule.handle(&mut ui).await.unwrap());
        assert!(sim.clicked_buttons().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn settle_then_click_rechecks_after_pause() {
        let sim = Simulator::builder()
            .screen("map", [WITHDRAW])
            .start("map")
            .build()
            .unwrap();
        let mut ui = perception(&sim);
        let mut rule = SettleThenClick::new(WITHDRAW, Duration::from_secs(2));

        ui.screenshot().await.unwrap();
        assert!(rule.handle(&mut ui).await.unwrap());
        assert_eq!(sim.tick(), 2);
        assert_eq!(sim.clicked_buttons(), vec!["WITHDRAW"]);
    }

    #[tokio::test(start_paused = true)]
    async fn settle_then_click_skips_vanished_element() {
        let sim = Simulator::builder()
            .screen("map", [WITHDRAW])
            .screen("loaded", Vec::<Button>::new())
            .show_at(2, "loaded")
            .start("map")
            .build()
            .unwrap();
        let mut ui = perception(&sim);
        let mut rule = SettleThenClick::new(WITHDRAW, Duration::from_secs(2));

        ui.screenshot().await.unwrap();
        assert!(!rule.handle(&mut ui).await.unwrap());
        assert!(sim.clicked_buttons().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn luma_rule_shares_one_timer() {
        let sim = Simulator::builder()
            .screen("idle", [IDLE_2])
            .start("idle")
            .build()
            .unwrap();
        let mut ui = perception(&sim);
        let mut rule = LumaRule::new(IDLE, REWARD_GOTO_MAIN).or_check(IDLE_2);

        ui.screenshot().await.unwrap();
        assert!(rule.handle(&mut ui).await.unwrap());
        assert!(!rule.handle(&mut ui).await.unwrap());
        tokio::time::advance(Duration::from_millis(3_100)).await;
        assert!(rule.handle(&mut ui).await.unwrap());
        assert_eq!(sim.click_count(&REWARD_GOTO_MAIN), 2);
    }
}
