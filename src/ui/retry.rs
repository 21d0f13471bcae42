use std::ops::RangeInclusive;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::common::{Area, Button, Offset, Timer};
use crate::config::RetrySettings;
use crate::error::AppError;
use crate::ui::catalog::BACK_ARROW;
use crate::ui::check::CheckCondition;
use crate::ui::interrupt::InterruptChain;
use crate::ui::perception::Perception;

/// Ticks an unreadable index is tolerated before giving up.
const UNREADABLE_INDEX_LIMIT: u32 = 20;

/// Click something until a condition holds, with a bounded number of clicks.
///
/// Each tick: sample, then check arrival (it must hold for the whole confirm
/// window), then give the interrupt hook first refusal, then click if the retry
/// wait has passed and the trigger is visible. Once `max_attempts` clicks were
/// issued, needing another one is fatal.
#[derive(Debug, Clone)]
pub struct ClickAndConfirm {
    click: Button,
    check: CheckCondition,
    appear: Option<CheckCondition>,
    offset: Offset,
    retry_wait: Duration,
    confirm_wait: Duration,
    max_attempts: u32,
    skip_first_screenshot: bool,
}

impl ClickAndConfirm {
    pub fn new(click: Button, check: impl Into<CheckCondition>) -> Self {
        let defaults = RetrySettings::default();
        Self {
            click,
            check: check.into(),
            appear: None,
            offset: Offset::symmetric(30, 30),
            retry_wait: defaults.retry_wait(),
            confirm_wait: defaults.confirm_wait(),
            max_attempts: defaults.max_attempts,
            skip_first_screenshot: false,
        }
    }

    /// Tap the back arrow until `check` holds.
    pub fn back(check: impl Into<CheckCondition>) -> Self {
        Self::new(BACK_ARROW, check)
    }

    pub fn with_settings(mut self, settings: &RetrySettings) -> Self {
        self.retry_wait = settings.retry_wait();
        self.confirm_wait = settings.confirm_wait();
        self.max_attempts = settings.max_attempts;
        self
    }

    /// Only click while this holds. Defaults to the click target being visible.
    pub fn appear_when(mut self, condition: impl Into<CheckCondition>) -> Self {
        self.appear = Some(condition.into());
        self
    }

    pub fn offset(mut self, offset: Offset) -> Self {
        self.offset = offset;
        self
    }

    pub fn retry_wait(mut self, wait: Duration) -> Self {
        self.retry_wait = wait;
        self
    }

    pub fn confirm_wait(mut self, wait: Duration) -> Self {
        self.confirm_wait = wait;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn skip_first_screenshot(mut self, skip: bool) -> Self {
        self.skip_first_screenshot = skip;
        self
    }

    /// Returns the number of clicks it took.
    pub async fn perform(
        &self,
        ui: &mut Perception,
        mut hook: Option<&mut InterruptChain>,
    ) -> Result<u32, AppError> {
        info!("UI click {} -> {}", self.click, self.check);
        let trigger = self
            .appear
            .clone()
            .unwrap_or(CheckCondition::Single(self.click));
        let mut click_timer = Timer::with_default_count(self.retry_wait);
        let mut confirm_timer = Timer::with_default_count(self.confirm_wait).start();
        let mut attempts = 0;
        let mut skip_first_screenshot = self.skip_first_screenshot;

        loop {
            if skip_first_screenshot {
                skip_first_screenshot = false;
                if !ui.has_cached_frame() {
                    ui.screenshot().await?;
                }
            } else {
                ui.screenshot().await?;
            }

            if self.check.evaluate(ui, self.offset, Duration::ZERO) {
                if confirm_timer.reached() {
                    info!("{} confirmed after {} clicks", self.check, attempts);
                    return Ok(attempts);
                }
            } else {
                confirm_timer.reset();
            }

            if let Some(chain) = hook.as_deref_mut() {
                if chain.run_once(ui).await? {
                    click_timer.reset();
                    confirm_timer.reset();
                    continue;
                }
            }

            if click_timer.reached() && trigger.evaluate(ui, self.offset, Duration::ZERO) {
                if attempts >= self.max_attempts {
                    error!(
                        "Failed to reach {}, too many click on {}",
                        self.check, self.click
                    );
                    return Err(AppError::HumanTakeover(format!(
                        "Too many click on {}",
                        self.click
                    )));
                }
                ui.click(&self.click).await?;
                attempts += 1;
                click_timer.reset();
            }
        }
    }
}

/// Steps a paginated view with next/previous until an OCR-read index matches.
#[derive(Debug, Clone)]
pub struct IndexAligner {
    area: Area,
    next: Button,
    prev: Button,
    fast: bool,
    click_interval: RangeInclusive<Duration>,
    retry: Duration,
    max_attempts: u32,
    skip_first_screenshot: bool,
}

impl IndexAligner {
    pub fn new(area: Area, next: Button, prev: Button) -> Self {
        let defaults = RetrySettings::default();
        Self {
            area,
            next,
            prev,
            fast: true,
            click_interval: Duration::from_millis(200)..=Duration::from_millis(300),
            retry: defaults.index_interval(),
            max_attempts: defaults.max_attempts,
            skip_first_screenshot: false,
        }
    }

    pub fn with_settings(mut self, settings: &RetrySettings) -> Self {
        self.retry = settings.index_interval();
        self.max_attempts = settings.max_attempts;
        self
    }

    /// In fast mode the whole distance is clicked in one burst; otherwise one step per retry.
    pub fn fast(mut self, fast: bool) -> Self {
        self.fast = fast;
        self
    }

    pub fn click_interval(mut self, interval: RangeInclusive<Duration>) -> Self {
        self.click_interval = interval;
        self
    }

    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    pub fn skip_first_screenshot(mut self, skip: bool) -> Self {
        self.skip_first_screenshot = skip;
        self
    }

    /// Returns the number of click rounds it took.
    pub async fn ensure_index(&self, ui: &mut Perception, index: i32) -> Result<u32, AppError> {
        info!("UI ensure index {}", index);
        let mut retry = Timer::with_count(self.retry, 2);
        let mut attempts = 0;
        let mut unreadable = 0;
        let mut skip_first_screenshot = self.skip_first_screenshot;

        loop {
            if skip_first_screenshot {
                skip_first_screenshot = false;
                if !ui.has_cached_frame() {
                    ui.screenshot().await?;
                }
            } else {
                ui.screenshot().await?;
            }

            let Some(current) = ui.ocr_index(&self.area) else {
                unreadable += 1;
                if unreadable > UNREADABLE_INDEX_LIMIT {
                    error!("Index at {:?} is unreadable", self.area);
                    return Err(AppError::HumanTakeover("Index unreadable".to_string()));
                }
                warn!("Index unreadable");
                continue;
            };
            unreadable = 0;
            info!("Index: {}", current);

            let diff = index - current;
            if diff == 0 {
                return Ok(attempts);
            }

            if retry.reached() {
                if attempts >= self.max_attempts {
                    error!("Failed to align index to {}, stuck at {}", index, current);
                    return Err(AppError::HumanTakeover(format!(
                        "Index stuck at {}, expected {}",
                        current, index
                    )));
                }
                let button = if diff > 0 { &self.next } else { &self.prev };
                if self.fast {
                    ui.multi_click(button, diff.unsigned_abs(), self.click_interval.clone())
                        .await?;
                } else {
                    ui.click(button).await?;
                }
                attempts += 1;
                retry.reset();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::simulator::Simulator;
    use crate::ui::interrupt::AppearThenClick;

    const fn button(name: &'static str) -> Button {
        Button::simple(name, Area::new(0, 0, 10, 10), [0, 0, 0])
    }

    const ENTER: Button = button("ENTER");
    const STAGE_CHECK: Button = button("STAGE_CHECK");
    const POPUP: Button = button("POPUP");
    const NEXT: Button = button("NEXT");
    const PREV: Button = button("PREV");

    fn perception(sim: &Simulator) -> Perception {
        Perception::new(Box::new(sim.device()), Box::new(sim.matcher()))
    }

    fn stuck_simulator() -> Simulator {
        Simulator::builder()
            .screen("menu", [ENTER])
            .start("menu")
            .build()
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn click_reaches_destination() {
        let sim = Simulator::builder()
            .screen("menu", [ENTER])
            .screen("stage", [STAGE_CHECK])
            .transition("menu", ENTER, "stage")
            .start("menu")
            .build()
            .unwrap();
        let mut ui = perception(&sim);

        let clicks = ClickAndConfirm::new(ENTER, STAGE_CHECK)
            .perform(&mut ui, None)
            .await
            .unwrap();
        assert_eq!(clicks, 1);
        assert_eq!(sim.clicked_buttons(), vec!["ENTER"]);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_budget_clicks_exactly_max_attempts() {
        let sim = stuck_simulator();
        let mut ui = perception(&sim);

        let err = ClickAndConfirm::new(ENTER, STAGE_CHECK)
            .retry_wait(Duration::from_secs(1))
            .max_attempts(5)
            .perform(&mut ui, None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::HumanTakeover(_)));
        assert_eq!(sim.click_count(&ENTER), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn handled_interrupts_do_not_count_as_attempts() {
        // A popup keeps coming back over the menu; dismissing it is not a click attempt.
        let sim = Simulator::builder()
            .screen("menu", [ENTER])
            .overlay("popup", [POPUP], POPUP)
            .overlay_at(3, "popup")
            .overlay_at(8, "popup")
            .overlay_at(15, "popup")
            .start("menu")
            .build()
            .unwrap();
        let mut ui = perception(&sim);
        let mut chain = InterruptChain::new().with_rule(
            AppearThenClick::new(POPUP)
                .offset(Offset::NONE)
                .interval(Duration::ZERO),
        );

        let err = ClickAndConfirm::new(ENTER, STAGE_CHECK)
            .retry_wait(Duration::from_secs(1))
            .max_attempts(3)
            .perform(&mut ui, Some(&mut chain))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::HumanTakeover(_)));
        assert_eq!(sim.click_count(&ENTER), 3);
        assert_eq!(sim.click_count(&POPUP), 3);
    }

    fn flicker_simulator(visible_until: Option<u64>) -> Simulator {
        let builder = Simulator::builder()
            .screen("loading", Vec::<Button>::new())
            .screen("stage", [STAGE_CHECK])
            .show_at(3, "stage");
        let builder = match visible_until {
            Some(tick) => builder.show_at(tick, "loading"),
            None => builder,
        };
        builder.start("loading").build().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn short_lived_arrival_is_not_accepted() {
        // Frames every 100ms; STAGE_CHECK visible on ticks 3..=11, i.e. 900ms after the last miss.
        let sim = flicker_simulator(Some(12));
        let mut ui = perception(&sim);
        let confirm = ClickAndConfirm::new(ENTER, STAGE_CHECK).confirm_wait(Duration::from_secs(1));

        let result =
            tokio::time::timeout(Duration::from_secs(5), confirm.perform(&mut ui, None)).await;
        assert!(result.is_err());
        assert!(sim.clicked_buttons().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stable_arrival_is_accepted_after_window() {
        let sim = flicker_simulator(None);
        let mut ui = perception(&sim);
        let confirm = ClickAndConfirm::new(ENTER, STAGE_CHECK).confirm_wait(Duration::from_secs(1));

        let clicks = tokio::time::timeout(Duration::from_secs(5), confirm.perform(&mut ui, None))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(clicks, 0);
        // Last miss on tick 2, accepted on the first tick more than 1s later.
        assert_eq!(sim.tick(), 13);
    }

    #[tokio::test(start_paused = true)]
    async fn back_clicks_back_arrow() {
        let sim = Simulator::builder()
            .screen("detail", [BACK_ARROW])
            .screen("list", [STAGE_CHECK])
            .transition("detail", BACK_ARROW, "list")
            .start("detail")
            .build()
            .unwrap();
        let mut ui = perception(&sim);

        ClickAndConfirm::back(STAGE_CHECK)
            .perform(&mut ui, None)
            .await
            .unwrap();
        assert_eq!(sim.clicked_buttons(), vec![BACK_ARROW.name]);
    }

    fn paginated(start: i32) -> Simulator {
        Simulator::builder()
            .screen("list", [NEXT, PREV])
            .pagination("list", NEXT, PREV, start)
            .start("list")
            .build()
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn fast_alignment_clicks_the_distance_at_once() {
        let sim = paginated(1);
        let mut ui = perception(&sim);

        let rounds = IndexAligner::new(Area::new(0, 0, 50, 20), NEXT, PREV)
            .ensure_index(&mut ui, 4)
            .await
            .unwrap();
        assert_eq!(rounds, 1);
        assert_eq!(sim.click_count(&NEXT), 3);
        assert_eq!(sim.index(), Some(4));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_alignment_steps_back() {
        let sim = paginated(5);
        let mut ui = perception(&sim);

        let rounds = IndexAligner::new(Area::new(0, 0, 50, 20), NEXT, PREV)
            .fast(false)
            .ensure_index(&mut ui, 3)
            .await
            .unwrap();
        assert_eq!(rounds, 2);
        assert_eq!(sim.click_count(&PREV), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn unreadable_index_gives_up() {
        let sim = stuck_simulator();
        let mut ui = perception(&sim);

        let err = IndexAligner::new(Area::new(0, 0, 50, 20), NEXT, PREV)
            .ensure_index(&mut ui, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::HumanTakeover(_)));
        assert!(sim.clicked_buttons().is_empty());
    }
}
