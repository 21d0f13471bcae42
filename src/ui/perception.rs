use std::ops::RangeInclusive;
use std::time::Duration;

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::common::{Area, Button, Frame, Offset, Timer};
use crate::device::{Device, Matcher, DEFAULT_SIMILARITY};
use crate::error::AppError;

const DEFAULT_RESET_INTERVAL: Duration = Duration::from_secs(3);

/// The navigation core's view of the screen.
///
/// Owns the device and matcher, the last captured frame, and one interval timer
/// per element name. All element queries run against the cached frame; only
/// [`Perception::screenshot`] refreshes it.
pub struct Perception {
    device: Box<dyn Device>,
    matcher: Box<dyn Matcher>,
    frame: Option<Frame>,
    intervals: IndexMap<&'static str, Timer>,
}

impl Perception {
    pub fn new(device: Box<dyn Device>, matcher: Box<dyn Matcher>) -> Self {
        Self {
            device,
            matcher,
            frame: None,
            intervals: IndexMap::new(),
        }
    }

    pub async fn screenshot(&mut self) -> Result<&Frame, AppError> {
        let frame = self.device.capture().await?;
        Ok(self.frame.insert(frame))
    }

    pub fn has_cached_frame(&self) -> bool {
        self.frame.is_some()
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    /// Element presence, rate-limited per element.
    ///
    /// With a non-zero `interval` the element is reported at most once per
    /// interval: the timer is checked before matching and reset on a match.
    pub fn appear(&mut self, button: &Button, offset: Offset, interval: Duration) -> bool {
        self.appear_with_similarity(button, offset, interval, DEFAULT_SIMILARITY)
    }

    pub fn appear_with_similarity(
        &mut self,
        button: &Button,
        offset: Offset,
        interval: Duration,
        similarity: f32,
    ) -> bool {
        if !interval.is_zero() {
            let timer = self.interval_timer(button, interval);
            if !timer.reached() {
                return false;
            }
        }

        let appear = self.matches_with_similarity(button, offset, similarity);
        if appear && !interval.is_zero() {
            self.interval_reset(button);
        }
        appear
    }

    /// Presence on the cached frame, without touching interval timers.
    pub fn matches(&self, button: &Button, offset: Offset) -> bool {
        self.matches_with_similarity(button, offset, DEFAULT_SIMILARITY)
    }

    fn matches_with_similarity(&self, button: &Button, offset: Offset, similarity: f32) -> bool {
        match &self.frame {
            Some(frame) => self.matcher.appear(frame, button, offset, similarity),
            None => false,
        }
    }

    pub fn match_luma(&self, button: &Button, offset: Offset) -> bool {
        match &self.frame {
            Some(frame) => self.matcher.match_luma(frame, button, offset),
            None => false,
        }
    }

    pub async fn click(&mut self, button: &Button) -> Result<(), AppError> {
        info!("Click {}", button);
        self.device.click(button).await
    }

    pub async fn multi_click(
        &mut self,
        button: &Button,
        n: u32,
        interval: RangeInclusive<Duration>,
    ) -> Result<(), AppError> {
        info!("Click {} x{}", button, n);
        self.device.multi_click(button, n, interval).await
    }

    pub async fn appear_then_click(
        &mut self,
        button: &Button,
        offset: Offset,
        interval: Duration,
    ) -> Result<bool, AppError> {
        if self.appear(button, offset, interval) {
            self.click(button).await?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Timer for `button`, created on first use.
    ///
    /// A different `interval` only changes the limit: a pending reset keeps
    /// holding the element back, now for the new interval.
    pub fn interval_timer(&mut self, button: &Button, interval: Duration) -> &mut Timer {
        let timer = self
            .intervals
            .entry(button.name)
            .or_insert_with(|| Timer::new(interval));
        if timer.limit() != interval {
            timer.set_limit(interval);
        }
        timer
    }

    /// Blocks throttled matches of `button` for its interval, starting now.
    pub fn interval_reset(&mut self, button: &Button) {
        debug!("Interval reset {}", button);
        self.intervals
            .entry(button.name)
            .or_insert_with(|| Timer::new(DEFAULT_RESET_INTERVAL))
            .reset();
    }

    /// Lets the next throttled match of `button` through immediately.
    pub fn interval_clear(&mut self, button: &Button) {
        if let Some(timer) = self.intervals.get_mut(button.name) {
            timer.clear();
        }
    }

    pub fn ocr_index(&self, area: &Area) -> Option<i32> {
        self.frame
            .as_ref()
            .and_then(|frame| self.matcher.ocr_index(frame, area))
    }

    pub async fn sleep(&mut self, duration: Duration) {
        self.device.sleep(duration).await;
    }

    pub async fn app_is_running(&mut self) -> Result<bool, AppError> {
        self.device.app_is_running().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::simulator::Simulator;

    const NOTICE: Button = Button::simple("NOTICE", Area::new(0, 0, 10, 10), [0, 0, 0]);

    fn perception(sim: &Simulator) -> Perception {
        Perception::new(Box::new(sim.device()), Box::new(sim.matcher()))
    }

    fn simulator() -> Simulator {
        Simulator::builder()
            .screen("home", [NOTICE])
            .start("home")
            .build()
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn no_frame_means_nothing_appears() {
        let sim = simulator();
        let mut ui = perception(&sim);
        assert!(!ui.has_cached_frame());
        assert!(!ui.appear(&NOTICE, Offset::NONE, Duration::ZERO));
        ui.screenshot().await.unwrap();
        assert!(ui.appear(&NOTICE, Offset::NONE, Duration::ZERO));
    }

    #[tokio::test(start_paused = true)]
    async fn interval_throttles_repeated_matches() {
        let sim = simulator();
        let mut ui = perception(&sim);
        let interval = Duration::from_secs(3);

        ui.screenshot().await.unwrap();
        assert!(ui.appear(&NOTICE, Offset::NONE, interval));
        assert!(!ui.appear(&NOTICE, Offset::NONE, interval));
        // The unthrottled query is unaffected.
        assert!(ui.matches(&NOTICE, Offset::NONE));

        tokio::time::advance(Duration::from_millis(3_100)).await;
        assert!(ui.appear(&NOTICE, Offset::NONE, interval));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_holds_back_a_longer_interval() {
        let sim = simulator();
        let mut ui = perception(&sim);
        let interval = Duration::from_secs(5);

        ui.screenshot().await.unwrap();
        ui.interval_reset(&NOTICE);
        assert!(!ui.appear(&NOTICE, Offset::NONE, interval));
        tokio::time::advance(Duration::from_millis(3_500)).await;
        assert!(!ui.appear(&NOTICE, Offset::NONE, interval));
        tokio::time::advance(Duration::from_millis(1_600)).await;
        assert!(ui.appear(&NOTICE, Offset::NONE, interval));
    }

    #[tokio::test(start_paused = true)]
    async fn interval_clear_lets_next_match_through() {
        let sim = simulator();
        let mut ui = perception(&sim);
        let interval = Duration::from_secs(5);

        ui.screenshot().await.unwrap();
        assert!(ui.appear(&NOTICE, Offset::NONE, interval));
        ui.interval_clear(&NOTICE);
        assert!(ui.appear(&NOTICE, Offset::NONE, interval));
    }

    #[tokio::test(start_paused = true)]
    async fn appear_then_click_reaches_device() {
        let sim = simulator();
        let mut ui = perception(&sim);

        ui.screenshot().await.unwrap();
        assert!(ui
            .appear_then_click(&NOTICE, Offset::NONE, Duration::from_secs(3))
            .await
            .unwrap());
        assert!(!ui
            .appear_then_click(&NOTICE, Offset::NONE, Duration::from_secs(3))
            .await
            .unwrap());
        assert_eq!(sim.clicked_buttons(), vec!["NOTICE"]);
    }
}
