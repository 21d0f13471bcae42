//! Scripted stand-in for a real device.
//!
//! A simulator is a set of named screens, each showing some elements, plus the
//! screen a tap on a given element leads to. Overlays sit on top of the current
//! screen until their dismiss element is tapped. Screens and overlays can also be
//! forced onto the display at a given tick, one tick being one capture.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use indexmap::IndexMap;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::common::{Area, Button, Frame, Offset};
use crate::device::{Device, Matcher};
use crate::error::AppError;
use crate::ui::page::PageGraph;
use crate::ui::PageId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickRecord {
    pub tick: u64,
    pub screen: &'static str,
    pub button: &'static str,
}

#[derive(Debug, Clone, Copy)]
enum Transition {
    To(&'static str),
    Dismiss,
    NextIndex,
    PreviousIndex,
}

#[derive(Debug, Clone, Copy)]
enum Scheduled {
    Show(&'static str),
    Overlay(&'static str),
}

#[derive(Debug)]
struct SimState {
    screens: IndexMap<&'static str, Vec<&'static str>>,
    transitions: IndexMap<(&'static str, &'static str), Transition>,
    schedule: Vec<(u64, Scheduled)>,
    current: &'static str,
    overlays: Vec<&'static str>,
    tick: u64,
    captured: Vec<&'static str>,
    captured_index: Option<i32>,
    index: Option<i32>,
    clicks: Vec<ClickRecord>,
    frame_interval: Duration,
    running: bool,
}

impl SimState {
    fn displayed(&self) -> &'static str {
        self.overlays.last().copied().unwrap_or(self.current)
    }

    fn advance_tick(&mut self) {
        self.tick += 1;
        let tick = self.tick;
        let due: Vec<Scheduled> = self
            .schedule
            .iter()
            .filter(|(at, _)| *at == tick)
            .map(|(_, event)| *event)
            .collect();
        for event in due {
            match event {
                Scheduled::Show(screen) => {
                    debug!("Simulator tick {}: show {}", tick, screen);
                    self.current = screen;
                    self.overlays.clear();
                }
                Scheduled::Overlay(screen) => {
                    debug!("Simulator tick {}: overlay {}", tick, screen);
                    self.overlays.push(screen);
                }
            }
        }
        self.captured = self
            .screens
            .get(self.displayed())
            .cloned()
            .unwrap_or_default();
        self.captured_index = self.index;
    }

    fn tap(&mut self, button: &Button) {
        let screen = self.displayed();
        self.clicks.push(ClickRecord {
            tick: self.tick,
            screen,
            button: button.name,
        });
        match self.transitions.get(&(screen, button.name)).copied() {
            Some(Transition::To(next)) => {
                self.current = next;
                self.overlays.clear();
            }
            Some(Transition::Dismiss) => {
                self.overlays.pop();
            }
            Some(Transition::NextIndex) => {
                self.index = self.index.map(|i| i + 1);
            }
            Some(Transition::PreviousIndex) => {
                self.index = self.index.map(|i| i - 1);
            }
            None => trace!("Simulator: {} on {} does nothing", button.name, screen),
        }
    }
}

/// Handle shared by the simulated device and matcher, and by tests inspecting them.
#[derive(Debug, Clone)]
pub struct Simulator {
    state: Arc<Mutex<SimState>>,
    device_id: Uuid,
}

impl Simulator {
    pub fn builder() -> SimulatorBuilder {
        SimulatorBuilder::new()
    }

    /// One screen per declared page, showing its check elements, wired with its links.
    pub fn from_graph(graph: &PageGraph, start: PageId) -> SimulatorBuilder {
        let mut builder = SimulatorBuilder::new();
        for page in graph.iter_pages() {
            let visible = page
                .check()
                .map(|check| check.buttons())
                .unwrap_or_default();
            builder = builder.screen(page.id().name(), visible);
        }
        for page in graph.iter_pages() {
            for (to, button) in page.links() {
                builder = builder.transition(page.id().name(), *button, to.name());
            }
        }
        builder.start(start.name())
    }

    pub fn device(&self) -> SimulatedDevice {
        SimulatedDevice {
            state: Arc::clone(&self.state),
            device_id: self.device_id,
        }
    }

    pub fn matcher(&self) -> SimulatedMatcher {
        SimulatedMatcher {
            state: Arc::clone(&self.state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        // A poisoned lock only means a test panicked mid-update; the data is still readable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn clicks(&self) -> Vec<ClickRecord> {
        self.lock().clicks.clone()
    }

    pub fn clicked_buttons(&self) -> Vec<&'static str> {
        self.lock().clicks.iter().map(|c| c.button).collect()
    }

    pub fn click_count(&self, button: &Button) -> usize {
        self.lock()
            .clicks
            .iter()
            .filter(|c| c.button == button.name)
            .count()
    }

    pub fn tick(&self) -> u64 {
        self.lock().tick
    }

    pub fn displayed(&self) -> &'static str {
        self.lock().displayed()
    }

    pub fn index(&self) -> Option<i32> {
        self.lock().index
    }

    pub fn set_running(&self, running: bool) {
        self.lock().running = running;
    }
}

pub struct SimulatorBuilder {
    screens: IndexMap<&'static str, Vec<&'static str>>,
    transitions: IndexMap<(&'static str, &'static str), Transition>,
    schedule: Vec<(u64, Scheduled)>,
    start: Option<&'static str>,
    index: Option<i32>,
    frame_interval: Duration,
    running: bool,
}

impl SimulatorBuilder {
    pub fn new() -> Self {
        Self {
            screens: IndexMap::new(),
            transitions: IndexMap::new(),
            schedule: Vec::new(),
            start: None,
            index: None,
            frame_interval: Duration::from_millis(100),
            running: true,
        }
    }

    pub fn screen(mut self, name: &'static str, visible: impl IntoIterator<Item = Button>) -> Self {
        let visible = visible.into_iter().map(|b| b.name).collect();
        self.screens.insert(name, visible);
        self
    }

    /// An overlay screen that goes away when `dismiss` is tapped.
    pub fn overlay(
        self,
        name: &'static str,
        visible: impl IntoIterator<Item = Button>,
        dismiss: Button,
    ) -> Self {
        let mut builder = self.screen(name, visible);
        builder
            .transitions
            .insert((name, dismiss.name), Transition::Dismiss);
        builder
    }

    pub fn transition(mut self, from: &'static str, button: Button, to: &'static str) -> Self {
        self.transitions
            .insert((from, button.name), Transition::To(to));
        self
    }

    /// `next`/`prev` on `screen` move an OCR-readable index starting at `start`.
    pub fn pagination(mut self, screen: &'static str, next: Button, prev: Button, start: i32) -> Self {
        self.transitions
            .insert((screen, next.name), Transition::NextIndex);
        self.transitions
            .insert((screen, prev.name), Transition::PreviousIndex);
        self.index = Some(start);
        self
    }

    pub fn show_at(mut self, tick: u64, screen: &'static str) -> Self {
        self.schedule.push((tick, Scheduled::Show(screen)));
        self
    }

    pub fn overlay_at(mut self, tick: u64, overlay: &'static str) -> Self {
        self.schedule.push((tick, Scheduled::Overlay(overlay)));
        self
    }

    pub fn start(mut self, screen: &'static str) -> Self {
        self.start = Some(screen);
        self
    }

    pub fn frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn not_running(mut self) -> Self {
        self.running = false;
        self
    }

    pub fn build(self) -> Result<Simulator, AppError> {
        let start = self
            .start
            .ok_or_else(|| AppError::Device("Simulator start screen not set".to_string()))?;
        let known = |screen: &str| self.screens.contains_key(screen);
        if !known(start) {
            return Err(AppError::Device(format!("Unknown start screen {}", start)));
        }
        for (_, event) in &self.schedule {
            let (Scheduled::Show(screen) | Scheduled::Overlay(screen)) = event;
            if !known(screen) {
                return Err(AppError::Device(format!("Unknown scheduled screen {}", screen)));
            }
        }
        for ((from, _), transition) in &self.transitions {
            if !known(from) {
                return Err(AppError::Device(format!("Unknown screen {}", from)));
            }
            if let Transition::To(to) = transition {
                if !known(to) {
                    return Err(AppError::Device(format!("Unknown screen {}", to)));
                }
            }
        }
        let state = SimState {
            screens: self.screens,
            transitions: self.transitions,
            schedule: self.schedule,
            current: start,
            overlays: Vec::new(),
            tick: 0,
            captured: Vec::new(),
            captured_index: None,
            index: self.index,
            clicks: Vec::new(),
            frame_interval: self.frame_interval,
            running: self.running,
        };
        Ok(Simulator {
            state: Arc::new(Mutex::new(state)),
            device_id: Uuid::new_v4(),
        })
    }
}

impl Default for SimulatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct SimulatedDevice {
    state: Arc<Mutex<SimState>>,
    device_id: Uuid,
}

impl SimulatedDevice {
    fn lock(&self) -> Result<MutexGuard<'_, SimState>, AppError> {
        self.state
            .lock()
            .map_err(|e| AppError::Device(format!("Simulator state poisoned: {}", e)))
    }
}

#[async_trait]
impl Device for SimulatedDevice {
    async fn capture(&mut self) -> Result<Frame, AppError> {
        let interval = self.lock()?.frame_interval;
        tokio::time::sleep(interval).await;
        self.lock()?.advance_tick();
        Ok(Frame::capture(self.device_id, DynamicImage::new_rgb8(1, 1)))
    }

    async fn click(&mut self, button: &Button) -> Result<(), AppError> {
        self.lock()?.tap(button);
        Ok(())
    }

    async fn app_is_running(&mut self) -> Result<bool, AppError> {
        Ok(self.lock()?.running)
    }
}

pub struct SimulatedMatcher {
    state: Arc<Mutex<SimState>>,
}

impl Matcher for SimulatedMatcher {
    fn appear(&self, _frame: &Frame, button: &Button, _offset: Offset, _similarity: f32) -> bool {
        self.state
            .lock()
            .map(|state| state.captured.contains(&button.name))
            .unwrap_or(false)
    }

    fn ocr_index(&self, _frame: &Frame, _area: &Area) -> Option<i32> {
        self.state
            .lock()
            .ok()
            .and_then(|state| state.captured_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A_CHECK: Button = Button::simple("A_CHECK", Area::new(0, 0, 10, 10), [0, 0, 0]);
    const B_CHECK: Button = Button::simple("B_CHECK", Area::new(0, 0, 10, 10), [0, 0, 0]);
    const A_TO_B: Button = Button::simple("A_TO_B", Area::new(0, 0, 10, 10), [0, 0, 0]);
    const POPUP: Button = Button::simple("POPUP", Area::new(0, 0, 10, 10), [0, 0, 0]);
    const POPUP_CLOSE: Button = Button::simple("POPUP_CLOSE", Area::new(0, 0, 10, 10), [0, 0, 0]);

    fn simulator() -> Simulator {
        Simulator::builder()
            .screen("a", [A_CHECK, A_TO_B])
            .screen("b", [B_CHECK])
            .overlay("popup", [POPUP, POPUP_CLOSE], POPUP_CLOSE)
            .transition("a", A_TO_B, "b")
            .overlay_at(2, "popup")
            .start("a")
            .build()
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn taps_follow_transitions() {
        let sim = simulator();
        let mut device = sim.device();
        let matcher = sim.matcher();

        let frame = device.capture().await.unwrap();
        assert!(matcher.appear(&frame, &A_CHECK, Offset::NONE, 0.85));
        device.click(&A_TO_B).await.unwrap();
        assert_eq!(sim.displayed(), "b");
        assert_eq!(sim.clicked_buttons(), vec!["A_TO_B"]);
    }

    #[tokio::test(start_paused = true)]
    async fn overlay_covers_screen_until_dismissed() {
        let sim = simulator();
        let mut device = sim.device();
        let matcher = sim.matcher();

        device.capture().await.unwrap();
        let frame = device.capture().await.unwrap();
        assert_eq!(sim.tick(), 2);
        assert!(matcher.appear(&frame, &POPUP, Offset::NONE, 0.85));
        assert!(!matcher.appear(&frame, &A_CHECK, Offset::NONE, 0.85));

        device.click(&POPUP_CLOSE).await.unwrap();
        let frame = device.capture().await.unwrap();
        assert!(matcher.appear(&frame, &A_CHECK, Offset::NONE, 0.85));
    }

    #[test]
    fn unknown_screens_are_rejected() {
        let result = Simulator::builder()
            .screen("a", [A_CHECK])
            .transition("a", A_TO_B, "missing")
            .start("a")
            .build();
        assert!(matches!(result, Err(AppError::Device(_))));
    }
}
