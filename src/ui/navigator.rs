use std::time::Duration;

use indexmap::IndexMap;
use tracing::{error, info, instrument, warn};

use crate::common::{Button, Timer};
use crate::config::NavigationSettings;
use crate::error::AppError;
use crate::ui::catalog;
use crate::ui::interrupt::InterruptChain;
use crate::ui::page::{PageGraph, PageId, RoutingTable};
use crate::ui::perception::Perception;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Sampling,
    MatchingCurrentPage,
    Arrived,
    Advancing { from: PageId, to: PageId },
    Unknown,
}

/// Routing state of one `goto`. Exists only while the traversal runs.
#[derive(Debug, Clone)]
pub struct TraversalSession {
    routes: RoutingTable,
    state: NavState,
    clicks: u32,
}

impl TraversalSession {
    pub fn destination(&self) -> PageId {
        self.routes.destination()
    }

    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn clicks(&self) -> u32 {
        self.clicks
    }
}

pub struct Navigator {
    graph: PageGraph,
    settings: NavigationSettings,
    home: PageId,
    recovery: Vec<Button>,
    click_resets: IndexMap<Button, Vec<Button>>,
    diagnostics: Vec<(String, String)>,
    current: Option<PageId>,
    session: Option<TraversalSession>,
}

impl Navigator {
    pub fn new(graph: PageGraph, settings: NavigationSettings) -> Self {
        Self {
            graph,
            settings,
            home: catalog::PAGE_MAIN,
            recovery: Vec::new(),
            click_resets: IndexMap::new(),
            diagnostics: Vec::new(),
            current: None,
            session: None,
        }
    }

    /// The game client's own pages, recovery buttons and interval resets.
    pub fn standard(settings: NavigationSettings) -> Result<Self, AppError> {
        let graph = catalog::standard_graph()?;
        let resets = catalog::click_resets(&graph);
        Ok(Self::new(graph, settings)
            .with_recovery_buttons(catalog::RECOVERY_BUTTONS)
            .with_click_resets(resets))
    }

    pub fn with_home(mut self, home: PageId) -> Self {
        self.home = home;
        self
    }

    /// Tapped in order while the current page is unknown.
    pub fn with_recovery_buttons(mut self, buttons: impl IntoIterator<Item = Button>) -> Self {
        self.recovery = buttons.into_iter().collect();
        self
    }

    pub fn with_click_resets(mut self, resets: IndexMap<Button, Vec<Button>>) -> Self {
        self.click_resets = resets;
        self
    }

    /// Key/value pairs logged when the current page cannot be recognized.
    pub fn with_diagnostics(mut self, diagnostics: Vec<(String, String)>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn graph(&self) -> &PageGraph {
        &self.graph
    }

    /// Last page recognized, by any operation.
    pub fn current_page(&self) -> Option<PageId> {
        self.current
    }

    pub fn session(&self) -> Option<&TraversalSession> {
        self.session.as_ref()
    }

    fn set_state(&mut self, state: NavState) {
        if let Some(session) = self.session.as_mut() {
            session.state = state;
        }
    }

    /// Walks from whatever page is displayed to `destination`.
    ///
    /// Each tick clicks at most once: the link out of the recognized page
    /// towards the destination or, when no page is recognized, whatever the
    /// interrupt chain handles. Never times out on its own.
    #[instrument(level = "debug", skip(self, ui, chain))]
    pub async fn goto(
        &mut self,
        ui: &mut Perception,
        chain: &mut InterruptChain,
        destination: PageId,
        skip_first_screenshot: bool,
    ) -> Result<(), AppError> {
        let routes = self.graph.route_to(destination)?;
        info!("UI goto {}", destination);
        self.session = Some(TraversalSession {
            routes,
            state: NavState::Sampling,
            clicks: 0,
        });
        let result = self
            .traverse(ui, chain, destination, skip_first_screenshot)
            .await;
        self.session = None;
        result
    }

    async fn traverse(
        &mut self,
        ui: &mut Perception,
        chain: &mut InterruptChain,
        destination: PageId,
        mut skip_first_screenshot: bool,
    ) -> Result<(), AppError> {
        let arrival = self
            .graph
            .page(destination)?
            .check()
            .cloned()
            .ok_or_else(|| {
                AppError::InvalidGraph(format!("Page {} cannot be recognized", destination))
            })?;
        for button in self.graph.check_buttons() {
            ui.interval_clear(&button);
        }
        let offset = self.settings.offset();

        loop {
            self.set_state(NavState::Sampling);
            if skip_first_screenshot {
                skip_first_screenshot = false;
                if !ui.has_cached_frame() {
                    ui.screenshot().await?;
                }
            } else {
                ui.screenshot().await?;
            }

            self.set_state(NavState::MatchingCurrentPage);
            if arrival.evaluate(ui, offset, Duration::ZERO) {
                info!("Page arrive: {}", destination);
                self.current = Some(destination);
                self.set_state(NavState::Arrived);
                return Ok(());
            }

            if let Some((from, to, button)) = self.next_hop(ui) {
                info!("Page switch: {} -> {}", from, to);
                self.current = Some(from);
                self.set_state(NavState::Advancing { from, to });
                ui.click(&button).await?;
                self.reset_related_intervals(ui, &button);
                if let Some(session) = self.session.as_mut() {
                    session.clicks += 1;
                }
                continue;
            }

            self.set_state(NavState::Unknown);
            chain.run_once(ui).await?;
        }
    }

    /// The recognized page on the route and the link to click, if any.
    fn next_hop(&self, ui: &mut Perception) -> Option<(PageId, PageId, Button)> {
        let routes = &self.session.as_ref()?.routes;
        let offset = self.settings.offset();
        let interval = self.settings.page_interval();
        for page in self.graph.iter_pages() {
            let Some(to) = routes.next_hop(page.id()) else {
                continue;
            };
            let Some(check) = page.check() else {
                continue;
            };
            if !check.evaluate(ui, offset, interval) {
                continue;
            }
            let button = page.link(to).copied()?;
            return Some((page.id(), to, button));
        }
        None
    }

    fn reset_related_intervals(&self, ui: &mut Perception, clicked: &Button) {
        if let Some(related) = self.click_resets.get(clicked) {
            for button in related {
                ui.interval_reset(button);
            }
        }
    }

    /// Identifies the displayed page, trying to get back to a known one if needed.
    ///
    /// Fails with [`AppError::PageUnknown`] once nothing is recognized for the
    /// configured timeout. Any recovery click or handled interrupt restarts it.
    pub async fn get_current_page(
        &mut self,
        ui: &mut Perception,
        chain: &mut InterruptChain,
        mut skip_first_screenshot: bool,
    ) -> Result<PageId, AppError> {
        info!("UI get current page");
        let offset = self.settings.offset();
        let recovery_interval = self.settings.recovery_interval();
        let mut timeout = Timer::with_count(
            self.settings.unknown_page_timeout(),
            self.settings.unknown_page_timeout_count,
        )
        .start();
        let mut app_checked = false;

        'sample: loop {
            if skip_first_screenshot {
                skip_first_screenshot = false;
                if !ui.has_cached_frame() {
                    ui.screenshot().await?;
                }
            } else {
                ui.screenshot().await?;
            }

            if timeout.reached() {
                break;
            }

            for page in self.graph.iter_pages() {
                let Some(check) = page.check() else {
                    continue;
                };
                if check.evaluate(ui, offset, Duration::ZERO) {
                    info!(ui = %page.id(), "Current page");
                    self.current = Some(page.id());
                    return Ok(page.id());
                }
            }

            info!("Unknown ui page");
            for button in &self.recovery {
                if ui.appear_then_click(button, offset, recovery_interval).await? {
                    timeout.reset();
                    continue 'sample;
                }
            }
            if chain.run_once(ui).await? {
                timeout.reset();
                continue;
            }

            if !app_checked {
                app_checked = true;
                if !ui.app_is_running().await? {
                    error!("Game not running");
                    return Err(AppError::GameNotRunning);
                }
            }
        }

        let known_pages = self.graph.page_names();
        warn!("Unknown ui page");
        for (key, value) in &self.diagnostics {
            warn!("{}: {}", key, value);
        }
        warn!("Starting from current page is not supported");
        warn!("Supported page: {}", known_pages.join(", "));
        warn!("Supported page: Any page with a \"HOME\" button on the upper-right");
        error!("Please switch to a supported page before starting");
        Err(AppError::PageUnknown { known_pages })
    }

    /// Navigates only if needed. Returns whether a traversal was performed.
    pub async fn ensure(
        &mut self,
        ui: &mut Perception,
        chain: &mut InterruptChain,
        destination: PageId,
    ) -> Result<bool, AppError> {
        info!("UI ensure {}", destination);
        self.graph.page(destination)?;
        let current = self.get_current_page(ui, chain, true).await?;
        if current == destination {
            info!("Already at {}", destination);
            return Ok(false);
        }
        info!("Goto {}", destination);
        self.goto(ui, chain, destination, true).await?;
        Ok(true)
    }

    pub async fn navigate(
        &mut self,
        ui: &mut Perception,
        chain: &mut InterruptChain,
        destination: PageId,
    ) -> Result<(), AppError> {
        self.ensure(ui, chain, destination).await.map(|_| ())
    }

    pub async fn goto_main(
        &mut self,
        ui: &mut Perception,
        chain: &mut InterruptChain,
    ) -> Result<bool, AppError> {
        let home = self.home;
        self.ensure(ui, chain, home).await
    }

    /// On the home page, clicks its link to `destination`. `Ok(false)` when not home.
    pub async fn main_appear_then_click(
        &self,
        ui: &mut Perception,
        destination: PageId,
        interval: Duration,
    ) -> Result<bool, AppError> {
        let home = self.graph.page(self.home)?;
        let button = home.link(destination).copied().ok_or_else(|| {
            AppError::UndeclaredPage(format!("{} -> {}", self.home, destination))
        })?;
        let Some(check) = home.check() else {
            return Ok(false);
        };
        if !check.evaluate(ui, self.settings.offset(), interval) {
            return Ok(false);
        }
        ui.click(&button).await?;
        self.reset_related_intervals(ui, &button);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Area, Offset};
    use crate::device::simulator::Simulator;
    use crate::ui::interrupt::{AppearThenClick, BoundedClick};

    const MAIN: PageId = PageId::new("page_main");
    const EVENT: PageId = PageId::new("page_event");
    const STAGE_LIST: PageId = PageId::new("page_stage_list");

    const fn button(name: &'static str) -> Button {
        Button::simple(name, Area::new(0, 0, 10, 10), [0, 0, 0])
    }

    const MAIN_CHECK: Button = button("MAIN_CHECK");
    const EVENT_CHECK: Button = button("EVENT_CHECK");
    const STAGE_LIST_CHECK: Button = button("STAGE_LIST_CHECK");
    const GOTO_MAIN: Button = button("GOTO_MAIN");
    const MAIN_GOTO_EVENT: Button = button("MAIN_GOTO_EVENT");
    const EVENT_GOTO_STAGE_LIST: Button = button("EVENT_GOTO_STAGE_LIST");
    const ANNOUNCE_CLOSE: Button = button("ANNOUNCE_CLOSE");
    const GET_SHIP: Button = button("GET_SHIP");

    fn graph() -> PageGraph {
        PageGraph::builder()
            .page(MAIN, Some(MAIN_CHECK.into()))
            .page(EVENT, Some(EVENT_CHECK.into()))
            .page(STAGE_LIST, Some(STAGE_LIST_CHECK.into()))
            .link(MAIN, EVENT, MAIN_GOTO_EVENT)
            .link(EVENT, STAGE_LIST, EVENT_GOTO_STAGE_LIST)
            .link(EVENT, MAIN, GOTO_MAIN)
            .link(STAGE_LIST, MAIN, GOTO_MAIN)
            .build()
            .unwrap()
    }

    fn navigator() -> Navigator {
        Navigator::new(graph(), NavigationSettings::default())
            .with_recovery_buttons([GOTO_MAIN])
    }

    fn announce_chain() -> InterruptChain {
        InterruptChain::new().with_rule(AppearThenClick::new(ANNOUNCE_CLOSE).offset(Offset::NONE))
    }

    fn perception(sim: &Simulator) -> Perception {
        Perception::new(Box::new(sim.device()), Box::new(sim.matcher()))
    }

    #[tokio::test(start_paused = true)]
    async fn navigate_to_current_page_clicks_nothing() {
        let sim = Simulator::from_graph(&graph(), EVENT).build().unwrap();
        let mut ui = perception(&sim);
        let mut nav = navigator();

        let moved = nav
            .ensure(&mut ui, &mut announce_chain(), EVENT)
            .await
            .unwrap();
        assert!(!moved);
        assert!(sim.clicks().is_empty());
        assert_eq!(nav.current_page(), Some(EVENT));
    }

    #[tokio::test(start_paused = true)]
    async fn two_hops_take_exactly_two_clicks() {
        let sim = Simulator::from_graph(&graph(), MAIN).build().unwrap();
        let mut ui = perception(&sim);
        let mut nav = navigator();

        nav.goto(&mut ui, &mut announce_chain(), STAGE_LIST, true)
            .await
            .unwrap();
        assert_eq!(
            sim.clicked_buttons(),
            vec!["MAIN_GOTO_EVENT", "EVENT_GOTO_STAGE_LIST"]
        );
        assert_eq!(sim.tick(), 3);
        assert_eq!(nav.current_page(), Some(STAGE_LIST));
        assert!(nav.session().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn overlay_is_dismissed_before_next_hop() {
        let sim = Simulator::from_graph(&graph(), MAIN)
            .overlay("announce", [ANNOUNCE_CLOSE], ANNOUNCE_CLOSE)
            .overlay_at(2, "announce")
            .build()
            .unwrap();
        let mut ui = perception(&sim);
        let mut nav = navigator();

        nav.goto(&mut ui, &mut announce_chain(), STAGE_LIST, true)
            .await
            .unwrap();
        let clicks = sim.clicks();
        let sequence: Vec<(u64, &str)> = clicks.iter().map(|c| (c.tick, c.button)).collect();
        assert_eq!(
            sequence,
            vec![
                (1, "MAIN_GOTO_EVENT"),
                (2, "ANNOUNCE_CLOSE"),
                (3, "EVENT_GOTO_STAGE_LIST"),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn session_is_cleared_when_goto_fails() {
        let sim = Simulator::from_graph(&graph(), MAIN)
            .screen("void", [ANNOUNCE_CLOSE])
            .start("void")
            .build()
            .unwrap();
        let mut ui = perception(&sim);
        let mut nav = navigator();
        let mut chain = InterruptChain::new().with_rule(BoundedClick::new(ANNOUNCE_CLOSE, 0));

        let err = nav
            .goto(&mut ui, &mut chain, STAGE_LIST, true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::HumanTakeover(_)));
        assert!(nav.session().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn undeclared_destination_fails_immediately() {
        let sim = Simulator::from_graph(&graph(), MAIN).build().unwrap();
        let mut ui = perception(&sim);
        let mut nav = navigator();

        let err = nav
            .navigate(&mut ui, &mut announce_chain(), PageId::new("page_nowhere"))
            .await
            .unwrap_err();
        assert!(err.is_programming_error());
        assert_eq!(sim.tick(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_page_recovers_through_home_button() {
        let sim = Simulator::from_graph(&graph(), MAIN)
            .screen("mail", [GOTO_MAIN])
            .transition("mail", GOTO_MAIN, MAIN.name())
            .start("mail")
            .build()
            .unwrap();
        let mut ui = perception(&sim);
        let mut nav = navigator();

        let page = nav
            .get_current_page(&mut ui, &mut announce_chain(), true)
            .await
            .unwrap();
        assert_eq!(page, MAIN);
        assert_eq!(sim.clicked_buttons(), vec!["GOTO_MAIN"]);
    }

    #[tokio::test(start_paused = true)]
    async fn unrecognizable_screen_times_out() {
        let sim = Simulator::from_graph(&graph(), MAIN)
            .screen("void", Vec::<Button>::new())
            .start("void")
            .build()
            .unwrap();
        let mut ui = perception(&sim);
        let mut nav = navigator();

        let err = nav
            .get_current_page(&mut ui, &mut announce_chain(), true)
            .await
            .unwrap_err();
        match err {
            AppError::PageUnknown { known_pages } => {
                assert_eq!(known_pages, vec!["page_main", "page_event", "page_stage_list"]);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(sim.tick() > 20);
    }

    #[tokio::test(start_paused = true)]
    async fn stopped_game_is_reported() {
        let sim = Simulator::from_graph(&graph(), MAIN)
            .screen("void", Vec::<Button>::new())
            .start("void")
            .not_running()
            .build()
            .unwrap();
        let mut ui = perception(&sim);
        let mut nav = navigator();

        let err = nav
            .get_current_page(&mut ui, &mut announce_chain(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::GameNotRunning));
    }

    #[tokio::test(start_paused = true)]
    async fn game_closed_mid_session_is_reported() {
        let sim = Simulator::from_graph(&graph(), MAIN)
            .screen("void", Vec::<Button>::new())
            .show_at(2, "void")
            .build()
            .unwrap();
        let mut ui = perception(&sim);
        let mut nav = navigator();

        assert_eq!(
            nav.get_current_page(&mut ui, &mut announce_chain(), false)
                .await
                .unwrap(),
            MAIN
        );
        sim.set_running(false);
        let err = nav
            .get_current_page(&mut ui, &mut announce_chain(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::GameNotRunning));
        assert_eq!(sim.tick(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn navigation_click_holds_back_related_popups() {
        let sim = Simulator::from_graph(&graph(), MAIN).build().unwrap();
        let mut ui = perception(&sim);
        let mut resets = IndexMap::new();
        resets.insert(MAIN_GOTO_EVENT, vec![GET_SHIP]);
        let mut nav = navigator().with_click_resets(resets);

        nav.goto(&mut ui, &mut announce_chain(), EVENT, true)
            .await
            .unwrap();
        // The new-ship rule of the standard chain throttles with 5 s.
        let interval = Duration::from_secs(5);
        assert!(!ui.interval_timer(&GET_SHIP, interval).reached());
        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(!ui.interval_timer(&GET_SHIP, interval).reached());
    }

    #[tokio::test(start_paused = true)]
    async fn main_link_is_clicked_only_on_main() {
        let sim = Simulator::from_graph(&graph(), MAIN).build().unwrap();
        let mut ui = perception(&sim);
        let nav = navigator();

        ui.screenshot().await.unwrap();
        assert!(nav
            .main_appear_then_click(&mut ui, EVENT, Duration::ZERO)
            .await
            .unwrap());
        ui.screenshot().await.unwrap();
        assert!(!nav
            .main_appear_then_click(&mut ui, EVENT, Duration::ZERO)
            .await
            .unwrap());
        assert_eq!(sim.clicked_buttons(), vec!["MAIN_GOTO_EVENT"]);
    }
}
