//! Overlay handling that runs between navigation steps.
//!
//! Rules are tried in declaration order every tick; the first one that handles
//! something ends the pass. Each rule issues at most one click.

pub mod additional;
pub mod daemon;
pub mod rules;

pub use additional::default_chain;
pub use daemon::InterruptDaemon;
pub use rules::{AppearThenClick, BoundedClick, LumaRule, RedirectRule, SettleThenClick};

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::debug;

use crate::error::AppError;
use crate::ui::perception::Perception;

#[async_trait]
pub trait InterruptRule: Send {
    fn name(&self) -> &str;

    /// Restores any click budget the rule keeps. Most rules keep none.
    fn reset_budget(&mut self) {}

    /// Looks at the cached frame and clicks at most once. `Ok(true)` if something was handled.
    async fn handle(&mut self, ui: &mut Perception) -> Result<bool, AppError>;
}

#[derive(Default)]
pub struct InterruptChain {
    rules: Vec<Box<dyn InterruptRule>>,
    disabled: HashSet<String>,
}

impl InterruptChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule<R: InterruptRule + 'static>(mut self, rule: R) -> Self {
        self.push(rule);
        self
    }

    pub fn push<R: InterruptRule + 'static>(&mut self, rule: R) {
        self.rules.push(Box::new(rule));
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Skips the named rule until it is enabled again.
    pub fn disable(&mut self, name: &str) {
        self.disabled.insert(name.to_string());
    }

    pub fn enable(&mut self, name: &str) {
        self.disabled.remove(name);
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        !self.disabled.contains(name)
    }

    /// Restores the click budget of every rule, e.g. once an operation siren flow is over.
    pub fn reset_budgets(&mut self) {
        for rule in self.rules.iter_mut() {
            rule.reset_budget();
        }
    }

    /// Restores the click budget of the named rule. `false` if there is no such rule.
    pub fn reset_budget(&mut self, name: &str) -> bool {
        match self.rules.iter_mut().find(|rule| rule.name() == name) {
            Some(rule) => {
                rule.reset_budget();
                true
            }
            None => false,
        }
    }

    pub async fn run_once(&mut self, ui: &mut Perception) -> Result<bool, AppError> {
        for rule in self.rules.iter_mut() {
            if self.disabled.contains(rule.name()) {
                continue;
            }
            if rule.handle(ui).await? {
                debug!("Interrupt handled by {}", rule.name());
                return Ok(true);
            }
        }
        Ok(false)
    }
}
