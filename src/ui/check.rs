use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::common::{Button, Offset};
use crate::ui::perception::Perception;

pub type CheckFn = Arc<dyn Fn(&Perception) -> bool + Send + Sync>;

/// How a page, or the outcome of a click, is recognized on screen.
#[derive(Clone)]
pub enum CheckCondition {
    Single(Button),
    /// Any one of the buttons being visible is enough. Checked in order.
    Any(Vec<Button>),
    Custom(CheckFn),
}

impl CheckCondition {
    pub fn any(buttons: impl IntoIterator<Item = Button>) -> Self {
        CheckCondition::Any(buttons.into_iter().collect())
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Perception) -> bool + Send + Sync + 'static,
    {
        CheckCondition::Custom(Arc::new(f))
    }

    /// Buttons this condition looks at. Empty for custom predicates.
    pub fn buttons(&self) -> Vec<Button> {
        match self {
            CheckCondition::Single(button) => vec![*button],
            CheckCondition::Any(buttons) => buttons.clone(),
            CheckCondition::Custom(_) => Vec::new(),
        }
    }

    /// `interval` throttles each button separately; custom predicates are never throttled.
    pub fn evaluate(&self, ui: &mut Perception, offset: Offset, interval: Duration) -> bool {
        match self {
            CheckCondition::Single(button) => ui.appear(button, offset, interval),
            CheckCondition::Any(buttons) => buttons
                .iter()
                .any(|button| ui.appear(button, offset, interval)),
            CheckCondition::Custom(predicate) => predicate(&*ui),
        }
    }
}

impl From<Button> for CheckCondition {
    fn from(button: Button) -> Self {
        CheckCondition::Single(button)
    }
}

impl fmt::Debug for CheckCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckCondition::Single(button) => f.debug_tuple("Single").field(&button.name).finish(),
            CheckCondition::Any(buttons) => f
                .debug_tuple("Any")
                .field(&buttons.iter().map(|b| b.name).collect::<Vec<_>>())
                .finish(),
            CheckCondition::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl fmt::Display for CheckCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckCondition::Single(button) => write!(f, "{}", button),
            CheckCondition::Any(buttons) => {
                let names: Vec<&str> = buttons.iter().map(|b| b.name).collect();
                write!(f, "[{}]", names.join(", "))
            }
            CheckCondition::Custom(_) => f.write_str("<custom>"),
        }
    }
}
