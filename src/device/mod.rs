//! Boundary to the screenshot/tap driver and the element matching primitives.
//!
//! Both are collaborators of the navigation core: the core decides *what* to
//! look for and *where* to tap, a [`Device`] performs the I/O and a [`Matcher`]
//! answers whether an element is on a frame.

pub mod color_matcher;
pub mod simulator;

pub use color_matcher::ColorMatcher;
pub use simulator::{Simulator, SimulatorBuilder};

use std::ops::RangeInclusive;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;

use crate::common::{Area, Button, Frame, Offset};
use crate::error::AppError;

pub const DEFAULT_SIMILARITY: f32 = 0.85;

#[async_trait]
pub trait Device: Send {
    /// Takes a fresh screenshot. This is the one call allowed to block for a while.
    async fn capture(&mut self) -> Result<Frame, AppError>;

    async fn click(&mut self, button: &Button) -> Result<(), AppError>;

    async fn multi_click(
        &mut self,
        button: &Button,
        n: u32,
        interval: RangeInclusive<Duration>,
    ) -> Result<(), AppError> {
        for _ in 0..n {
            self.click(button).await?;
            let pause = {
                let mut rng = rand::rng();
                let (low, high) = (interval.start().as_millis(), interval.end().as_millis());
                Duration::from_millis(rng.random_range(low..=high.max(low)) as u64)
            };
            self.sleep(pause).await;
        }
        Ok(())
    }

    async fn sleep(&mut self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    async fn app_is_running(&mut self) -> Result<bool, AppError> {
        Ok(true)
    }
}

pub trait Matcher: Send + Sync {
    /// Whether `button` is visible on `frame`, searched within `offset` around its area.
    fn appear(&self, frame: &Frame, button: &Button, offset: Offset, similarity: f32) -> bool;

    /// Brightness-only match, for elements whose colours shift with the background.
    fn match_luma(&self, frame: &Frame, button: &Button, offset: Offset) -> bool {
        self.appear(frame, button, offset, DEFAULT_SIMILARITY)
    }

    /// Reads a page index from `area`. `None` when nothing legible is there.
    fn ocr_index(&self, frame: &Frame, area: &Area) -> Option<i32> {
        let _ = (frame, area);
        None
    }
}
