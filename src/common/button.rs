use rand::Rng;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Rectangular screen region, `(x1, y1)` inclusive to `(x2, y2)` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Area {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Area {
    pub const fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> i32 {
        self.width().max(0) * self.height().max(0)
    }

    pub fn center(&self) -> (i32, i32) {
        ((self.x1 + self.x2) / 2, (self.y1 + self.y2) / 2)
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x1 && x < self.x2 && y >= self.y1 && y < self.y2
    }

    pub fn shifted(&self, dx: i32, dy: i32) -> Self {
        Self::new(self.x1 + dx, self.y1 + dy, self.x2 + dx, self.y2 + dy)
    }

    /// Clamp to an image of the given size. `None` if nothing is left.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        let clamped = Self::new(
            self.x1.clamp(0, width as i32),
            self.y1.clamp(0, height as i32),
            self.x2.clamp(0, width as i32),
            self.y2.clamp(0, height as i32),
        );
        (clamped.area() > 0).then_some(clamped)
    }

    /// A point inside the area, biased towards the center so taps look human.
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> (i32, i32) {
        let (cx, cy) = self.center();
        let half_w = (self.width() / 4).max(0);
        let half_h = (self.height() / 4).max(0);
        let x = cx + rng.random_range(-half_w..=half_w);
        let y = cy + rng.random_range(-half_h..=half_h);
        (x, y)
    }
}

/// Tolerance box around a detection area, as distances to search in each direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Offset {
    pub const NONE: Offset = Offset::new(0, 0, 0, 0);

    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub const fn symmetric(x: i32, y: i32) -> Self {
        Self::new(x, y, x, y)
    }

    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }
}

/// A named, clickable screen element.
///
/// `area` is where the element is detected, `color` is the mean colour expected
/// there, `button` is where a tap lands. Two buttons are the same element when
/// their names match; interval timers and click logs are keyed by name.
#[derive(Debug, Clone, Copy)]
pub struct Button {
    pub name: &'static str,
    pub area: Area,
    pub color: [u8; 3],
    pub button: Area,
}

impl Button {
    pub const fn new(name: &'static str, area: Area, color: [u8; 3], button: Area) -> Self {
        Self {
            name,
            area,
            color,
            button,
        }
    }

    /// Detection area doubles as the click area.
    pub const fn simple(name: &'static str, area: Area, color: [u8; 3]) -> Self {
        Self::new(name, area, color, area)
    }

    pub fn click_point<R: Rng + ?Sized>(&self, rng: &mut R) -> (i32, i32) {
        self.button.random_point(rng)
    }
}

impl PartialEq for Button {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Button {}

impl Hash for Button {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Button {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
