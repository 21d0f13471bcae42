pub mod button;
pub mod frame;
pub mod timer;

pub use button::{Area, Button, Offset};
pub use frame::Frame;
pub use timer::Timer;
