pub mod bar;
pub mod indicator;
pub mod insight;
pub mod momentum;
pub mod mover;
pub mod pattern;
pub mod pick;
pub mod sector;
pub mod snapshot;

pub use bar::*;
pub use indicator::*;
pub use insight::*;
pub use momentum::*;
pub use mover::*;
pub use pattern::*;
pub use pick::*;
pub use sector::*;
pub use snapshot::*;
