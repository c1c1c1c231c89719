pub mod date;
pub mod display;
pub mod fuzzy;

pub use date::*;
pub use display::*;
