// Core data models for Leadboard
// These structs mirror the lead service's resources

pub mod stage;
pub mod lead;
pub mod board;
pub mod statistics;

pub use stage::*;
pub use lead::*;
pub use board::*;
pub use statistics::*;
