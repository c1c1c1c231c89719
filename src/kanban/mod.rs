//! Kanban board state and the optimistic stage-transition protocol

pub mod controller;
pub mod filter;
pub mod notify;
pub mod store;

pub use controller::*;
pub use filter::*;
pub use notify::*;
pub use store::*;
