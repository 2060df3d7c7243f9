//! Type definitions

pub mod area;
pub mod attempt;
pub mod customer;
pub mod day;
pub mod messages;
pub mod order;
pub mod route;

pub use area::*;
pub use attempt::*;
pub use customer::*;
pub use day::*;
pub use messages::*;
pub use order::*;
pub use route::*;
