//! Type definitions

pub mod geo;
pub mod messages;
pub mod task;
pub mod vehicle;
pub mod work;

pub use geo::*;
pub use messages::*;
pub use task::*;
pub use vehicle::*;
pub use work::*;
