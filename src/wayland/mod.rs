pub mod connection;
pub mod outputs;
pub mod pointer;

pub use connection::{WaylandConnection, WaylandState};
