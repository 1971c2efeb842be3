//! # Contracts
//!
//! Frozen interface contracts (ICD) for the event distributor node.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Message model
//! - Messages are classified once, at the boundary where they enter the graph
//!   (`Message::classify`), into ordinary events and handler registrations
//! - Endpoints are resolved to index handles at construction and never looked up by name again

mod blueprint;
mod error;
mod message;
mod port;
mod publisher;
mod stream;

pub use blueprint::*;
pub use error::*;
pub use message::*;
pub use port::*;
pub use publisher::{MessagePublisher, PortRegistry};
pub use stream::*;
