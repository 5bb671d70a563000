//! Session management

mod registry;
mod subscriber;

pub use registry::Registry;
pub use subscriber::{Session, SessionKey};
