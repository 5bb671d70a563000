//! Accepted subscriber connections

mod handler;

pub use handler::ConnectionHandler;
