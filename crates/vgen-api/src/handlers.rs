//! Request handlers.

pub mod connection;
pub mod health;
pub mod jobs;

pub use connection::*;
pub use health::*;
pub use jobs::*;
