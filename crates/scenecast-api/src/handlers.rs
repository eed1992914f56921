//! Request handlers.

pub mod health;
pub mod jobs;
pub mod merge;
pub mod upload;

pub use health::*;
pub use jobs::*;
pub use merge::*;
