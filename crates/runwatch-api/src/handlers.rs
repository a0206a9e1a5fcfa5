//! Request handlers.

pub mod alerts;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod layout;
pub mod readings;
pub mod snapshots;

pub use alerts::*;
pub use auth::*;
pub use dashboard::*;
pub use health::*;
pub use layout::*;
pub use readings::*;
pub use snapshots::*;
