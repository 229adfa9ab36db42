//! Command implementations for eldom-cli

pub mod account;
pub mod state;
pub mod status;
pub mod temperature;

pub use account::{devices, user};
pub use state::state;
pub use status::status;
pub use temperature::temperature;
