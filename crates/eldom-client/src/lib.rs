//! Eldom Client Library
//!
//! Async client for the Eldom IoT cloud (`iot.myeldom.com`): account calls
//! plus device commands sent through the direct-request relay.
//!
//! # Example
//!
//! ```rust,no_run
//! use eldom_client::EldomClient;
//!
//! #[tokio::main]
//! async fn main() -> eldom_client::Result<()> {
//!     let client = EldomClient::new("user@example.com", "password")?;
//!
//!     // Logs in on first use
//!     let devices = client.get_devices().await?;
//!     let heater = &devices[0];
//!
//!     let status = client.convector_heater().get_status(heater).await?;
//!     println!("{:?} °C", status.temperature());
//!
//!     client.convector_heater().set_state(heater, 16).await?;
//!     client.convector_heater().set_temperature(heater, 22).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module provides a local mock of the API:
//!
//! ```rust,ignore
//! use eldom_client::testing::MockEldomServer;
//!
//! let server = MockEldomServer::start("user", "pass", devices).await?;
//! let client = server.client("user", "pass")?;
//! let devices = client.get_devices().await?;
//! ```

mod client;
pub mod config;
mod convector_heater;
pub mod direct;
mod error;
mod flat_boiler;
pub mod testing;
pub mod token;
pub mod transport;
mod types;

pub use client::EldomClient;
pub use config::ClientConfig;
pub use convector_heater::ConvectorHeaterClient;
pub use direct::{DirectRequestClient, DirectRequestDevice};
pub use error::{EldomClientError, Result};
pub use flat_boiler::FlatBoilerClient;
pub use token::{Credentials, TokenProvider, TokenState};
pub use transport::{HttpTransport, Transport};
pub use types::{Device, User};

// Re-export protocol types for convenience
pub use eldom_proto::{
    ConvectorHeaterStatus, ConvectorSchedule, ConvectorState, DeviceFamily, FlatBoilerMode,
    FlatBoilerStatus, StateChangeAck,
};
