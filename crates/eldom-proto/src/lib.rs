//! eldom-proto - Wire protocol for Eldom IoT direct requests
//!
//! Pure building blocks for the `/api/direct-req` relay channel. Nothing in
//! this crate performs I/O.
//!
//! # Features
//!
//! - **Ordered commands** - fields keep insertion order, `CRC` is always last
//! - **Checksum stamp** - CRC-32 over the compact JSON members
//! - **Encrypted envelope** - AES-256-CBC `{"Msg": ...}` wrapper for flat boilers
//! - **Family codecs** - domain values to `Req` vocabulary and back
//!
//! # Quick Start
//!
//! ```rust
//! use eldom_proto::{convector, ConvectorState, Envelope};
//!
//! let state = ConvectorState::from_domain(16).unwrap();
//! let cmd = convector::state_command("R7alOFhj9kDslr2X", state);
//! assert_eq!(
//!     cmd.to_json(),
//!     r#"{"ID":"R7alOFhj9kDslr2X","Req":"On","CID":"1","CRC":"EC378CF7"}"#
//! );
//!
//! // Encrypted families send the sealed form instead
//! let sealed = Envelope::vendor().seal(&cmd);
//! let opened = Envelope::vendor().decrypt(&sealed.msg).unwrap();
//! assert_eq!(opened["CRC"], "EC378CF7");
//! ```

pub mod checksum;
pub mod command;
pub mod convector;
pub mod crypto;
pub mod error;
pub mod family;
pub mod flat_boiler;
pub mod response;

/// Request name for status snapshots, shared by every family
pub const GET_STATUS: &str = "GetStatus";

pub use checksum::checksum;
pub use command::{Command, CommandBuilder, CommandFields, CHANNEL_ID};
pub use convector::{ConvectorHeaterStatus, ConvectorSchedule, ConvectorState};
pub use crypto::{Envelope, SealedMessage};
pub use error::{ProtocolError, ProtocolResult};
pub use family::DeviceFamily;
pub use flat_boiler::{FlatBoilerMode, FlatBoilerStatus};
pub use response::StateChangeAck;
