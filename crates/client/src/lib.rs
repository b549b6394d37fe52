//! Client core for the Shifter shift-scheduling service.
//!
//! The client talks to one scheduling server over one persistent TCP
//! connection. The protocol carries no request identifiers, so every
//! request/reply pair must complete before the next begins; the
//! [`TransportSession`] enforces that with an exchange lock.
//!
//! # Architecture
//!
//! * [`TransportSession`]: owns the socket, frames I/O, tracks [`ConnectionState`].
//! * [`SessionCache`]: identity and status of the logged-in user.
//! * [`ops`]: one client per business area, built on a shared transport and cache.
//! * [`Shifter`]: bundles one transport, one cache and every operation client.
//!
//! Operation methods never return errors. Failures are logged and mapped to
//! `false`, `None`, an empty list or (for monthly work requests) a documented
//! sample dataset.
//!
//! # Example
//!
//! ```ignore
//! use shifter_client::{ClientConfig, Shifter};
//!
//! let shifter = Shifter::new(ClientConfig::new("10.10.20.112", 5556));
//! if shifter.identity().login("kim", "secret").await {
//!     let notices = shifter.notices().list().await;
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod model;
pub mod ops;
pub mod session;
pub mod transport;

mod catalog;

pub use catalog::Shifter;
pub use config::{ClientConfig, ConfigError};
pub use error::{Error, Result};
pub use model::{NoteType, RequestStatus, ShiftType};
pub use session::{AttendanceSnapshot, RequestStatusCounts, SessionCache, SessionSnapshot};
pub use transport::{ConnectionState, Exchange, TransportSession};
