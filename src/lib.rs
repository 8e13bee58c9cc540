//! Ping ICMPv4 assíncrono: um Echo Request, uma resposta.
//!
//! ```no_run
//! use asyncping::{PingOptions, PingOutcome, Pinger};
//!
//! # async fn run() -> asyncping::Result<()> {
//! let pinger = Pinger::new();
//! match pinger.ping("127.0.0.1", &PingOptions::default()).await? {
//!     PingOutcome::Delay(secs) => println!("{secs:.4}s"),
//!     PingOutcome::NoReply => println!("Timeout"),
//!     PingOutcome::Unresolved => println!("Error"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Abrir o socket RAW exige privilégio; sem ele é usado SOCK_DGRAM
//! (Linux com `net.ipv4.ping_group_range`).

pub mod checksum;
pub mod config;
pub mod error;
pub mod hook;
pub mod icmp;
pub mod ident;
pub mod ping;
pub mod socket;
pub mod transceiver;

pub use config::{CaptureMode, ErrorPolicy, PingOptions, Unit};
pub use error::{PingError, Result};
pub use hook::{Hook, NoopHook, TracingHook};
pub use ping::{PingOutcome, Pinger};
pub use socket::{EchoSocket, IcmpSocket};
pub use transceiver::Transceiver;
