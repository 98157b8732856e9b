//! Asterisk Manager Interface (AMI) and Gateway Interface (AGI) client
//! for Rust
//!
//! This crate provides async clients for the two control protocols an
//! Asterisk PBX exposes: the persistent, multiplexed TCP manager channel
//! (AMI), for observing call-processing events and sending actions, and
//! the per-call stdio gateway channel (AGI), for driving an individual
//! channel through scripted interactions.
//!
//! # Manager connection
//!
//! ```rust,no_run
//! use asterisk_ami_rs::actions::{Login, Logoff};
//! use asterisk_ami_rs::{AmiError, ManagerConnection};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AmiError> {
//!     let mut connection = ManagerConnection::connect_default("pbx.example.net").await?;
//!     println!("{} / {}", connection.name(), connection.version());
//!
//!     connection.execute(&mut Login::new("admin", "secret")).await?;
//!
//!     let _subscription = connection.register_event("Hangup", |event| {
//!         println!("hangup on {}", event.get_or_default("Channel"));
//!     });
//!
//!     loop {
//!         connection.wait_event().await?;
//!         connection.pump_messages().await?;
//!         connection.process_events();
//!     }
//! }
//! ```
//!
//! The connection is single-owner by contract: responses are correlated
//! to actions by FIFO order over the one socket, so all sends must go
//! through one task. See [`ManagerConnection`] for the dispatch loop
//! primitives.
//!
//! # Gateway engine
//!
//! ```rust,no_run
//! use asterisk_ami_rs::agi::Agi;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut agi = Agi::new().await?;
//!     agi.answer().await?;
//!     agi.stream_file("welcome", "", 0).await?;
//!     agi.hangup("").await?;
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod agi;
pub mod buffer;
pub mod connection;
pub mod constants;
pub mod error;
pub mod message;
pub mod protocol;

pub use actions::ManagerAction;
pub use agi::{Agi, AgiResponse, StdioAgi};
pub use connection::{ManagerConnection, ResponseHandler, Subscription};
pub use constants::DEFAULT_AMI_PORT;
pub use error::{ActionErrorKind, AgiError, AgiResult, AmiError, AmiResult};
pub use message::{Message, MessageKind};
