//! Networking and concurrency around [`rrepl::Session`].
//!
//! Every session is owned by an actor running on a blocking thread. The
//! transport's reader, host teardown listeners and listener shutdown all
//! reach the session by posting a [`SessionEvent`] to that actor, so a
//! session never sees two things at once.

pub mod actor;
pub mod error;
pub mod event;
pub mod fake_transport;
pub mod server;
pub mod spawner;
pub mod table;
pub mod tcp;
pub mod transport;

pub use error::{Error, Result};
pub use event::SessionEvent;
pub use fake_transport::{FakeTransport, FakeTransportBuilder, FakeTransportController};
pub use server::{ServerConfig, SessionServer, check_peer};
pub use spawner::{SessionOptions, SessionSpawner};
pub use table::SessionTable;
pub use tcp::TcpTransport;
pub use transport::{Endpoints, Transport};
