//! Offline-first synchronization with the remote attendance service.

pub mod background;
pub mod engine;
pub mod events;
pub mod transport;

pub use background::BackgroundSync;
pub use engine::{RetryPolicy, SyncEngine};
pub use events::{SyncEvent, SyncReport};
pub use transport::{AttendanceApi, HttpApi, TransportError};
