pub mod initialize;
pub mod log;
pub mod migrate;
pub mod offline_queue;
pub mod pool;
pub mod queries;
pub mod settings;
pub mod store;

pub use pool::DbPool;
pub use store::LocalStore;
