pub mod location;
pub mod offline_request;
pub mod query;
pub mod record;
pub mod record_type;
