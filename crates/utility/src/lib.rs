pub mod geo;
pub mod id;
pub mod mongo_id;
pub mod patch;
pub mod roman;
pub mod serde;
