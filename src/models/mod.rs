pub mod error;
pub mod location;
pub mod responses;
