pub mod cache;
pub mod transport;
