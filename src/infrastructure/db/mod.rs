pub mod connection;
pub mod repositories;

pub use connection::ScanDb;
