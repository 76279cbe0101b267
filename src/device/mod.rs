pub mod connection;
pub mod constants;
pub mod decode;
pub mod scan;
pub mod types;
