pub mod body;
pub mod client_info;
pub mod error;
pub mod server;
