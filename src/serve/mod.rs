pub mod frames;
pub mod server;
