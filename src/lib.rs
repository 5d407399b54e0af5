pub mod app;
pub mod config;
pub mod persist;
pub mod sim;
pub mod subscription;
