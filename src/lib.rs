pub mod app;
pub mod client;
pub mod config;
pub mod runtime;
pub mod server;
pub mod shared;
pub mod simulation;
