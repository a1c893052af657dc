pub mod app;
pub mod book;
pub mod cli;
pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod session;
pub mod store;
pub mod word;
