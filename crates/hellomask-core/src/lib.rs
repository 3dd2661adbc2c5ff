pub mod config;
pub mod hello;
