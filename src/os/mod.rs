pub mod config;
pub mod interfaces;
pub mod logs;
pub mod start;
