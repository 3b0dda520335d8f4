pub mod config;
pub mod context;
pub mod languages;
pub mod redis;
pub mod types;
