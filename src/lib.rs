pub mod api;
pub mod chain;
pub mod client;
pub mod codec;
pub mod config;
pub mod instance;
pub mod message;
pub mod observability;
pub mod registry;
pub mod resources;
