pub mod bridge;
mod server;

pub use server::{build_app, build_app_with_instance, run};
