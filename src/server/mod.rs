pub mod config;
mod http_layers;
pub mod server;
pub mod state;
mod transcode_routes;

pub use config::ServerConfig;
pub use http_layers::*;
pub use server::{make_app, run_server};
