mod utils;
mod service_url;

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod reference;
pub mod tls;

pub use client::{list_all_tags, Client};
pub use error::Error;
