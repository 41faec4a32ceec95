pub mod clients;
pub mod config;
pub mod console;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod mesh;
pub mod models;
pub mod routes;
pub mod services;
pub mod solo;
pub mod transport;
pub mod utils;
pub mod websocket;
