pub mod api;

pub use api::{cors_layer, create_api_routes, create_app, create_relay_routes};
