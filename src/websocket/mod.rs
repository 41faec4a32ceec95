pub mod handler;
pub mod relay_state;

pub use handler::websocket_handler;
pub use relay_state::RelayState;
