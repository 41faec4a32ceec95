pub mod block;
pub mod diagnostics;
pub mod health;
pub mod messages;
pub mod peer;
pub mod session;
pub mod stream;

pub use block::*;
pub use diagnostics::*;
pub use health::*;
pub use messages::*;
pub use peer::*;
pub use session::*;
pub use stream::*;
