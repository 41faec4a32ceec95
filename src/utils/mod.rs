pub mod clock;
pub mod ids;
pub mod scope_guard;
