pub mod enhance;
pub mod relay;
pub mod title;
