pub mod setup;
pub mod start;
