pub mod analysis;
pub mod combo;
pub mod config;
pub mod field;
pub mod logic;
pub mod rng;
pub mod types;
