pub mod config;
pub mod db;
pub mod driver;
pub mod metrics;
pub mod sim;
pub mod solana;
pub mod state;
