pub mod analysis;
pub mod api;
pub mod cli;
pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod recommendations;
pub mod stats;
pub mod store;
