pub mod api;
pub mod client;
pub mod config;
pub mod contract;
pub mod db;
pub mod error;
pub mod filter;
pub mod identity;
pub mod models;
pub mod services;
pub mod state;
pub mod view;
