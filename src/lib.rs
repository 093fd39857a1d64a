pub mod catalog;
pub mod config;
pub mod dto;
pub mod enrollment;
pub mod error;
pub mod models;
pub mod routes;
pub mod seed;
pub mod state;
pub mod store;
pub mod util;
