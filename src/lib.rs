pub mod config;
pub mod error;
pub mod fetch;
pub mod load;
pub mod model;
pub mod pipeline;
pub mod services;
pub mod store;
pub mod tables;
