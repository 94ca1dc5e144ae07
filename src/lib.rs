pub mod api;
pub mod config;
pub mod engagement;
pub mod posting;
pub mod scheduler;
