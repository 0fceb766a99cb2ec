pub mod app;
pub mod config;
pub mod debounce;
pub mod error;
pub mod models;
pub mod summary;
pub mod tmdb;
pub mod views;
