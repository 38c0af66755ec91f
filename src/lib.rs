pub mod api;
pub mod app;
pub mod client;
pub mod config;
pub mod db;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod session;
pub mod state;
pub mod storage;
pub mod store;
pub mod theme;
pub mod view;
