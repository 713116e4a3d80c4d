pub mod allocator;
pub mod api;
pub mod app;
pub mod config;
pub mod logging;
pub mod models;
pub mod redirect;
pub mod shortcode;
pub mod storage;
pub mod validation;
