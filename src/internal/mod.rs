pub mod cache;
pub mod controller;
pub mod models;
pub mod notification;
pub mod render;
pub mod store;
pub mod theme;
pub mod ui;
