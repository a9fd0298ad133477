pub mod api;
pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod models;
pub mod navigation;
pub mod screens;
pub mod session;
