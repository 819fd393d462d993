pub mod action_model;
pub mod config;
pub mod handler;
pub mod retry;
pub mod tables;
