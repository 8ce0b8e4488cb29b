pub mod config;
pub mod database;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod web;
