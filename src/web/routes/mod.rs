pub mod activities;
pub mod activity;
pub mod admin;
pub mod auth;
pub mod chatbot;
pub mod groups;
pub mod health;
pub mod ideas;
pub mod notifications;
pub mod profile;
pub mod qr;
