pub mod api;
pub mod cache;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod mail;
pub mod media;
pub mod service;
