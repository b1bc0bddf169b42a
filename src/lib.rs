// src/lib.rs
pub mod db;
pub mod error;
pub mod models;
pub mod seed;
pub mod services;
pub mod state;
pub mod storage;
pub mod templates;
pub mod web;
