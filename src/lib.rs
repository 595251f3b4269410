//! Library exports for the TinyApp URL shortener
//!
//! The short code machinery ([`generator`], [`hash`], [`allocator`]) knows
//! nothing about HTTP; the remaining modules wire it into an axum application.

pub mod allocator;
pub mod config;
pub mod database;
pub mod error;
pub mod generator;
pub mod handler;
pub mod hash;
pub mod middleware;
pub mod model;
pub mod password;
pub mod route;
pub mod session;
pub mod state;
