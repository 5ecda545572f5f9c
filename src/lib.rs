//! # SIPODI Backend Library
//!
//! GTK 人才申报与审核系统核心库

pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod management;
pub mod storage;
pub mod upload;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, Result};
