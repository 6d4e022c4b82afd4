// src/lib.rs

//! Paper repository CDN purger library

pub mod config;
pub mod error;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod models;
pub mod pipeline;
pub mod purge;
pub mod services;
pub mod storage;
pub mod utils;
