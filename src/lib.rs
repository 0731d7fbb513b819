// src/lib.rs

//! Classroom Library
//!
//! Learner-side lecture progress, quiz evaluation and certificate issuance
//! against a remote learning backend.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod quiz;
pub mod services;
pub mod storage;
pub mod utils;
