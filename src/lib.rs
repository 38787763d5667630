//! Image restyling service
//!
//! Accepts an uploaded image, submits it to an asynchronous image-generation
//! model on Replicate, polls the prediction to completion and returns the
//! generated image URL.

pub mod app_state;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
