//! regionmap - Download static map images of administrative regions with
//! their boundary drawn on top

pub mod api;
pub mod builder;
pub mod config;
pub mod domain;
pub mod download;
pub mod error;
pub mod geometry;
pub mod output;

pub use error::MapError;
