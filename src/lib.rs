#![allow(clippy::module_name_repetitions)]

pub mod analysis;
pub mod app;
pub mod config;
pub mod error;
pub mod model;
pub mod observability;
pub mod pipeline;
pub mod store;
pub mod taxonomy;
