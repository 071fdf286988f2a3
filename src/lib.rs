//! Scoreboard grid engine: sorting, round/participant filtering and round
//! collapse for tables of scored entries.
//!
//! The host feeds a [`models::Page`] into a [`services::grid_flow::GridStore`],
//! forwards every click as a [`services::grid_flow::GridEvent`] and applies the
//! returned [`services::grid_flow::RenderInstructions`].

pub mod error;
pub mod models;
pub mod services;

pub use error::GridError;
pub use services::grid_flow::{GridEvent, GridStore, RenderInstructions};
