//! Pizza Assist: menu-driven ordering bot with background profile enrichment.

pub mod app;
pub mod channels;
pub mod config;
pub mod conversation;
pub mod enrichment;
pub mod error;
pub mod menu;
pub mod store;

#[cfg(test)]
mod fake_http;
