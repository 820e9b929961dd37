//! Judgeboard API Library
//!
//! Scoring and ranking engine behind the hackathon judges' dashboard:
//! domain model, record store adapters, services and the HTTP layer.

pub mod api;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod services;
