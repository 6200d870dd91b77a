//! HTTP handlers for billing-service.

pub mod bills;
pub mod business;
pub mod health;
