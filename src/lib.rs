//! ASILTCOM Core Library
//!
//! This crate provides the core functionality for the ASILTCOM messenger,
//! including conversation persistence, reply generation, realtime voice
//! calls, and telemetry.

pub mod call;
pub mod reply;
pub mod store;
pub mod telemetry;
