//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the index:
//! - Math types and cube/point geometry
//! - Arena handles and collections
//! - Logging utilities

pub mod math;
pub mod collections;
pub mod logging;
