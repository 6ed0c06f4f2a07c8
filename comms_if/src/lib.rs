//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command grammar and parsing
pub mod cmd;

/// Demand definitions for equipment (the wheel motors)
pub mod eqpt;

/// Network module
pub mod net;

/// Response line formatting
pub mod response;
