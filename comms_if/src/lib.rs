//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommand line protocol spoken on the operator links
pub mod tc;

/// Event codes reported by the actuator node
pub mod event;
