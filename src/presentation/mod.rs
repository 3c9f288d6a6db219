//! Presentation Layer
//!
//! Command surface exposed to chat users.

pub mod commands;
