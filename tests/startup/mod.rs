//! Startup Tests
//!
//! Tests for the startup sequence and its configuration handling.

mod configuration_tests;
mod orchestration_tests;
