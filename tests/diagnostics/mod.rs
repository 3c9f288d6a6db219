//! Diagnostics Tests
//!
//! Tests for the console sink shared by every subsystem.

mod sink_tests;
