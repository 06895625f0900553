//! # End-to-End Test Suite for Lerp Face
//!
//! These tests drive the engine the way the demo host does: notifications in, frames out.
//! Unit tests for the individual building blocks live next to their modules in the library.
