//! Test fixtures and engine-level tests

pub mod helpers;
