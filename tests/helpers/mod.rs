// ABOUTME: Test helper module exports
// ABOUTME: Shared utilities for HTTP integration tests

pub mod axum_test;
