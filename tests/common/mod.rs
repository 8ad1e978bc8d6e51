//! Common test utilities and helpers
//!
//! This module provides shared functionality used across integration tests:
//! - Binary path resolution (via `get_ext_build_binary`)
//! - Project and fake tool fixtures (via `helpers`)

pub(crate) mod helpers;

// Re-export get_ext_build_binary for convenient access
#[allow(unused_imports)]
pub(crate) use helpers::get_ext_build_binary;
