//! Command implementations behind the CLI flags

pub(crate) mod build;
pub(crate) mod completion;
