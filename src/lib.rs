//! ext-build internal library code

pub mod config;
pub mod debug;
pub mod env_vars;
pub mod extensions;
pub mod output;
pub mod paths;
pub mod platform;

// Re-export common types for convenience
pub use config::{Config, ToolchainOverrides};
pub use debug::{init_debug, is_debug_enabled};
pub use extensions::{
    BuildReport, CmakeExtension, ExtensionBuilder, ExtensionError, ExtensionTarget, Mode, Phase,
    PostBuildPolicy, TargetOptions, Toolchain, build_extensions,
};
pub use output::{Channel, Console, MemoryConsole, TerminalConsole};
pub use platform::HostFamily;
