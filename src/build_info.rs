//! Compile-time build metadata.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Short git hash, or `unknown` outside a checkout.
pub const GIT_COMMIT: &str = env!("TMUXCTL_BUILD_GIT_HASH");

pub const BUILD_TIMESTAMP: &str = env!("TMUXCTL_BUILD_TIMESTAMP");

/// Trailer appended to `tmuxctl --help`.
pub const HELP_BUILD_METADATA: &str = concat!(
    "Build metadata:\n  commit: ",
    env!("TMUXCTL_BUILD_GIT_HASH"),
    "\n  built: ",
    env!("TMUXCTL_BUILD_TIMESTAMP")
);

/// Text printed by `tmuxctl --version`.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("TMUXCTL_BUILD_GIT_HASH"),
    "\nbuilt: ",
    env!("TMUXCTL_BUILD_TIMESTAMP")
);
