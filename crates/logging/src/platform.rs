// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

/// Initializes the logging framework to capture logs from the crates specified with a minimum
/// [`log::Level`] of [`Info`](log::Level::Info) on debug builds and [`Warn`](log::Level::Warn) on
/// release builds.  On desktop platforms, these defaults can be overridden by setting the
/// `RUST_LOG` environment variable.
pub struct Logging {
    crates: Vec<&'static str>,
    level: log::LevelFilter,
}

impl Logging {
    /// Creates a new [`Logging`] instance with the specified list of crates to capture logs
    /// from, at the default level for the current build profile.
    pub fn new(crates: Vec<&'static str>) -> Self {
        Self {
            crates,
            level: if cfg!(debug_assertions) {
                log::LevelFilter::Info
            } else {
                log::LevelFilter::Warn
            },
        }
    }

    /// Overrides the default level.  `RUST_LOG` still takes precedence on desktop platforms.
    pub fn with_level(mut self, level: log::LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Installs the global logger.  Returns false if a logger was already installed, which is
    /// expected when several tests in one binary each ask for logging.
    pub fn init(&self) -> bool {
        crate::platform_impl::init_with_level(&self.crates, self.level)
    }
}

// End of File
