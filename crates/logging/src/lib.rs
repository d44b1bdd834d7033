// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! # Logging setup for the transform conversion crates
//!
//! The conversion layer only ever emits records through the [`log`] facade.  Hosts (the editor
//! session, test harnesses, command line tools) call [`Logging::init`] once to route those
//! records somewhere: [`env_logger`] on desktop platforms and `console_log` in the browser.
//!
//! By default, the logging level is set to [`Info`](log::Level::Info) for debug builds, and
//! [`Warn`](log::Level::Warn) for release builds. This can be overridden by setting the `RUST_LOG`
//! environment variable, like so:
//!
//! ```sh
//! $> RUST_LOG=transconv=debug cargo test
//! ```

mod platform;
mod platform_impl;
pub use platform::Logging;

/// A module which is typically glob imported.
pub mod prelude {
    pub use super::Logging;
}

// End of File
