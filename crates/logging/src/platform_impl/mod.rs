// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Desktop routes records through env_logger and web through console_log.  Mobile platforms pull
// the default implementation, which leaves logger installation to the host.

#[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
mod desktop;
#[cfg(any(target_os = "linux", target_os = "macos", target_os = "windows"))]
pub(crate) use self::desktop::*;

#[cfg(target_family = "wasm")]
mod web;
#[cfg(target_family = "wasm")]
pub(crate) use self::web::*;

#[cfg(any(target_os = "android", target_os = "ios"))]
mod default;
#[cfg(any(target_os = "android", target_os = "ios"))]
pub(crate) use self::default::*;

// End of File
