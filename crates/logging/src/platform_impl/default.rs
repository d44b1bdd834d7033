// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

// Mobile hosts install their own logger before the conversion layer is used.
pub(crate) fn init_with_level(crates: &[&'static str], log_level: log::LevelFilter) -> bool {
    let _ = (crates, log_level);
    false
}

// End of File
