// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::trans_data::OwnerRef;
use scene::DataSource;
use thiserror::Error;

/// Errors that abort a transform operation.
///
/// Problems with individual elements (a non-finite mask handle, a strip pushed past the last
/// channel) are never reported here; flushers clamp or reject those locally and count them in
/// the [`FlushReport`](crate::FlushReport).
#[derive(Debug, Error)]
pub enum TransformError {
    /// A record refers to native data that no longer exists.
    ///
    /// Something other than the transform deleted elements while the operation was running.
    /// Nothing was written; the caller must abort the transform.
    #[error("Stale reference to {owner:?} in {data:?}")]
    StaleReference { data: DataSource, owner: OwnerRef },

    /// The object or editor a container was built from is gone.
    #[error("Transform source {0:?} no longer exists")]
    MissingSource(DataSource),

    /// A pose transform was requested on an object that is not an armature.
    #[error("Object {0} has no armature to pose")]
    NoTransformableBones(scene::ObjectId),

    /// The session was already confirmed or cancelled.
    #[error("Transform session already finished")]
    SessionFinished,
}

/// Errors while reading [`TransformSettings`](crate::TransformSettings).
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings: {0}")]
    Parse(#[from] serde_json::Error),
}

// End of File
