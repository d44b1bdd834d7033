// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! # Transform conversion
//!
//! Converts the editable data of a [`Scene`](scene::Scene) (mesh vertices, curve points, bones,
//! UVs, strips, keyframes, ...) into one generic record shape, [`TransData`], that a transform
//! engine can move without knowing where the data came from, and writes the results back.
//!
//! A [`TransformSession`] drives one interactive operation:
//!
//! ```no_run
//! # use transconv::*;
//! # fn engine_moves(_: &mut [TransDataContainer]) {}
//! # let mut scene = scene::Scene::new();
//! let mut session = TransformSession::convert(
//!     &mut scene,
//!     TransDomain::Mesh,
//!     TransformMode::Translation,
//!     PivotMode::MedianPoint,
//!     TransformSettings::default(),
//! )?;
//! engine_moves(session.containers_mut());
//! session.flush(&mut scene, &mut ())?;
//! session.confirm(&mut scene, &mut ())?;
//! # Ok::<(), TransformError>(())
//! ```
//!
//! Records never hold references into the scene, only indices, and every flush checks them
//! before writing anything.  An untouched record always writes back the exact value it was
//! converted from, so converting and flushing without moving anything leaves the scene as it
//! was, and [`TransformSession::cancel`] restores it exactly.

pub mod curve_handles;
mod domains;
pub mod error;
pub mod falloff;
pub mod islands;
pub mod pivot;
pub mod pose;
pub mod session;
pub mod settings;
pub mod trans_data;

pub use domains::armature::restore_bones;
pub use domains::uv::{clip_uv_data, clip_uv_transform};
pub use error::{SettingsError, TransformError};
pub use islands::IslandData;
pub use session::{
    FlushReport, TransContext, TransDomain, TransInfo, TransformSession, UpdateNotifier,
};
pub use settings::{DisconnectedFalloff, PivotMode, TransformMode, TransformSettings, UvClipMode};
pub use trans_data::{
    ExtraData, OwnerRef, TdFlags, TransData, TransDataContainer, TransDataExt, TransValue,
};

// End of File
