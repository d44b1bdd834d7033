// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! One converter per kind of native data.
//!
//! Every flush resolves each record to a target value and writes it only when the native value
//! differs.  A record the engine has not changed resolves to the exact native value captured at
//! conversion, so flushing an untouched container writes nothing, and restoring after a reset
//! is the same pass as a flush.

pub(crate) mod armature;
pub(crate) mod cursor;
pub(crate) mod curve;
pub(crate) mod graph;
pub(crate) mod lattice;
pub(crate) mod mask;
pub(crate) mod mball;
pub(crate) mod mesh;
pub(crate) mod node;
pub(crate) mod paint_curve;
pub(crate) mod particle;
pub(crate) mod pose;
pub(crate) mod sequencer;
pub(crate) mod tracking;
pub(crate) mod uv;

use crate::error::TransformError;
use crate::session::FlushReport;
use scene::{DataSource, Object, Scene};

pub(crate) fn object(scene: &Scene, source: DataSource) -> Result<&Object, TransformError> {
    match source {
        DataSource::Object(id) => scene.object(id).ok_or(TransformError::MissingSource(source)),
        _ => Err(TransformError::MissingSource(source)),
    }
}

pub(crate) fn object_mut(
    scene: &mut Scene,
    source: DataSource,
) -> Result<&mut Object, TransformError> {
    match source {
        DataSource::Object(id) => scene
            .object_mut(id)
            .ok_or(TransformError::MissingSource(source)),
        _ => Err(TransformError::MissingSource(source)),
    }
}

/// Writes `value` into `slot` if it differs, counting the write.
#[inline]
pub(crate) fn write<T: PartialEq>(slot: &mut T, value: T, report: &mut FlushReport) {
    if *slot != value {
        *slot = value;
        report.written += 1;
    }
}

// End of File
