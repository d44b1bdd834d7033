// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! The 3D cursor and the image editor's 2D cursor.  Each converts to a single record so the
//! cursors can be moved with the same engine as selections.

use super::write;
use crate::error::TransformError;
use crate::session::{FlushReport, TransContext, TransConvert, TransDomain, TransInfo};
use crate::trans_data::{
    ExtraData, OwnerRef, TdFlags, TransData, TransDataContainer, TransDataExt,
};
use common::math::{flatten, lift};
use scene::{DataSource, Scene};
use ultraviolet::Vec3;

pub(crate) struct Cursor3DConverter;
pub(crate) struct ImageCursorConverter;

fn cursor_owner(tc: &TransDataContainer) -> Result<(), TransformError> {
    tc.check_owners(|owner| owner == OwnerRef::Cursor)
}

fn unchanged_or<T>(td: &TransData, changed: T, original: T) -> T {
    if td.is_changed() {
        changed
    } else {
        original
    }
}

impl TransConvert for Cursor3DConverter {
    fn create(&self, t: &mut TransInfo, scene: &Scene) -> Result<(), TransformError> {
        let cursor = scene.cursor;
        let mut tc = TransDataContainer::new(DataSource::Cursor3D, TransDomain::Cursor3D);
        let mut td = TransData::new(OwnerRef::Cursor, cursor.location)
            .with_flags(TdFlags::SELECTED | TdFlags::USE_ROTATE)
            .with_ext(TransDataExt::new(cursor.rotation, Vec3::one()));
        td.axis_matrix = cursor.rotation.into_matrix();
        tc.data.push(td);
        t.containers.push(tc);
        Ok(())
    }

    fn validate(&self, tc: &TransDataContainer, _scene: &Scene) -> Result<(), TransformError> {
        cursor_owner(tc)
    }

    fn flush(
        &self,
        _ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError> {
        write_cursor_3d(tc, scene, report);
        Ok(())
    }

    fn restore(
        &self,
        _ctx: &TransContext,
        tc: &TransDataContainer,
        scene: &mut Scene,
    ) -> Result<(), TransformError> {
        write_cursor_3d(tc, scene, &mut FlushReport::default());
        Ok(())
    }
}

fn write_cursor_3d(tc: &TransDataContainer, scene: &mut Scene, report: &mut FlushReport) {
    for td in tc.data() {
        let location = unchanged_or(td, td.working_location, td.original_location());
        write(&mut scene.cursor.location, location, report);
        if let Some(ext) = td.ext {
            let rot = unchanged_or(td, ext.rot, ext.original_rotation());
            write(&mut scene.cursor.rotation, rot, report);
        }
    }
}

fn write_image_cursor(tc: &TransDataContainer, scene: &mut Scene, report: &mut FlushReport) {
    for td in tc.data() {
        let ExtraData::Native2D(original) = td.extra else {
            continue;
        };
        let co = unchanged_or(td, flatten(td.working_location) / tc.aspect, original);
        write(&mut scene.image_cursor, co, report);
    }
}

impl TransConvert for ImageCursorConverter {
    fn create(&self, t: &mut TransInfo, scene: &Scene) -> Result<(), TransformError> {
        let mut tc = TransDataContainer::new(DataSource::ImageCursor, TransDomain::ImageCursor);
        tc.aspect = scene.image_aspect();
        let co = scene.image_cursor * tc.aspect;
        tc.data.push(
            TransData::new(OwnerRef::Cursor, lift(co))
                .with_flags(TdFlags::SELECTED)
                .with_extra(ExtraData::Native2D(scene.image_cursor)),
        );
        t.cursor = lift(co);
        t.containers.push(tc);
        Ok(())
    }

    fn validate(&self, tc: &TransDataContainer, _scene: &Scene) -> Result<(), TransformError> {
        cursor_owner(tc)
    }

    fn flush(
        &self,
        _ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError> {
        write_image_cursor(tc, scene, report);
        Ok(())
    }

    fn restore(
        &self,
        _ctx: &TransContext,
        tc: &TransDataContainer,
        scene: &mut Scene,
    ) -> Result<(), TransformError> {
        write_image_cursor(tc, scene, &mut FlushReport::default());
        Ok(())
    }
}

// End of File
