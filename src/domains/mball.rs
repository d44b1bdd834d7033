// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Metaball elements.  Besides their location they carry a rotation and per-axis size in
//! `ext`, and either their radius or their stiffness in `value`.

use super::{object, object_mut, write};
use crate::error::TransformError;
use crate::falloff::euclidean_falloff;
use crate::session::{FlushReport, TransContext, TransConvert, TransDomain, TransInfo};
use crate::trans_data::{OwnerRef, TdFlags, TransData, TransDataContainer, TransDataExt};
use scene::metaball::MetaBall;
use scene::{DataSource, ObjectMode, Scene};

pub(crate) struct MetaBallConverter;

fn create_trans_mball_verts(
    t: &TransInfo,
    source: DataSource,
    mball: &MetaBall,
) -> TransDataContainer {
    let settings = &t.context.settings;
    let mut tc = TransDataContainer::new(source, TransDomain::MetaBall);
    for (i, ml) in mball.elems.iter().enumerate() {
        if ml.hidden || !(ml.selected || settings.proportional) {
            continue;
        }
        // Scaling an element with radius scaling enabled grows its radius; otherwise the
        // scalar channel adjusts stiffness.
        let value = if ml.scale_radius { ml.radius } else { ml.stiffness };
        let mut td = TransData::new(OwnerRef::MetaElem(i), ml.co)
            .with_flags(TdFlags::USE_ROTATE | TdFlags::USE_SCALE | TdFlags::INDIVIDUAL_ORIGIN)
            .with_ext(TransDataExt::new(ml.rot, ml.size))
            .with_value(value);
        td.axis_matrix = ml.rot.into_matrix();
        if ml.selected {
            td.flags |= TdFlags::SELECTED;
        }
        if mball.active == Some(i) {
            tc.active = Some(tc.data.len());
        }
        tc.data.push(td);
    }
    if settings.proportional {
        euclidean_falloff(&mut tc.data, settings.disconnected_falloff);
    }
    tc
}

fn write_back(tc: &TransDataContainer, mball: &mut MetaBall, report: &mut FlushReport) {
    for td in tc.data() {
        let OwnerRef::MetaElem(i) = td.owner else {
            continue;
        };
        let Some(ml) = mball.elems.get_mut(i) else {
            continue;
        };
        let changed = td.is_changed();
        let co = if changed { td.working_location } else { td.original_location() };
        write(&mut ml.co, co, report);
        if let Some(ext) = td.ext {
            let (rot, size) = if changed {
                (ext.rot, ext.scale)
            } else {
                (ext.original_rotation(), ext.original_scale())
            };
            write(&mut ml.rot, rot, report);
            write(&mut ml.size, size, report);
        }
        if let Some(value) = td.value {
            let val = if changed { value.val.max(0.0) } else { value.original() };
            if ml.scale_radius {
                write(&mut ml.radius, val, report);
            } else {
                write(&mut ml.stiffness, val, report);
            }
        }
    }
}

fn mball_of(scene: &mut Scene, source: DataSource) -> Result<&mut MetaBall, TransformError> {
    object_mut(scene, source)?
        .metaball_mut()
        .ok_or(TransformError::MissingSource(source))
}

impl TransConvert for MetaBallConverter {
    fn create(&self, t: &mut TransInfo, scene: &Scene) -> Result<(), TransformError> {
        let mut containers = Vec::new();
        for ob in scene.objects_in_mode(ObjectMode::Edit) {
            if let Some(mball) = ob.metaball() {
                containers.push(
                    create_trans_mball_verts(t, DataSource::Object(ob.id), mball)
                        .with_matrix(ob.matrix, ob.location),
                );
            }
        }
        t.containers.extend(containers);
        Ok(())
    }

    fn validate(&self, tc: &TransDataContainer, scene: &Scene) -> Result<(), TransformError> {
        let mball = object(scene, tc.source)?
            .metaball()
            .ok_or(TransformError::MissingSource(tc.source))?;
        tc.check_owners(|owner| matches!(owner, OwnerRef::MetaElem(i) if i < mball.elems.len()))
    }

    fn flush(
        &self,
        _ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError> {
        write_back(tc, mball_of(scene, tc.source)?, report);
        Ok(())
    }

    fn restore(
        &self,
        _ctx: &TransContext,
        tc: &TransDataContainer,
        scene: &mut Scene,
    ) -> Result<(), TransformError> {
        write_back(tc, mball_of(scene, tc.source)?, &mut FlushReport::default());
        Ok(())
    }
}

// End of File
