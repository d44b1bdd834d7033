// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use super::{object, object_mut, write};
use crate::error::TransformError;
use crate::falloff::euclidean_falloff;
use crate::islands::build_islands;
use crate::session::{FlushReport, TransContext, TransConvert, TransDomain, TransInfo};
use crate::trans_data::{OwnerRef, TdFlags, TransData, TransDataContainer};
use scene::lattice::Lattice;
use scene::{DataSource, ObjectMode, Scene};
use std::collections::HashMap;

pub(crate) struct LatticeConverter;

fn create_trans_lattice_verts(
    t: &TransInfo,
    source: DataSource,
    lattice: &Lattice,
) -> TransDataContainer {
    let settings = &t.context.settings;
    let mut tc = TransDataContainer::new(source, TransDomain::Lattice);
    let mut record_of = HashMap::new();
    for (i, bp) in lattice.points.iter().enumerate() {
        if bp.hidden || (lattice.outside_only && !lattice.is_outside(i)) {
            continue;
        }
        if !(bp.selected || settings.proportional) {
            continue;
        }
        let mut td = TransData::new(OwnerRef::LatticePoint(i), bp.co)
            .with_flags(TdFlags::USE_ROTATE | TdFlags::USE_SCALE);
        if bp.selected {
            td.flags |= TdFlags::SELECTED;
        }
        record_of.insert(i, tc.data.len());
        tc.data.push(td);
    }
    if settings.proportional {
        euclidean_falloff(&mut tc.data, settings.disconnected_falloff);
    }

    // Grid neighbours along u, v and w.
    let strides = [1, lattice.pnts_u, lattice.pnts_u * lattice.pnts_v];
    let sizes = [lattice.pnts_u, lattice.pnts_v, lattice.pnts_w];
    let mut links = Vec::new();
    for (&i, &a) in &record_of {
        let coords = [
            i % lattice.pnts_u.max(1),
            (i / lattice.pnts_u.max(1)) % lattice.pnts_v.max(1),
            i / (lattice.pnts_u * lattice.pnts_v).max(1),
        ];
        for axis in 0..3 {
            if coords[axis] + 1 < sizes[axis] {
                if let Some(&b) = record_of.get(&(i + strides[axis])) {
                    links.push((a, b));
                }
            }
        }
    }
    let islands = build_islands(&mut tc.data, links, &[], None, t.context.pivot);
    tc.set_islands(islands);
    tc
}

fn write_back(tc: &TransDataContainer, lattice: &mut Lattice, report: &mut FlushReport) {
    for td in tc.data() {
        let OwnerRef::LatticePoint(i) = td.owner else {
            continue;
        };
        let co = if td.is_changed() {
            td.working_location
        } else {
            td.original_location()
        };
        if let Some(bp) = lattice.points.get_mut(i) {
            write(&mut bp.co, co, report);
        }
    }
}

fn lattice_of(scene: &mut Scene, source: DataSource) -> Result<&mut Lattice, TransformError> {
    object_mut(scene, source)?
        .lattice_mut()
        .ok_or(TransformError::MissingSource(source))
}

impl TransConvert for LatticeConverter {
    fn create(&self, t: &mut TransInfo, scene: &Scene) -> Result<(), TransformError> {
        let mut containers = Vec::new();
        for ob in scene.objects_in_mode(ObjectMode::Edit) {
            if let Some(lattice) = ob.lattice() {
                containers.push(
                    create_trans_lattice_verts(t, DataSource::Object(ob.id), lattice)
                        .with_matrix(ob.matrix, ob.location),
                );
            }
        }
        t.containers.extend(containers);
        Ok(())
    }

    fn validate(&self, tc: &TransDataContainer, scene: &Scene) -> Result<(), TransformError> {
        let lattice = object(scene, tc.source)?
            .lattice()
            .ok_or(TransformError::MissingSource(tc.source))?;
        let len = lattice.points.len();
        tc.check_owners(|owner| matches!(owner, OwnerRef::LatticePoint(i) if i < len))
    }

    fn flush(
        &self,
        _ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError> {
        write_back(tc, lattice_of(scene, tc.source)?, report);
        Ok(())
    }

    fn restore(
        &self,
        _ctx: &TransContext,
        tc: &TransDataContainer,
        scene: &mut Scene,
    ) -> Result<(), TransformError> {
        write_back(tc, lattice_of(scene, tc.source)?, &mut FlushReport::default());
        Ok(())
    }
}

// End of File
