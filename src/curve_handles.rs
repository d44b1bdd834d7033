// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::trans_data::{ExtraData, TransData};
use common::ids::BezPart;
use scene::bezier::{update_moved_handles, BezSelect, BezTriple, HandleType};
use ultraviolet::Vec3;

/// The handle types of a Bezier triple at conversion time.  Every flush starts from these, so
/// automatic handles are demoted only for the moves of the current drag and a cancel puts
/// them back exactly.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CurveHandleSnapshot {
    pub h1: HandleType,
    pub h2: HandleType,
}

impl CurveHandleSnapshot {
    pub fn capture(bezt: &BezTriple) -> Self {
        Self {
            h1: bezt.h1,
            h2: bezt.h2,
        }
    }

    pub fn restore(&self, bezt: &mut BezTriple) {
        bezt.h1 = self.h1;
        bezt.h2 = self.h2;
    }
}

/// Attaches a handle snapshot of `bezt` to the record.  Called once per triple, on the first
/// record converted from it.
pub fn init_trans_data_curve_handles(td: &mut TransData, bezt: &BezTriple) {
    td.extra = ExtraData::CurveHandles(CurveHandleSnapshot::capture(bezt));
}

/// The snapshot attached to a record, if any.
pub fn curve_handles(td: &TransData) -> Option<&CurveHandleSnapshot> {
    match &td.extra {
        ExtraData::CurveHandles(snapshot) => Some(snapshot),
        _ => None,
    }
}

/// Rebuilds a list of Bezier triples from its snapshot `orig` with the changed records applied,
/// then re-runs the handle rules for the triples that moved.
///
/// `resolve` maps a changed record and the original position of its point to the new position.
/// With `knot_moves_triple`, a knot record carries both handles along by the same offset, for
/// editors that do not convert handles separately.
pub(crate) fn stage_bezier<'a>(
    orig: &[BezTriple],
    cyclic: bool,
    records: impl IntoIterator<Item = (usize, BezPart, &'a TransData)>,
    knot_moves_triple: bool,
    mut resolve: impl FnMut(&TransData, Vec3) -> Vec3,
) -> Vec<BezTriple> {
    let mut staged = orig.to_vec();
    let mut moved = vec![BezSelect::empty(); staged.len()];
    for (point, part, td) in records {
        let Some(bezt) = staged.get_mut(point) else {
            continue;
        };
        if let Some(handles) = curve_handles(td) {
            handles.restore(bezt);
        }
        if !td.is_changed() {
            continue;
        }
        let co = resolve(td, orig[point].point(part));
        if co == orig[point].point(part) {
            continue;
        }
        if knot_moves_triple && part == BezPart::Knot {
            let delta = co - orig[point].knot();
            for (dst, src) in bezt.vec.iter_mut().zip(orig[point].vec) {
                *dst = src + delta;
            }
            moved[point] = BezSelect::all();
        } else {
            bezt.set_point(part, co);
            moved[point] |= BezSelect::from_part(part);
        }
    }
    update_moved_handles(&mut staged, cyclic, &moved);
    staged
}


// End of File
