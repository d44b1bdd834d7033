// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Tracking markers at the current frame.  A selected marker is one record for its position;
//! pattern and search areas stored relative to it follow.  Otherwise selected pattern corners
//! and search bounds are records of their own.  Records are in clip space scaled by aspect.

use super::write;
use crate::error::TransformError;
use crate::session::{FlushReport, TransContext, TransConvert, TransDomain, TransInfo};
use crate::trans_data::{
    ContainerCustom, ExtraData, MarkerPart, OwnerRef, TdFlags, TransData, TransDataContainer,
};
use common::math::{flatten, lift};
use scene::tracking::{Marker, TrackSelect, Tracking};
use scene::{DataSource, Scene};
use std::collections::BTreeMap;
use ultraviolet::Vec2;

pub(crate) struct TrackingConverter;

fn clip_aspect(tracking: &Tracking) -> Vec2 {
    let [w, h] = tracking.clip_size;
    if w == 0 || h == 0 {
        return Vec2::one();
    }
    let max = w.max(h) as f32;
    Vec2::new(w as f32 / max, h as f32 / max)
}

fn part_value(marker: &Marker, part: MarkerPart) -> Option<Vec2> {
    match part {
        MarkerPart::Position => Some(marker.pos),
        MarkerPart::PatternCorner(k) => marker.pattern_corners.get(k as usize).copied(),
        MarkerPart::SearchMin => Some(marker.search_min),
        MarkerPart::SearchMax => Some(marker.search_max),
    }
}

fn set_part(marker: &mut Marker, part: MarkerPart, value: Vec2) {
    match part {
        MarkerPart::Position => marker.pos = value,
        MarkerPart::PatternCorner(k) => {
            if let Some(corner) = marker.pattern_corners.get_mut(k as usize) {
                *corner = value;
            }
        }
        MarkerPart::SearchMin => marker.search_min = value,
        MarkerPart::SearchMax => marker.search_max = value,
    }
}

fn create_trans_tracking_data(tracking: &Tracking, frame: i32) -> TransDataContainer {
    let mut tc = TransDataContainer::new(DataSource::Tracking, TransDomain::Tracking);
    tc.aspect = clip_aspect(tracking);
    let aspect = tc.aspect;
    let mut snapshots = Vec::new();

    for (t, track) in tracking.tracks.iter().enumerate() {
        if track.hidden || track.locked || track.select.is_empty() {
            continue;
        }
        let Some(m) = track.marker_at(frame) else {
            continue;
        };
        let marker = &track.markers[m];
        if marker.disabled {
            continue;
        }

        let parts: Vec<MarkerPart> = if track.select.contains(TrackSelect::MARKER) {
            vec![MarkerPart::Position]
        } else {
            let mut parts = Vec::new();
            if track.select.contains(TrackSelect::PATTERN) {
                parts.extend((0..4).map(MarkerPart::PatternCorner));
            }
            if track.select.contains(TrackSelect::SEARCH) {
                parts.extend([MarkerPart::SearchMin, MarkerPart::SearchMax]);
            }
            parts
        };

        let first = tc.data.len();
        for part in parts {
            let Some(native) = part_value(marker, part) else {
                continue;
            };
            let abs = match part {
                MarkerPart::Position => native,
                _ => marker.pos + native,
            };
            tc.data.push(
                TransData::new(OwnerRef::Marker { track: t, marker: m, part }, lift(abs * aspect))
                    .with_center(lift(marker.pos * aspect))
                    .with_flags(TdFlags::SELECTED)
                    .with_extra(ExtraData::Native2D(native)),
            );
        }
        if tc.data.len() > first {
            snapshots.push(((t, m), *marker));
        }
    }
    tc.custom = ContainerCustom::Markers(snapshots);
    tc
}

/// Grows the search area until it encloses the pattern.  Returns whether it changed.
fn clamp_search_to_pattern(marker: &mut Marker) -> bool {
    let (pmin, pmax) = marker.pattern_bounds();
    let search_min = marker.search_min.min_by_component(pmin);
    let search_max = marker.search_max.max_by_component(pmax);
    let changed = search_min != marker.search_min || search_max != marker.search_max;
    marker.search_min = search_min;
    marker.search_max = search_max;
    changed
}

/// Stages every converted marker from its snapshot with the records applied.  Parts without a
/// record, and the search area grown by an earlier flush, come from the snapshot as well.
fn write_back(tc: &TransDataContainer, tracking: &mut Tracking, report: &mut FlushReport) {
    let ContainerCustom::Markers(snapshots) = &tc.custom else {
        return;
    };
    let mut staged: BTreeMap<(usize, usize), (Marker, bool)> = snapshots
        .iter()
        .map(|&(key, marker)| (key, (marker, false)))
        .collect();

    // Positions first: relative parts are resolved against the new position.
    let mut records: Vec<_> = tc.data().iter().collect();
    records.sort_by_key(|td| {
        !matches!(td.owner, OwnerRef::Marker { part: MarkerPart::Position, .. })
    });

    for td in records {
        let (OwnerRef::Marker { track, marker, part }, &ExtraData::Native2D(original)) =
            (td.owner, &td.extra)
        else {
            continue;
        };
        let Some((staged_marker, changed)) = staged.get_mut(&(track, marker)) else {
            continue;
        };
        let value = if td.is_changed() {
            *changed = true;
            let abs = flatten(td.working_location) / tc.aspect;
            match part {
                MarkerPart::Position => abs,
                _ => abs - staged_marker.pos,
            }
        } else {
            original
        };
        set_part(staged_marker, part, value);
    }

    for ((track, marker), (mut staged_marker, changed)) in staged {
        if changed && clamp_search_to_pattern(&mut staged_marker) {
            report.clamped += 1;
        }
        if let Some(native) = tracking
            .tracks
            .get_mut(track)
            .and_then(|t| t.markers.get_mut(marker))
        {
            write(native, staged_marker, report);
        }
    }
}

impl TransConvert for TrackingConverter {
    fn create(&self, t: &mut TransInfo, scene: &Scene) -> Result<(), TransformError> {
        t.containers
            .push(create_trans_tracking_data(&scene.tracking, scene.current_frame));
        Ok(())
    }

    fn validate(&self, tc: &TransDataContainer, scene: &Scene) -> Result<(), TransformError> {
        tc.check_owners(|owner| match owner {
            OwnerRef::Marker { track, marker, .. } => scene
                .tracking
                .tracks
                .get(track)
                .is_some_and(|t| marker < t.markers.len()),
            _ => false,
        })
    }

    fn flush(
        &self,
        _ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError> {
        write_back(tc, &mut scene.tracking, report);
        Ok(())
    }

    fn restore(
        &self,
        _ctx: &TransContext,
        tc: &TransDataContainer,
        scene: &mut Scene,
    ) -> Result<(), TransformError> {
        write_back(tc, &mut scene.tracking, &mut FlushReport::default());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scene::tracking::Track;

    fn tracking(select: TrackSelect) -> Tracking {
        let mut track = Track::new("Track", vec![Marker::new(1, Vec2::new(0.5, 0.5))]);
        track.select = select;
        Tracking {
            tracks: vec![track],
            clip_size: [200, 100],
        }
    }

    #[test]
    fn marker_position_round_trips_through_aspect() {
        let mut tracking = tracking(TrackSelect::MARKER);
        let mut tc = create_trans_tracking_data(&tracking, 10);
        assert_eq!(tc.len(), 1);
        assert_eq!(tc.data()[0].working_location, lift(Vec2::new(0.5, 0.25)));
        tc.data_mut()[0].working_location = lift(Vec2::new(0.25, 0.25));
        write_back(&tc, &mut tracking, &mut FlushReport::default());
        assert_eq!(tracking.tracks[0].markers[0].pos, Vec2::new(0.25, 0.5));
    }

    #[test]
    fn dragged_pattern_corner_grows_the_search_area() {
        let mut tracking = tracking(TrackSelect::PATTERN);
        let mut tc = create_trans_tracking_data(&tracking, 1);
        assert_eq!(tc.len(), 4);
        // Corner 2 is the top right one; pull it far outside the search area.
        tc.data_mut()[2].working_location = lift(Vec2::new(0.75, 0.375));
        let mut report = FlushReport::default();
        write_back(&tc, &mut tracking, &mut report);
        let marker = &tracking.tracks[0].markers[0];
        assert_eq!(report.clamped, 1);
        assert!(marker.search_max.x >= marker.pattern_corners[2].x);
        assert!(marker.search_max.y >= marker.pattern_corners[2].y);
    }

    #[test]
    fn reset_records_restore_the_grown_search_area() {
        let mut tracking = tracking(TrackSelect::PATTERN);
        let before = tracking.clone();
        let mut tc = create_trans_tracking_data(&tracking, 1);
        tc.data_mut()[2].working_location = lift(Vec2::new(0.95, 0.475));
        write_back(&tc, &mut tracking, &mut FlushReport::default());
        let search_max = |t: &Tracking| t.tracks[0].markers[0].search_max;
        assert_ne!(search_max(&tracking), search_max(&before));

        tc.reset();
        let mut report = FlushReport::default();
        write_back(&tc, &mut tracking, &mut report);
        assert_eq!(tracking, before);
        assert_eq!(report.clamped, 0);
    }
}

// End of File
