// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

//! Sequencer strips.  A selected strip is one record at `(start, channel)`; a strip with only
//! a handle selected gets a record for that handle, which moves its frame alone.

use super::write;
use crate::error::TransformError;
use crate::session::{FlushReport, TransContext, TransConvert, TransDomain, TransInfo};
use crate::trans_data::{ExtraData, OwnerRef, StripSide, TdFlags, TransData, TransDataContainer};
use scene::sequencer::{Sequencer, StripSelect};
use scene::{DataSource, Scene};
use std::collections::BTreeMap;
use ultraviolet::{Vec2, Vec3};

pub(crate) struct SequencerConverter;

fn create_trans_seq_data(seq: &Sequencer) -> TransDataContainer {
    let mut tc = TransDataContainer::new(DataSource::Sequencer, TransDomain::Sequencer);
    for (i, strip) in seq.strips.iter().enumerate() {
        if strip.locked || !strip.select.intersects(StripSelect::all()) {
            continue;
        }
        let channel = strip.channel as f32;
        let span = ExtraData::Native2D(Vec2::new(strip.start as f32, strip.end as f32));
        let mut push = |side: StripSide, frame: i32| {
            tc.data.push(
                TransData::new(
                    OwnerRef::Strip { strip: i, side },
                    Vec3::new(frame as f32, channel, 0.0),
                )
                .with_flags(TdFlags::SELECTED)
                .with_extra(span.clone()),
            );
        };
        if strip.select.contains(StripSelect::STRIP) {
            push(StripSide::Whole, strip.start);
        } else {
            if strip.select.contains(StripSelect::LEFT) {
                push(StripSide::Left, strip.start);
            }
            if strip.select.contains(StripSelect::RIGHT) {
                push(StripSide::Right, strip.end);
            }
        }
    }
    tc
}

#[derive(Clone, Copy, Debug)]
struct StagedStrip {
    start: i32,
    end: i32,
    channel: i32,
    right_moved: bool,
}

/// Resolves the records of each strip to its new frame range and channel.
fn stage_strips(
    ctx: &TransContext,
    tc: &TransDataContainer,
    report: &mut FlushReport,
) -> BTreeMap<usize, StagedStrip> {
    let max_channel = ctx.settings.sequencer_max_channel.max(1);
    let mut staged: BTreeMap<usize, StagedStrip> = BTreeMap::new();
    for td in tc.data() {
        let (OwnerRef::Strip { strip, side }, ExtraData::Native2D(span)) = (td.owner, &td.extra)
        else {
            continue;
        };
        let original_channel = td.original_location().y as i32;
        let entry = staged.entry(strip).or_insert(StagedStrip {
            start: span.x as i32,
            end: span.y as i32,
            channel: original_channel,
            right_moved: false,
        });
        if !td.is_changed() {
            continue;
        }
        let frame = td.working_location.x.round() as i32;
        match side {
            StripSide::Whole => {
                let delta = frame - span.x as i32;
                entry.start += delta;
                entry.end += delta;
                let channel = td.working_location.y.round() as i32;
                let clamped = channel.clamp(1, max_channel);
                if clamped != channel {
                    report.clamped += 1;
                }
                entry.channel = clamped;
            }
            StripSide::Left => entry.start = frame,
            StripSide::Right => {
                entry.end = frame;
                entry.right_moved = true;
            }
        }
    }
    for s in staged.values_mut() {
        if s.end - s.start < 1 {
            if s.right_moved {
                s.end = s.start + 1;
            } else {
                s.start = s.end - 1;
            }
            report.clamped += 1;
        }
    }
    staged
}

fn write_back(
    ctx: &TransContext,
    tc: &TransDataContainer,
    seq: &mut Sequencer,
    report: &mut FlushReport,
) {
    for (i, s) in stage_strips(ctx, tc, report) {
        if let Some(strip) = seq.strips.get_mut(i) {
            write(&mut strip.start, s.start, report);
            write(&mut strip.end, s.end, report);
            write(&mut strip.channel, s.channel, report);
        }
    }
}

/// Moves transformed strips that ended up overlapping another strip to the nearest free
/// channel above, or below when the top is reached.
fn shuffle_overlapping(
    ctx: &TransContext,
    tc: &TransDataContainer,
    seq: &mut Sequencer,
    report: &mut FlushReport,
) {
    let max_channel = ctx.settings.sequencer_max_channel.max(1);
    let mut moved: Vec<usize> = tc
        .data()
        .iter()
        .filter(|td| td.is_changed())
        .filter_map(|td| match td.owner {
            OwnerRef::Strip { strip, .. } => Some(strip),
            _ => None,
        })
        .collect();
    moved.dedup();

    for i in moved {
        let Some(strip) = seq.strips.get(i).cloned() else {
            continue;
        };
        let collides = |channel: i32| {
            seq.strips.iter().enumerate().any(|(j, other)| {
                j != i
                    && other.channel == channel
                    && strip.start < other.end
                    && other.start < strip.end
            })
        };
        if !collides(strip.channel) {
            continue;
        }
        let free = (strip.channel + 1..=max_channel)
            .chain((1..strip.channel).rev())
            .find(|&c| !collides(c));
        match free {
            Some(channel) => {
                log::debug!("Strip {} shuffled to channel {}", strip.name, channel);
                if let Some(s) = seq.strips.get_mut(i) {
                    write(&mut s.channel, channel, report);
                }
            }
            None => {
                log::warn!("No free channel for strip {}", strip.name);
                report.rejected += 1;
            }
        }
    }
}

impl TransConvert for SequencerConverter {
    fn create(&self, t: &mut TransInfo, scene: &Scene) -> Result<(), TransformError> {
        t.containers.push(create_trans_seq_data(&scene.sequencer));
        Ok(())
    }

    fn validate(&self, tc: &TransDataContainer, scene: &Scene) -> Result<(), TransformError> {
        let len = scene.sequencer.strips.len();
        tc.check_owners(|owner| matches!(owner, OwnerRef::Strip { strip, .. } if strip < len))
    }

    fn flush(
        &self,
        ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError> {
        write_back(ctx, tc, &mut scene.sequencer, report);
        Ok(())
    }

    fn restore(
        &self,
        ctx: &TransContext,
        tc: &TransDataContainer,
        scene: &mut Scene,
    ) -> Result<(), TransformError> {
        write_back(ctx, tc, &mut scene.sequencer, &mut FlushReport::default());
        Ok(())
    }

    fn finish(
        &self,
        ctx: &TransContext,
        tc: &mut TransDataContainer,
        scene: &mut Scene,
        report: &mut FlushReport,
    ) -> Result<(), TransformError> {
        shuffle_overlapping(ctx, tc, &mut scene.sequencer, report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{PivotMode, TransformSettings};
    use scene::sequencer::Strip;

    fn ctx() -> TransContext {
        TransContext {
            mode: Default::default(),
            pivot: PivotMode::MedianPoint,
            settings: TransformSettings::default(),
        }
    }

    #[test]
    fn strip_moves_whole_and_channel_is_clamped() {
        let mut seq = Sequencer {
            strips: vec![Strip::new("a", 10, 20, 1).selected(StripSelect::STRIP)],
        };
        let mut tc = create_trans_seq_data(&seq);
        tc.data_mut()[0].working_location = Vec3::new(14.6, -3.0, 0.0);
        let mut report = FlushReport::default();
        write_back(&ctx(), &tc, &mut seq, &mut report);
        assert_eq!((seq.strips[0].start, seq.strips[0].end), (15, 25));
        assert_eq!(seq.strips[0].channel, 1);
        assert_eq!(report.clamped, 1);
    }

    #[test]
    fn handles_keep_a_minimum_length() {
        let mut seq = Sequencer {
            strips: vec![Strip::new("a", 10, 20, 1).selected(StripSelect::LEFT)],
        };
        let mut tc = create_trans_seq_data(&seq);
        tc.data_mut()[0].working_location.x = 30.0;
        write_back(&ctx(), &tc, &mut seq, &mut FlushReport::default());
        assert_eq!((seq.strips[0].start, seq.strips[0].end), (19, 20));
    }

    #[test]
    fn overlapping_strip_is_shuffled_up() {
        let mut seq = Sequencer {
            strips: vec![
                Strip::new("a", 0, 10, 1).selected(StripSelect::STRIP),
                Strip::new("b", 20, 30, 1),
            ],
        };
        let mut tc = create_trans_seq_data(&seq);
        tc.data_mut()[0].working_location.x = 25.0;
        let mut report = FlushReport::default();
        write_back(&ctx(), &tc, &mut seq, &mut report);
        shuffle_overlapping(&ctx(), &tc, &mut seq, &mut report);
        assert_eq!(seq.strips[0].channel, 2);
        assert!(!seq.strips[0].overlaps(&seq.strips[1]));
    }
}

// End of File
