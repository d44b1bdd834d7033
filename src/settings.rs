// This Source Code Form is subject to the terms of the Mozilla Public License, v. 2.0.
// If a copy of the MPL was not distributed with this file,
// You can obtain one at <https://mozilla.org/MPL/2.0/>.

use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The kind of transform the engine is about to apply.  Converters use it to decide which
/// channels of an element take part (a rotation does not move pose bone locations, a bone roll
/// only touches roll values).
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum TransformMode {
    #[default]
    Translation,
    Rotation,
    Resize,
    Trackball,
    ShrinkFatten,
    BoneSize,
    BoneEnvelopeDist,
    BoneRoll,
    TimeTranslate,
}

impl TransformMode {
    #[inline]
    pub fn is_rotation(self) -> bool {
        matches!(self, TransformMode::Rotation | TransformMode::Trackball)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum PivotMode {
    BoundingBoxCenter,
    Cursor,
    IndividualOrigins,
    #[default]
    MedianPoint,
    ActiveElement,
}

/// Falloff assigned to elements that no selected element can reach through the topology.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub enum DisconnectedFalloff {
    /// Infinitely far: the element is unaffected by proportional editing.
    #[default]
    Unreachable,
    /// A fixed distance.
    Distance(f32),
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum UvClipMode {
    #[default]
    Clamp,
    Wrap,
}

/// User settings that shape how data is converted and flushed.  Every field has a default, so
/// a settings file only needs to list what it changes.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct TransformSettings {
    /// Proportional editing: unselected elements are converted too, weighted by falloff.
    pub proportional: bool,
    /// Measure falloff along the topology instead of straight-line distance.
    pub proportional_connected: bool,
    pub disconnected_falloff: DisconnectedFalloff,
    /// Mirror edits across the object's X axis.
    pub mirror_x: bool,
    pub mirror_epsilon: f32,
    /// Curve handles are hidden: only knots are converted and handles follow them.
    pub curve_hide_handles: bool,
    pub uv_clip_to_bounds: bool,
    pub uv_clip_mode: UvClipMode,
    /// Snap UVs to the pixel grid of the edited image.
    pub uv_pixel_snap: bool,
    /// Round keyframe times to whole frames.
    pub snap_frames: bool,
    pub node_grid: Option<f32>,
    pub sequencer_max_channel: i32,
    pub auto_ik: bool,
    pub auto_ik_chain_len: u32,
    /// The root key of hair particles stays attached to the emitter.
    pub particle_lock_root: bool,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            proportional: false,
            proportional_connected: false,
            disconnected_falloff: DisconnectedFalloff::default(),
            mirror_x: false,
            mirror_epsilon: 1e-4,
            curve_hide_handles: false,
            uv_clip_to_bounds: false,
            uv_clip_mode: UvClipMode::default(),
            uv_pixel_snap: false,
            snap_frames: false,
            node_grid: None,
            sequencer_max_channel: 128,
            auto_ik: false,
            auto_ik_chain_len: 0,
            particle_lock_root: true,
        }
    }
}

impl TransformSettings {
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&text)?;
        log::debug!("Loaded transform settings from {}", path.display());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings =
            TransformSettings::from_json(r#"{ "proportional": true, "uv_clip_mode": "Wrap" }"#)
                .unwrap();
        assert!(settings.proportional);
        assert_eq!(settings.uv_clip_mode, UvClipMode::Wrap);
        assert_eq!(settings.sequencer_max_channel, 128);
    }

    #[test]
    fn disconnected_policy_parses() {
        let settings =
            TransformSettings::from_json(r#"{ "disconnected_falloff": { "Distance": 2.5 } }"#)
                .unwrap();
        assert_eq!(settings.disconnected_falloff, DisconnectedFalloff::Distance(2.5));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            TransformSettings::from_json("{ proportional"),
            Err(SettingsError::Parse(_))
        ));
    }
}

// End of File
