//! Timeline compiler: turns a parsed script plus resolved asset handles into
//! an ordered, fully-resolved [`TimelinePlan`].
//!
//! Compilation is synchronous and deterministic. Clips within a track are
//! placed back-to-back by a monotonic cursor; a clip with no explicit offset
//! continues where the previous clip of the same input ended, so consecutive
//! excerpts from one source read on without a seek in the script.

use std::collections::BTreeMap;

use crate::{
    asset::AssetHandle,
    error::{ReelplanError, ReelplanResult},
    profile::Profile,
    script::{Directive, Script},
    time::Millis,
};

pub const DEFAULT_CLIP_DURATION: Millis = Millis(2_000);

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimelinePlan {
    pub profile: Profile,
    pub tracks: Vec<Track>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Track {
    pub name: Option<String>,
    pub placements: Vec<ClipPlacement>,
}

/// One positioned, timed excerpt of an asset.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClipPlacement {
    /// Symbolic input name from the script.
    pub input: String,
    /// Source URI of the resolved asset.
    pub asset: String,
    /// Position on the track.
    pub start: Millis,
    /// Offset into the source asset.
    pub offset: Millis,
    pub duration: Millis,
    /// `(width, height)` when a `scale` modifier resized the element.
    pub size: Option<(u32, u32)>,
    /// Explicit `(x, y)` computed from a `position` preset.
    pub position: Option<(i64, i64)>,
    pub effects: Vec<EffectDescriptor>,
}

/// Caller-opaque effect forwarded to the engine unchanged.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EffectDescriptor {
    pub kind: String,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub params: serde_json::Value,
}

/// Per-track placement state: the monotonic cursor plus each input's
/// continuation offset, advanced explicitly for every emitted placement.
#[derive(Debug, Default)]
struct TrackCursor {
    pos: Millis,
    next_offsets: BTreeMap<String, Millis>,
}

impl TrackCursor {
    fn default_offset(&self, input: &str) -> Millis {
        self.next_offsets.get(input).copied().unwrap_or(Millis::ZERO)
    }

    fn advance(&mut self, input: &str, offset: Millis, duration: Millis) -> Millis {
        let start = self.pos;
        self.next_offsets.insert(input.to_string(), offset + duration);
        self.pos += duration;
        start
    }
}

/// Compiles the whole plan, or fails without exposing a partial one.
#[tracing::instrument(skip_all)]
pub fn compile(
    profile: &Profile,
    assets: &BTreeMap<String, AssetHandle>,
    script: &Script,
) -> ReelplanResult<TimelinePlan> {
    let mut tracks = Vec::new();
    for track_d in script.all("track") {
        tracks.push(compile_track(profile, assets, track_d)?);
    }
    Ok(TimelinePlan {
        profile: profile.clone(),
        tracks,
    })
}

fn compile_track(
    profile: &Profile,
    assets: &BTreeMap<String, AssetHandle>,
    track_d: &Directive,
) -> ReelplanResult<Track> {
    let mut cursor = TrackCursor::default();
    let mut placements = Vec::new();

    for clip_d in track_d.all("clip") {
        let Some(input) = clip_d.prop("input") else {
            tracing::warn!("clip without input property skipped");
            continue;
        };
        let handle = assets
            .get(input)
            .ok_or_else(|| ReelplanError::config(format!("unknown input: '{input}'")))?;

        let offset = match clip_d.prop("offset") {
            Some(raw) => raw.parse::<Millis>()?,
            None => cursor.default_offset(input),
        };
        let duration = match clip_d.prop("duration") {
            Some(raw) => raw.parse::<Millis>()?,
            None => DEFAULT_CLIP_DURATION,
        };
        let start = cursor.advance(input, offset, duration);

        tracing::info!(input, %start, %offset, %duration, "placing clip");
        placements.push(place_clip(profile, clip_d, input, handle, start, offset, duration)?);
    }

    Ok(Track {
        name: track_d.param(0).map(str::to_string),
        placements,
    })
}

fn place_clip(
    profile: &Profile,
    clip_d: &Directive,
    input: &str,
    handle: &AssetHandle,
    start: Millis,
    offset: Millis,
    duration: Millis,
) -> ReelplanResult<ClipPlacement> {
    let mut effects = Vec::new();
    if let Some(raw) = clip_d.prop("opacity") {
        let level = raw
            .parse::<f64>()
            .map_err(|_| ReelplanError::config(format!("invalid opacity: '{raw}'")))?;
        effects.push(EffectDescriptor {
            kind: "alpha".to_string(),
            params: serde_json::json!({ "level": level }),
        });
    }

    let size = match clip_d.prop("scale") {
        None => None,
        Some(raw) => {
            let factor = raw
                .parse::<f64>()
                .map_err(|_| ReelplanError::config(format!("invalid scale: '{raw}'")))?;
            Some((
                (f64::from(handle.video.width) * factor).round() as u32,
                (f64::from(handle.video.height) * factor).round() as u32,
            ))
        }
    };

    let position = match clip_d.prop("position") {
        None => None,
        Some(preset) => {
            // Position math uses the effective size: scaled when present,
            // native otherwise.
            let (w, h) = size.unwrap_or((handle.video.width, handle.video.height));
            Some(anchor(preset, (w, h), (profile.width, profile.height))?)
        }
    };

    Ok(ClipPlacement {
        input: input.to_string(),
        asset: handle.uri.clone(),
        start,
        offset,
        duration,
        size,
        position,
        effects,
    })
}

/// `(x, y)` for a named screen-corner preset, given clip size `(w, h)` and
/// profile size `(fw, fh)`. Negative coordinates are valid: the clip may be
/// larger than the frame.
fn anchor(preset: &str, (w, h): (u32, u32), (fw, fh): (u32, u32)) -> ReelplanResult<(i64, i64)> {
    let (w, h) = (i64::from(w), i64::from(h));
    let (fw, fh) = (i64::from(fw), i64::from(fh));
    match preset {
        "bottom-right" => Ok((fw - w, fh - h)),
        "bottom-left" => Ok((0, fh - h)),
        "top-right" => Ok((fw - w, 0)),
        "top-left" => Ok((0, 0)),
        other => Err(ReelplanError::config(format!(
            "unknown position preset: '{other}'"
        ))),
    }
}
