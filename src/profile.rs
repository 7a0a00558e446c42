use crate::{
    error::{ReelplanError, ReelplanResult},
    script::Directive,
};

pub const DEFAULT_CONTAINER: &str = "application/ogg";
pub const DEFAULT_VIDEO: &str = "video/x-theora";
pub const DEFAULT_AUDIO: &str = "audio/x-vorbis";
pub const DEFAULT_WIDTH: u32 = 1280;
pub const DEFAULT_HEIGHT: u32 = 720;

/// Target output frame dimensions and format descriptors.
///
/// The format strings are opaque caps descriptors passed through to the
/// encoder unchanged; only `width`/`height` feed the compiler's position and
/// scale math. Immutable once constructed.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Profile {
    pub width: u32,
    pub height: u32,
    pub container: String,
    pub video: String,
    pub audio: String,
}

impl Profile {
    pub fn new(width: u32, height: u32) -> ReelplanResult<Self> {
        if width == 0 || height == 0 {
            return Err(ReelplanError::config("profile width/height must be > 0"));
        }
        Ok(Self {
            width,
            height,
            container: DEFAULT_CONTAINER.to_string(),
            video: DEFAULT_VIDEO.to_string(),
            audio: DEFAULT_AUDIO.to_string(),
        })
    }

    /// Builds a profile from the optional `output` directive. A missing
    /// directive (or missing properties) falls back to the defaults above.
    pub fn from_output(output: Option<&Directive>) -> ReelplanResult<Self> {
        let prop = |name: &str| output.and_then(|d| d.prop(name));

        let dim = |name: &str, default: u32| -> ReelplanResult<u32> {
            match prop(name) {
                None => Ok(default),
                Some(raw) => raw
                    .parse::<u32>()
                    .map_err(|_| ReelplanError::config(format!("invalid output {name}: '{raw}'"))),
            }
        };

        let mut profile = Self::new(dim("width", DEFAULT_WIDTH)?, dim("height", DEFAULT_HEIGHT)?)?;
        if let Some(container) = prop("container") {
            profile.container = container.to_string();
        }
        if let Some(video) = prop("video") {
            profile.video = video.to_string();
        }
        if let Some(audio) = prop("audio") {
            profile.audio = audio.to_string();
        }
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_output_directive_yields_defaults() {
        let p = Profile::from_output(None).unwrap();
        assert_eq!((p.width, p.height), (1280, 720));
        assert_eq!(p.container, "application/ogg");
        assert_eq!(p.video, "video/x-theora");
        assert_eq!(p.audio, "audio/x-vorbis");
    }

    #[test]
    fn output_props_override_defaults() {
        let output = Directive::new("output")
            .prop_value("container", "video/webm")
            .prop_value("video", "video/x-vp9")
            .prop_value("width", "1920")
            .prop_value("height", "1080");
        let p = Profile::from_output(Some(&output)).unwrap();
        assert_eq!((p.width, p.height), (1920, 1080));
        assert_eq!(p.container, "video/webm");
        assert_eq!(p.video, "video/x-vp9");
        assert_eq!(p.audio, "audio/x-vorbis");
    }

    #[test]
    fn rejects_unparseable_dimensions() {
        let output = Directive::new("output").prop_value("width", "wide");
        assert!(matches!(
            Profile::from_output(Some(&output)),
            Err(ReelplanError::Config(_))
        ));
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(Profile::new(0, 720).is_err());
    }
}
