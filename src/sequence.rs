use serde::{Deserialize, Serialize};

pub const DEFAULT_FRAME_COUNT: u32 = 240;
pub const DEFAULT_FRAME_FOLDER: &str = "images";
pub const DEFAULT_FRAME_BASE_NAME: &str = "ezgif-frame-";
pub const DEFAULT_FRAME_EXTENSION: &str = ".jpg";
pub const DEFAULT_SPEED: u8 = 5;

pub const FRAME_COUNT_BOUNDS: (u32, u32) = (1, 9_999);
pub const SPEED_BOUNDS: (u8, u8) = (1, 10);
pub const FIXED_INTERVAL_MS_BOUNDS: (u32, u32) = (16, 10_000);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrivingSignal {
    Scroll,
    Timer,
}

impl DrivingSignal {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scroll => "scroll",
            Self::Timer => "timer",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "scroll" => Some(Self::Scroll),
            "timer" => Some(Self::Timer),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderTarget {
    Canvas,
    Background,
}

impl RenderTarget {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Canvas => "canvas",
            Self::Background => "background",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "canvas" => Some(Self::Canvas),
            "background" => Some(Self::Background),
            _ => None,
        }
    }
}

/// Where frame `n` lives: `{folder}/{base_name}{n:03}{extension}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameNaming {
    pub folder: String,
    pub base_name: String,
    pub extension: String,
}

impl Default for FrameNaming {
    fn default() -> Self {
        Self {
            folder: DEFAULT_FRAME_FOLDER.to_string(),
            base_name: DEFAULT_FRAME_BASE_NAME.to_string(),
            extension: DEFAULT_FRAME_EXTENSION.to_string(),
        }
    }
}

impl FrameNaming {
    pub fn file_name(&self, index: u32) -> String {
        format!("{}{index:03}{}", self.base_name, self.extension)
    }

    pub fn path(&self, index: u32) -> String {
        let folder = self.folder.trim_end_matches('/');
        let file_name = self.file_name(index);

        if folder.is_empty() {
            file_name
        } else {
            format!("{folder}/{file_name}")
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SequenceConfig {
    pub driving_signal: DrivingSignal,
    pub render_target: RenderTarget,
    pub placeholder_on_error: bool,
    pub frame_count: u32,
    pub naming: FrameNaming,
    pub speed: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_interval_ms: Option<u32>,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            driving_signal: DrivingSignal::Scroll,
            render_target: RenderTarget::Canvas,
            placeholder_on_error: false,
            frame_count: DEFAULT_FRAME_COUNT,
            naming: FrameNaming::default(),
            speed: DEFAULT_SPEED,
            fixed_interval_ms: None,
        }
    }
}

impl SequenceConfig {
    /// Pulls every numeric field back into range. Values arriving over the wire
    /// are not trusted to respect the bounds.
    pub fn normalized(mut self) -> Self {
        self.frame_count = self
            .frame_count
            .clamp(FRAME_COUNT_BOUNDS.0, FRAME_COUNT_BOUNDS.1);
        self.speed = self.speed.clamp(SPEED_BOUNDS.0, SPEED_BOUNDS.1);
        self.fixed_interval_ms = self
            .fixed_interval_ms
            .map(|value| value.clamp(FIXED_INTERVAL_MS_BOUNDS.0, FIXED_INTERVAL_MS_BOUNDS.1));
        self
    }

    pub fn frame_path(&self, index: u32) -> String {
        self.naming.path(index.clamp(1, self.frame_count.max(1)))
    }

    pub fn frame_paths(&self) -> impl Iterator<Item = (u32, String)> + '_ {
        (1..=self.frame_count).map(move |index| (index, self.naming.path(index)))
    }
}

/// Body of `GET /api/sequence`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceResponse {
    pub ok: bool,
    pub config: SequenceConfig,
    #[serde(default)]
    pub missing_frames: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_naming_matches_asset_convention() {
        let naming = FrameNaming::default();

        assert_eq!(naming.path(1), "images/ezgif-frame-001.jpg");
        assert_eq!(naming.path(7), "images/ezgif-frame-007.jpg");
        assert_eq!(naming.path(240), "images/ezgif-frame-240.jpg");
    }

    #[test]
    fn padding_grows_past_three_digits() {
        let naming = FrameNaming::default();

        assert_eq!(naming.file_name(1234), "ezgif-frame-1234.jpg");
    }

    #[test]
    fn empty_folder_and_trailing_slash_are_handled() {
        let mut naming = FrameNaming {
            folder: String::new(),
            base_name: "hero_".to_string(),
            extension: ".webp".to_string(),
        };
        assert_eq!(naming.path(12), "hero_012.webp");

        naming.folder = "assets/frames/".to_string();
        assert_eq!(naming.path(12), "assets/frames/hero_012.webp");
    }

    #[test]
    fn frame_path_clamps_out_of_range_indices() {
        let config = SequenceConfig::default();

        assert_eq!(config.frame_path(0), "images/ezgif-frame-001.jpg");
        assert_eq!(config.frame_path(999), "images/ezgif-frame-240.jpg");
    }

    #[test]
    fn frame_paths_cover_the_whole_sequence_in_order() {
        let config = SequenceConfig {
            frame_count: 3,
            ..SequenceConfig::default()
        };

        let paths: Vec<_> = config.frame_paths().collect();
        assert_eq!(
            paths,
            vec![
                (1, "images/ezgif-frame-001.jpg".to_string()),
                (2, "images/ezgif-frame-002.jpg".to_string()),
                (3, "images/ezgif-frame-003.jpg".to_string()),
            ]
        );
    }

    #[test]
    fn config_uses_camel_case_keys_and_fills_missing_fields() {
        let raw = r#"{
            "drivingSignal": "timer",
            "renderTarget": "background",
            "placeholderOnError": true,
            "frameCount": 60
        }"#;
        let config: SequenceConfig = serde_json::from_str(raw)
        .expect("config should deserialize");

        assert_eq!(config.driving_signal, DrivingSignal::Timer);
        assert_eq!(config.render_target, RenderTarget::Background);
        assert!(config.placeholder_on_error);
        assert_eq!(config.frame_count, 60);
        assert_eq!(config.naming, FrameNaming::default());
        assert_eq!(config.speed, DEFAULT_SPEED);

        let json = serde_json::to_value(&config).expect("config should serialize");
        assert_eq!(json["naming"]["baseName"], "ezgif-frame-");
        assert!(json.get("fixedIntervalMs").is_none());
    }

    #[test]
    fn normalized_clamps_untrusted_values() {
        let config = SequenceConfig {
            frame_count: 0,
            speed: 42,
            fixed_interval_ms: Some(1),
            ..SequenceConfig::default()
        }
        .normalized();

        assert_eq!(config.frame_count, 1);
        assert_eq!(config.speed, 10);
        assert_eq!(config.fixed_interval_ms, Some(16));
    }

    #[test]
    fn sequence_response_tolerates_missing_frame_list() {
        let response: SequenceResponse =
            serde_json::from_str(r#"{"ok":true,"config":{"frameCount":12}}"#)
                .expect("response should deserialize");

        assert!(response.ok);
        assert_eq!(response.config.frame_count, 12);
        assert!(response.missing_frames.is_empty());
        assert_eq!(response.error, None);
    }

    #[test]
    fn enum_names_round_trip_through_strings() {
        for signal in [DrivingSignal::Scroll, DrivingSignal::Timer] {
            assert_eq!(DrivingSignal::from_str(signal.as_str()), Some(signal));
        }
        for target in [RenderTarget::Canvas, RenderTarget::Background] {
            assert_eq!(RenderTarget::from_str(target.as_str()), Some(target));
        }
        assert_eq!(DrivingSignal::from_str("visibility"), None);
    }
}
