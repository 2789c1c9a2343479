use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind}: {value} (expected one of: {expected})")]
pub struct ParseOptionError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Selector option shared by the three enum-valued form fields.
pub trait FormOption: Copy + Eq + 'static {
    const KIND: &'static str;
    const ALL: &'static [Self];

    /// Value as it travels on the wire.
    fn as_str(self) -> &'static str;

    /// Label shown next to the option in the form.
    fn label(self) -> &'static str;

    fn parse(s: &str) -> Result<Self, ParseOptionError> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|o| o.as_str() == needle)
            .ok_or_else(|| ParseOptionError {
                kind: Self::KIND,
                value: s.to_string(),
                expected: Self::ALL.iter().map(|o| o.as_str()).collect::<Vec<_>>().join(", "),
            })
    }
}

macro_rules! form_option {
    ($ty:ident, $kind:literal, [$($variant:ident => $wire:literal, $label:literal),+ $(,)?]) => {
        impl FormOption for $ty {
            const KIND: &'static str = $kind;
            const ALL: &'static [Self] = &[$($ty::$variant),+];

            fn as_str(self) -> &'static str {
                match self { $($ty::$variant => $wire),+ }
            }

            fn label(self) -> &'static str {
                match self { $($ty::$variant => $label),+ }
            }
        }

        impl FromStr for $ty {
            type Err = ParseOptionError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as FormOption>::parse(s)
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "480p")]
    P480,
    #[default]
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "best")]
    Best,
}

form_option!(Resolution, "resolution", [
    P360 => "360p", "360p",
    P480 => "480p", "480p",
    P720 => "720p", "720p",
    P1080 => "1080p", "1080p",
    Best => "best", "Best Available",
]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoFormat {
    #[default]
    Mp4,
    Webm,
}

form_option!(VideoFormat, "video format", [
    Mp4 => "mp4", "MP4",
    Webm => "webm", "WebM",
]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    M4a,
}

form_option!(AudioFormat, "audio format", [
    Mp3 => "mp3", "MP3",
    M4a => "m4a", "M4A",
]);

/// Body of `POST /api/download`. All five fields are always sent, the
/// service ignores whichever side of `audio_only` does not apply.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    pub url: String,
    pub resolution: Resolution,
    pub format: VideoFormat,
    pub audio_only: bool,
    pub audio_format: AudioFormat,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct DownloadReply {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendReply {
    pub http_status: u16,
    pub body: DownloadReply,
}

impl BackendReply {
    pub fn transport_ok(&self) -> bool {
        (200..300).contains(&self.http_status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_initial_form() {
        let req = DownloadRequest::default();
        assert_eq!(req.url, "");
        assert_eq!(req.resolution, Resolution::P720);
        assert_eq!(req.format, VideoFormat::Mp4);
        assert!(!req.audio_only);
        assert_eq!(req.audio_format, AudioFormat::Mp3);
    }

    #[test]
    fn request_serializes_every_field() {
        let req = DownloadRequest {
            url: "https://www.youtube.com/watch?v=abc".to_string(),
            resolution: Resolution::Best,
            format: VideoFormat::Webm,
            audio_only: true,
            audio_format: AudioFormat::M4a,
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(
            v,
            json!({
                "url": "https://www.youtube.com/watch?v=abc",
                "resolution": "best",
                "format": "webm",
                "audioOnly": true,
                "audioFormat": "m4a",
            })
        );
    }

    #[test]
    fn wire_names_agree_with_as_str() {
        for r in Resolution::ALL {
            assert_eq!(serde_json::to_value(r).unwrap(), json!(r.as_str()));
        }
        for f in VideoFormat::ALL {
            assert_eq!(serde_json::to_value(f).unwrap(), json!(f.as_str()));
        }
        for a in AudioFormat::ALL {
            assert_eq!(serde_json::to_value(a).unwrap(), json!(a.as_str()));
        }
    }

    #[test]
    fn parses_options_case_insensitively() {
        assert_eq!("1080P".parse::<Resolution>().unwrap(), Resolution::P1080);
        assert_eq!(" WebM ".parse::<VideoFormat>().unwrap(), VideoFormat::Webm);
        assert_eq!("m4a".parse::<AudioFormat>().unwrap(), AudioFormat::M4a);

        let err = "flac".parse::<AudioFormat>().unwrap_err();
        assert_eq!(err.kind, "audio format");
        assert_eq!(err.expected, "mp3, m4a");
    }

    #[test]
    fn labels_follow_selectors() {
        assert_eq!(Resolution::Best.label(), "Best Available");
        assert_eq!(VideoFormat::Webm.label(), "WebM");
        assert_eq!(AudioFormat::Mp3.label(), "MP3");
    }

    #[test]
    fn reply_tolerates_missing_fields() {
        let r: DownloadReply = serde_json::from_str("{}").unwrap();
        assert!(!r.success);
        assert!(r.error.is_none());

        let r: DownloadReply =
            serde_json::from_str(r#"{"success":true,"message":"ok","output":"log"}"#).unwrap();
        assert!(r.success);
        assert_eq!(r.output.as_deref(), Some("log"));
    }

    #[test]
    fn transport_ok_is_2xx() {
        let reply = |s| BackendReply { http_status: s, body: DownloadReply::default() };
        assert!(reply(200).transport_ok());
        assert!(reply(204).transport_ok());
        assert!(!reply(400).transport_ok());
        assert!(!reply(500).transport_ok());
    }
}
