/// Simple localization support for the download form.
/// Locale can be selected via the `--locale` CLI flag (e.g. `--locale zh`).

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Zh,
}

impl Locale {
    pub fn from_str(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "zh" | "zh-cn" | "zh_cn" | "zh-hans" | "zh-tw" | "zh_tw" => Self::Zh,
            _ => Self::En,
        }
    }
}

pub struct Messages {
    pub title: &'static str,
    pub url_label: &'static str,
    pub url_placeholder: &'static str,
    pub audio_only_label: &'static str,
    pub resolution_label: &'static str,
    pub format_label: &'static str,
    pub audio_format_label: &'static str,
    pub submit_idle: &'static str,
    pub submit_busy: &'static str,
    pub status_starting: &'static str,
    pub status_completed: &'static str,
    pub error_prefix: &'static str,
    pub default_failure: &'static str,
    pub service_label: &'static str,
}

pub static EN: Messages = Messages {
    title: "YouTube Video Downloader",
    url_label: "YouTube URL:",
    url_placeholder: "https://www.youtube.com/watch?v=...",
    audio_only_label: "Audio Only",
    resolution_label: "Resolution:",
    format_label: "Video Format:",
    audio_format_label: "Audio Format:",
    submit_idle: "Download",
    submit_busy: "Downloading...",
    status_starting: "Starting download...",
    status_completed: "Download completed successfully!",
    error_prefix: "Error",
    default_failure: "Download failed",
    service_label: "Service",
};

pub static ZH: Messages = Messages {
    title: "YouTube 视频下载器",
    url_label: "YouTube 链接:",
    url_placeholder: "https://www.youtube.com/watch?v=...",
    audio_only_label: "仅音频",
    resolution_label: "分辨率:",
    format_label: "视频格式:",
    audio_format_label: "音频格式:",
    submit_idle: "下载",
    submit_busy: "下载中...",
    status_starting: "正在开始下载...",
    status_completed: "下载成功完成!",
    error_prefix: "错误",
    default_failure: "下载失败",
    service_label: "服务",
};

pub fn get_messages(locale: Locale) -> &'static Messages {
    match locale {
        Locale::En => &EN,
        Locale::Zh => &ZH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_aliases() {
        assert_eq!(Locale::from_str("zh-CN"), Locale::Zh);
        assert_eq!(Locale::from_str("ZH_TW"), Locale::Zh);
        assert_eq!(Locale::from_str("en"), Locale::En);
        assert_eq!(Locale::from_str("fr"), Locale::En);
    }

    #[test]
    fn english_is_default() {
        assert!(std::ptr::eq(get_messages(Locale::default()), &EN));
    }
}
