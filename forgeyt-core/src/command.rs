use std::path::PathBuf;

use crate::config::{AdvancedSettings, Config, MediaSettings, SponsorBlockMode};
use crate::format::FormatDescriptor;

/// Source stream used for audio extraction.
const AUDIO_SOURCE_FORMAT: &str = "140";

/// Filename stem filled in by the downloader from the media's metadata.
const OUTPUT_STEM: &str = "%(artist)s - %(title)s";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub format_token: String,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, format_token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            format_token: format_token.into(),
        }
    }
}

/// Turns a request into the downloader's argument vector.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    output_dir: PathBuf,
    cookie_file: Option<PathBuf>,
    rate_limit: Option<String>,
    ffmpeg_location: Option<PathBuf>,
    extra_args: Vec<String>,
    media: MediaSettings,
}

impl CommandBuilder {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            cookie_file: None,
            rate_limit: None,
            ffmpeg_location: None,
            extra_args: Vec::new(),
            media: MediaSettings::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.download_dir())
            .with_advanced(&config.advanced)
            .with_media(&config.media)
    }

    pub fn with_advanced(mut self, advanced: &AdvancedSettings) -> Self {
        self.cookie_file = advanced.cookie_file.clone();
        self.rate_limit = advanced
            .rate_limit
            .clone()
            .filter(|rate| !rate.trim().is_empty());
        // The downloader finds ffprobe inside the ffmpeg location.
        self.ffmpeg_location = advanced.ffmpeg_location.clone().or_else(|| {
            advanced
                .ffprobe_location
                .as_deref()
                .and_then(|probe| probe.parent())
                .map(|dir| dir.to_path_buf())
        });
        self.extra_args = advanced.extra_args.clone();
        self
    }

    pub fn with_media(mut self, media: &MediaSettings) -> Self {
        self.media = media.clone();
        self
    }

    pub fn output_template(&self, descriptor: &FormatDescriptor) -> String {
        self.output_dir
            .join(format!("{OUTPUT_STEM}.{}", descriptor.extension))
            .to_string_lossy()
            .into_owned()
    }

    pub fn build(&self, request: &DownloadRequest, descriptor: &FormatDescriptor) -> Vec<String> {
        let mut args = Vec::new();

        if descriptor.is_audio_only {
            args.push("-x".to_string());
            args.push("-f".to_string());
            args.push(AUDIO_SOURCE_FORMAT.to_string());
            args.push("--audio-format".to_string());
            args.push(descriptor.codec.to_string());
        } else {
            args.push(format!("--format-sort=ext:{}", descriptor.extension));
        }

        args.push("--ignore-config".to_string());
        args.push("-o".to_string());
        args.push(self.output_template(descriptor));
        self.push_media_args(&mut args, descriptor);

        if let Some(cookie) = &self.cookie_file {
            args.push("--cookies".to_string());
            args.push(cookie.to_string_lossy().into_owned());
        }

        if let Some(rate) = &self.rate_limit {
            args.push("--limit-rate".to_string());
            args.push(rate.clone());
        }

        if let Some(ffmpeg) = &self.ffmpeg_location {
            args.push("--ffmpeg-location".to_string());
            args.push(ffmpeg.to_string_lossy().into_owned());
        }

        args.extend(self.extra_args.iter().cloned());
        args.push(request.url.clone());
        args
    }

    fn push_media_args(&self, args: &mut Vec<String>, descriptor: &FormatDescriptor) {
        let media = &self.media;
        let flags = [
            (media.keep_original, "-k"),
            (media.embed_metadata, "--embed-metadata"),
            (media.embed_chapters, "--embed-chapters"),
            (media.embed_thumbnail, "--embed-thumbnail"),
            (media.write_info_json, "--write-info-json"),
        ];
        args.extend(
            flags
                .iter()
                .filter(|(enabled, _)| *enabled)
                .map(|(_, flag)| flag.to_string()),
        );

        // Subtitles only apply to video containers.
        let subtitles = &media.subtitles;
        if subtitles.download && !descriptor.is_audio_only {
            args.push("--write-subs".to_string());
            if subtitles.auto_generated {
                args.push("--write-auto-subs".to_string());
            }
            let languages = subtitles.languages.trim();
            if !languages.is_empty() {
                args.push("--sub-langs".to_string());
                args.push(languages.to_string());
            }
            if subtitles.embed {
                args.push("--embed-subs".to_string());
            }
        }

        match media.sponsorblock {
            SponsorBlockMode::None => {}
            SponsorBlockMode::Skip => {
                args.push("--sponsorblock-remove".to_string());
                args.push("default".to_string());
            }
            SponsorBlockMode::Mark => {
                args.push("--sponsorblock-mark".to_string());
                args.push("default".to_string());
            }
        }
    }
}
