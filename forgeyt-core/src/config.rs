use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::dependency::executable_dir;
use crate::error::ConfigError;

static DEFAULT_PROJECT_DIRS: Lazy<Option<ProjectDirs>> = Lazy::new(|| {
    #[cfg(target_os = "macos")]
    {
        // macOS: net.squawksquad.forgeyt
        ProjectDirs::from("net", "squawksquad", "forgeyt")
    }
    #[cfg(target_os = "windows")]
    {
        // Windows: SquawkSquad\ForgeYT
        ProjectDirs::from("", "SquawkSquad", "ForgeYT")
    }
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        // Linux: forgeyt
        ProjectDirs::from("", "", "forgeyt")
    }
});

static DEFAULT_VERSION_URL: Lazy<Url> = Lazy::new(|| {
    Url::parse("https://squawksquad.net/forgedytversion.txt").expect("valid url")
});

static DEFAULT_UPDATE_URL: Lazy<Url> =
    Lazy::new(|| Url::parse("https://squawksquad.net/forgeyt.zip").expect("valid url"));

pub const CONFIG_RELATIVE_PATH: &str = "forgeyt.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralSettings,
    #[serde(default)]
    pub updates: UpdateSettings,
    #[serde(default)]
    pub issues: IssueSettings,
    #[serde(default)]
    pub media: MediaSettings,
    #[serde(default)]
    pub advanced: AdvancedSettings,
    #[serde(default)]
    pub logging: LogSettings,
}

impl Config {
    pub fn load_or_default(path: Option<&Path>) -> Result<(Self, PathBuf), ConfigError> {
        let resolved_path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(default_config_path);

        if resolved_path.exists() {
            let content = fs::read_to_string(&resolved_path).map_err(|source| ConfigError::Io {
                path: resolved_path.clone(),
                source,
            })?;
            let config =
                toml::from_str::<Config>(&content).map_err(|source| ConfigError::Parse {
                    path: resolved_path.clone(),
                    source,
                })?;
            Ok((config, resolved_path))
        } else {
            let config = Config::default();
            config.save(&resolved_path)?;
            Ok((config, resolved_path))
        }
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let serialized =
            toml::to_string_pretty(self).map_err(|source| ConfigError::Serialize { source })?;
        fs::write(path, serialized).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Directory handed to the downloader's output template.
    pub fn download_dir(&self) -> PathBuf {
        self.general
            .download_dir
            .clone()
            .unwrap_or_else(default_download_dir)
    }
}

fn default_config_path() -> PathBuf {
    if let Some(project_dirs) = DEFAULT_PROJECT_DIRS.as_ref() {
        project_dirs.config_dir().join(CONFIG_RELATIVE_PATH)
    } else {
        PathBuf::from(CONFIG_RELATIVE_PATH)
    }
}

/// `Downloads` one level above the directory holding the executable.
fn default_download_dir() -> PathBuf {
    if let Some(exe_dir) = executable_dir() {
        let base = exe_dir.parent().unwrap_or(&exe_dir);
        return base.join("Downloads");
    }

    if let Some(downloads) = dirs::download_dir() {
        return downloads;
    }

    PathBuf::from("Downloads")
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralSettings {
    /// Overrides the default `../Downloads` location.
    pub download_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateSettings {
    pub check_on_startup: bool,
    pub version_url: Url,
    pub download_url: Url,
}

impl Default for UpdateSettings {
    fn default() -> Self {
        Self {
            check_on_startup: true,
            version_url: DEFAULT_VERSION_URL.clone(),
            download_url: DEFAULT_UPDATE_URL.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueSettings {
    pub webhook_url: Option<Url>,
    pub username: String,
}

impl Default for IssueSettings {
    fn default() -> Self {
        Self {
            webhook_url: None,
            username: "FORGEYT".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdvancedSettings {
    /// Explicit downloader location; bundled or `PATH` lookup when unset.
    pub yt_dlp_path: Option<PathBuf>,
    pub cookie_file: Option<PathBuf>,
    pub rate_limit: Option<String>,
    pub ffmpeg_location: Option<PathBuf>,
    /// Used as the tool directory when `ffmpeg_location` is unset.
    pub ffprobe_location: Option<PathBuf>,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

/// Post-processing switches. Everything is off unless configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MediaSettings {
    pub embed_metadata: bool,
    pub embed_chapters: bool,
    pub embed_thumbnail: bool,
    pub write_info_json: bool,
    pub keep_original: bool,
    pub subtitles: SubtitleSettings,
    pub sponsorblock: SponsorBlockMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleSettings {
    pub download: bool,
    /// Comma-separated language codes, or `all`.
    pub languages: String,
    pub embed: bool,
    pub auto_generated: bool,
}

impl Default for SubtitleSettings {
    fn default() -> Self {
        Self {
            download: false,
            languages: "en".to_string(),
            embed: false,
            auto_generated: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SponsorBlockMode {
    #[default]
    None,
    Skip,
    Mark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        write!(f, "{}", label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    pub enabled: bool,
    pub level: LogLevel,
    /// Overrides the per-user data directory.
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            level: LogLevel::Info,
            directory: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_roundtrip() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let restored: Config = toml::from_str(&toml).unwrap();
        assert!(restored.updates.check_on_startup);
        assert_eq!(restored.issues.username, "FORGEYT");
        assert!(restored.advanced.extra_args.is_empty());
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [issues]
            webhook_url = "https://hooks.example.com/report"
            username = "tester"
            "#,
        )
        .unwrap();
        assert_eq!(
            config.issues.webhook_url.as_ref().map(Url::as_str),
            Some("https://hooks.example.com/report")
        );
        assert_eq!(
            config.updates.version_url.as_str(),
            "https://squawksquad.net/forgedytversion.txt"
        );
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.media, MediaSettings::default());
    }

    #[test]
    fn media_section_parses_partial_tables() {
        let config: Config = toml::from_str(
            r#"
            [media]
            embed_chapters = true
            sponsorblock = "mark"

            [media.subtitles]
            download = true
            "#,
        )
        .unwrap();
        assert!(config.media.embed_chapters);
        assert!(!config.media.embed_metadata);
        assert_eq!(config.media.sponsorblock, SponsorBlockMode::Mark);
        assert!(config.media.subtitles.download);
        assert_eq!(config.media.subtitles.languages, "en");
    }

    #[test]
    fn load_creates_default_file_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_RELATIVE_PATH);

        let (config, resolved) = Config::load_or_default(Some(&path)).unwrap();

        assert_eq!(resolved, path);
        assert!(path.exists());
        assert!(config.issues.webhook_url.is_none());
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_RELATIVE_PATH);
        fs::write(&path, "[updates]\ncheck_on_startup = \"sometimes\"\n").unwrap();

        let error = Config::load_or_default(Some(&path)).unwrap_err();
        assert!(matches!(error, ConfigError::Parse { .. }));
    }

    #[test]
    fn configured_download_dir_wins() {
        let mut config = Config::default();
        config.general.download_dir = Some(PathBuf::from("/srv/media"));
        assert_eq!(config.download_dir(), PathBuf::from("/srv/media"));
    }

    #[test]
    fn default_download_dir_is_named_downloads() {
        let config = Config::default();
        assert_eq!(
            config.download_dir().file_name().and_then(|n| n.to_str()),
            Some("Downloads")
        );
    }
}
