use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {source}")]
    Serialize {
        #[source]
        source: toml::ser::Error,
    },
}

#[derive(Debug, Error)]
pub enum DependencyError {
    #[error("could not locate {binary}")]
    NotFound { binary: String },
    #[error("configured {binary} path {path:?} does not exist")]
    MissingPath { binary: String, path: PathBuf },
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("the downloader has already been started for this process")]
    AlreadySpawned,
    #[error("failed to spawn {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("downloader {0} stream was not captured")]
    MissingPipe(&'static str),
    #[error("io error while supervising downloader: {source}")]
    Io {
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum IssueError {
    #[error("no issue webhook is configured")]
    NotConfigured,
    #[error("failed to post issue report: {source}")]
    Request {
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Error)]
pub enum VersionError {
    #[error("version request failed: {source}")]
    Request {
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read from the terminal: {source}")]
    Input {
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write to the terminal: {source}")]
    Output {
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ForgeError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Dependency(#[from] DependencyError),
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
    #[error(transparent)]
    Issue(#[from] IssueError),
    #[error(transparent)]
    Version(#[from] VersionError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

pub type Result<T> = std::result::Result<T, ForgeError>;
