pub mod command;
pub mod config;
pub mod dependency;
pub mod error;
pub mod format;
pub mod issue;
pub mod logging;
pub mod session;
pub mod supervisor;
pub mod version;

pub use command::{CommandBuilder, DownloadRequest};
pub use config::{
    AdvancedSettings, Config, GeneralSettings, IssueSettings, LogLevel, LogSettings,
    MediaSettings, SponsorBlockMode, SubtitleSettings, UpdateSettings,
};
pub use dependency::locate_downloader;
pub use error::{
    ConfigError, DependencyError, ForgeError, IssueError, SessionError, SupervisorError,
    VersionError,
};
pub use format::{FormatDescriptor, FormatRegistry};
pub use issue::{IssueReport, IssueSubmitter, WebhookReporter};
pub use logging::LogManager;
pub use session::{Session, SessionOutcome, SessionState, Terminal};
pub use supervisor::{Completion, DownloadEvent, Launcher, ProcessSupervisor, ATTRIBUTION};
pub use version::{VersionChecker, VersionStatus, CURRENT_VERSION};

pub type Result<T> = std::result::Result<T, ForgeError>;
