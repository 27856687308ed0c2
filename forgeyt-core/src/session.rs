//! Interactive prompt loop.
//!
//! One pass of the loop asks for a URL, then either files an issue report and
//! starts over, or asks for a format and hands the download to a [`Launcher`].
//! Validation failures always return to the URL prompt. The loop itself never
//! ends on its own: it stops when a download has been dispatched or when the
//! terminal has no more input.

use std::io;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::command::{CommandBuilder, DownloadRequest};
use crate::error::SessionError;
use crate::format::FormatRegistry;
use crate::issue::{IssueReport, IssueSubmitter};
use crate::supervisor::{Completion, DownloadEvent, Launcher};

pub const URL_PROMPT: &str = "Enter Youtube Link: ";
pub const ISSUE_PROMPT: &str = "What is the issue? ";
pub const FORMAT_PROMPT: &str = "What File Type? (Leave Blank For MP3): ";
pub const ISSUE_KEYWORD: &str = "issue";
pub const URL_REQUIRED: &str = "Youtube URL is Required.";

const EVENT_BUFFER: usize = 128;

/// Line-oriented user interface the session talks through.
#[async_trait]
pub trait Terminal: Send {
    /// Shows `question` and waits for one line. `None` once input is exhausted.
    async fn prompt(&mut self, question: &str) -> io::Result<Option<String>>;

    fn print(&mut self, line: &str) -> io::Result<()>;

    /// Diagnostics and validation errors.
    fn warn(&mut self, line: &str) -> io::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    AwaitingUrl,
    AwaitingIssue,
    AwaitingFormat { url: String },
    Dispatch(DownloadRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The downloader ran; the host should now exit.
    Dispatched(Completion),
    /// Input ended at a prompt; nothing was downloaded.
    InputClosed,
}

pub struct Session<'a, T, R, L> {
    terminal: T,
    registry: &'a FormatRegistry,
    builder: CommandBuilder,
    reporter: R,
    launcher: L,
}

impl<'a, T, R, L> Session<'a, T, R, L>
where
    T: Terminal,
    R: IssueSubmitter,
    L: Launcher,
{
    pub fn new(
        terminal: T,
        registry: &'a FormatRegistry,
        builder: CommandBuilder,
        reporter: R,
        launcher: L,
    ) -> Self {
        Self {
            terminal,
            registry,
            builder,
            reporter,
            launcher,
        }
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub async fn run(&mut self) -> Result<SessionOutcome, SessionError> {
        let mut state = SessionState::AwaitingUrl;
        loop {
            debug!(?state, "session state");
            state = match state {
                SessionState::AwaitingUrl => match self.ask(URL_PROMPT).await? {
                    Some(input) => self.on_url(input)?,
                    None => return Ok(self.input_closed()),
                },
                SessionState::AwaitingIssue => match self.ask(ISSUE_PROMPT).await? {
                    Some(description) => {
                        self.report_issue(description).await?;
                        SessionState::AwaitingUrl
                    }
                    None => return Ok(self.input_closed()),
                },
                SessionState::AwaitingFormat { url } => match self.ask(FORMAT_PROMPT).await? {
                    Some(token) => self.on_format(url, token)?,
                    None => return Ok(self.input_closed()),
                },
                SessionState::Dispatch(request) => {
                    let completion = self.dispatch(request).await?;
                    return Ok(SessionOutcome::Dispatched(completion));
                }
            };
        }
    }

    fn on_url(&mut self, input: String) -> Result<SessionState, SessionError> {
        if input == ISSUE_KEYWORD {
            return Ok(SessionState::AwaitingIssue);
        }
        if input.is_empty() {
            self.warn(URL_REQUIRED)?;
            return Ok(SessionState::AwaitingUrl);
        }
        Ok(SessionState::AwaitingFormat { url: input })
    }

    fn on_format(&mut self, url: String, token: String) -> Result<SessionState, SessionError> {
        if !self.registry.contains(&token) {
            let supported: Vec<&str> = self.registry.supported_tokens().collect();
            self.warn(&format!(
                "File Type Not Supported. Supported File Types are: {}",
                supported.join(", ")
            ))?;
            return Ok(SessionState::AwaitingUrl);
        }
        Ok(SessionState::Dispatch(DownloadRequest::new(url, token)))
    }

    async fn report_issue(&mut self, description: String) -> Result<(), SessionError> {
        let report = IssueReport::new(description);
        if let Err(error) = self.reporter.submit(&report).await {
            warn!(%error, "issue report was not delivered");
        }
        self.print(&format!(
            "Your Issue report: \"{}\" has been posted!",
            report.description
        ))
    }

    async fn dispatch(&mut self, request: DownloadRequest) -> Result<Completion, SessionError> {
        let descriptor = *self.registry.resolve(&request.format_token);
        let args = self.builder.build(&request, &descriptor);
        info!(url = %request.url, format = %descriptor, "dispatching download");
        self.print(&format!("Youtube URL: {}", request.url))?;

        let (events_tx, mut events_rx) = mpsc::channel(EVENT_BUFFER);
        let terminal = &mut self.terminal;
        let launch = self.launcher.launch(args, events_tx);
        tokio::pin!(launch);

        let result = loop {
            tokio::select! {
                result = &mut launch => break result,
                Some(event) = events_rx.recv() => render_event(terminal, event)?,
            }
        };
        while let Ok(event) = events_rx.try_recv() {
            render_event(terminal, event)?;
        }

        match result {
            Ok(completion) => {
                info!(exit_code = ?completion.exit_code, "download finished");
                Ok(completion)
            }
            Err(failure) => {
                error!(%failure, "downloader could not be run");
                terminal
                    .warn(&format!("Download failed: {failure}"))
                    .map_err(|source| SessionError::Output { source })?;
                Ok(Completion::not_started())
            }
        }
    }

    async fn ask(&mut self, question: &str) -> Result<Option<String>, SessionError> {
        self.terminal
            .prompt(question)
            .await
            .map_err(|source| SessionError::Input { source })
    }

    fn print(&mut self, line: &str) -> Result<(), SessionError> {
        self.terminal
            .print(line)
            .map_err(|source| SessionError::Output { source })
    }

    fn warn(&mut self, line: &str) -> Result<(), SessionError> {
        self.terminal
            .warn(line)
            .map_err(|source| SessionError::Output { source })
    }

    fn input_closed(&self) -> SessionOutcome {
        info!("input closed before a download was dispatched");
        SessionOutcome::InputClosed
    }
}

fn render_event<T: Terminal>(terminal: &mut T, event: DownloadEvent) -> Result<(), SessionError> {
    let written = match event {
        DownloadEvent::Output(line) => terminal.print(&line),
        DownloadEvent::Warning(line) => terminal.warn(&format!("stderr: {line}")),
    };
    written.map_err(|source| SessionError::Output { source })
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use chrono::{DateTime, Utc};
    use parking_lot::Mutex;

    use super::*;
    use crate::error::{IssueError, SupervisorError};
    use crate::supervisor::ATTRIBUTION;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Line {
        Prompt(String),
        Print(String),
        Warn(String),
    }

    struct ScriptedTerminal {
        inputs: VecDeque<String>,
        transcript: Vec<Line>,
    }

    impl ScriptedTerminal {
        fn new(inputs: &[&str]) -> Self {
            Self {
                inputs: inputs.iter().map(|s| s.to_string()).collect(),
                transcript: Vec::new(),
            }
        }

        fn prompts(&self) -> Vec<&str> {
            self.transcript
                .iter()
                .filter_map(|line| match line {
                    Line::Prompt(text) => Some(text.as_str()),
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl Terminal for ScriptedTerminal {
        async fn prompt(&mut self, question: &str) -> io::Result<Option<String>> {
            self.transcript.push(Line::Prompt(question.to_string()));
            Ok(self.inputs.pop_front())
        }

        fn print(&mut self, line: &str) -> io::Result<()> {
            self.transcript.push(Line::Print(line.to_string()));
            Ok(())
        }

        fn warn(&mut self, line: &str) -> io::Result<()> {
            self.transcript.push(Line::Warn(line.to_string()));
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        reports: Mutex<Vec<IssueReport>>,
        fail: bool,
    }

    #[async_trait]
    impl IssueSubmitter for RecordingReporter {
        async fn submit(&self, report: &IssueReport) -> Result<(), IssueError> {
            self.reports.lock().push(report.clone());
            if self.fail {
                Err(IssueError::NotConfigured)
            } else {
                Ok(())
            }
        }
    }

    #[derive(Default)]
    struct FakeLauncher {
        launches: Mutex<Vec<Vec<String>>>,
        exit_code: Option<i32>,
        fail: bool,
    }

    #[async_trait]
    impl Launcher for FakeLauncher {
        async fn launch(
            &self,
            args: Vec<String>,
            events: mpsc::Sender<DownloadEvent>,
        ) -> Result<Completion, SupervisorError> {
            self.launches.lock().push(args);
            if self.fail {
                return Err(SupervisorError::AlreadySpawned);
            }
            events
                .send(DownloadEvent::Output("[download] 100% of 3.00MiB".to_string()))
                .await
                .ok();
            events
                .send(DownloadEvent::Warning("WARNING: no artist tag".to_string()))
                .await
                .ok();
            events
                .send(DownloadEvent::Output(ATTRIBUTION.to_string()))
                .await
                .ok();
            Ok(Completion::exited(self.exit_code))
        }
    }

    struct Harness {
        registry: FormatRegistry,
        reporter: Arc<RecordingReporter>,
        launcher: Arc<FakeLauncher>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                registry: FormatRegistry::new(),
                reporter: Arc::new(RecordingReporter::default()),
                launcher: Arc::new(FakeLauncher {
                    exit_code: Some(0),
                    ..FakeLauncher::default()
                }),
            }
        }

        async fn run(&self, inputs: &[&str]) -> (SessionOutcome, ScriptedTerminal) {
            let mut session = Session::new(
                ScriptedTerminal::new(inputs),
                &self.registry,
                CommandBuilder::new("/media/Downloads"),
                self.reporter.clone(),
                self.launcher.clone(),
            );
            let outcome = session.run().await.unwrap();
            (outcome, session.terminal)
        }
    }

    #[tokio::test]
    async fn empty_url_reprompts_without_asking_format() {
        let harness = Harness::new();
        let (outcome, terminal) = harness.run(&[""]).await;

        assert_eq!(outcome, SessionOutcome::InputClosed);
        assert_eq!(
            terminal.transcript,
            vec![
                Line::Prompt(URL_PROMPT.to_string()),
                Line::Warn(URL_REQUIRED.to_string()),
                Line::Prompt(URL_PROMPT.to_string()),
            ]
        );
        assert!(harness.launcher.launches.lock().is_empty());
    }

    #[tokio::test]
    async fn unsupported_format_lists_tokens_and_asks_for_url_again() {
        let harness = Harness::new();
        let (outcome, terminal) = harness.run(&["https://example.com/video", "zzz"]).await;

        assert_eq!(outcome, SessionOutcome::InputClosed);
        assert_eq!(terminal.prompts(), vec![URL_PROMPT, FORMAT_PROMPT, URL_PROMPT]);

        let expected: Vec<&str> = harness.registry.supported_tokens().collect();
        let message = format!(
            "File Type Not Supported. Supported File Types are: {}",
            expected.join(", ")
        );
        assert!(terminal.transcript.contains(&Line::Warn(message)));
        assert!(harness.launcher.launches.lock().is_empty());
    }

    #[tokio::test]
    async fn issue_flow_submits_report_and_returns_to_url_prompt() {
        let harness = Harness::new();
        let before = Utc::now();
        let (outcome, terminal) = harness.run(&["issue", "audio cuts out"]).await;

        assert_eq!(outcome, SessionOutcome::InputClosed);
        assert_eq!(terminal.prompts(), vec![URL_PROMPT, ISSUE_PROMPT, URL_PROMPT]);
        assert!(terminal.transcript.contains(&Line::Print(
            "Your Issue report: \"audio cuts out\" has been posted!".to_string()
        )));

        let reports = harness.reporter.reports.lock();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].description, "audio cuts out");
        let stamp = DateTime::parse_from_rfc3339(&reports[0].timestamp()).unwrap();
        let elapsed = Utc::now().signed_duration_since(stamp.with_timezone(&Utc));
        assert!(stamp.with_timezone(&Utc) >= before - chrono::Duration::seconds(1));
        assert!(elapsed < chrono::Duration::seconds(60));
        assert!(harness.launcher.launches.lock().is_empty());
    }

    #[tokio::test]
    async fn failed_issue_delivery_still_confirms() {
        let mut harness = Harness::new();
        harness.reporter = Arc::new(RecordingReporter {
            fail: true,
            ..RecordingReporter::default()
        });
        let (_, terminal) = harness.run(&["issue", "crash on start"]).await;

        assert!(terminal.transcript.contains(&Line::Print(
            "Your Issue report: \"crash on start\" has been posted!".to_string()
        )));
    }

    #[tokio::test]
    async fn blank_format_dispatches_mp3_extraction() {
        let harness = Harness::new();
        let (outcome, terminal) = harness
            .run(&["https://example.com/video", "", "never read"])
            .await;

        assert_eq!(
            outcome,
            SessionOutcome::Dispatched(Completion::exited(Some(0)))
        );
        assert_eq!(terminal.prompts(), vec![URL_PROMPT, FORMAT_PROMPT]);

        let launches = harness.launcher.launches.lock();
        assert_eq!(launches.len(), 1);
        let args = &launches[0];
        assert_eq!(args[0], "-x");
        assert!(args.windows(2).any(|pair| pair == ["--audio-format", "mp3"]));
        assert_eq!(args.last().map(String::as_str), Some("https://example.com/video"));
    }

    #[tokio::test]
    async fn dispatch_renders_downloader_output() {
        let harness = Harness::new();
        let (_, terminal) = harness.run(&["https://example.com/video", "mkv"]).await;

        assert_eq!(
            terminal.transcript[terminal.transcript.len() - 4..],
            [
                Line::Print("Youtube URL: https://example.com/video".to_string()),
                Line::Print("[download] 100% of 3.00MiB".to_string()),
                Line::Warn("stderr: WARNING: no artist tag".to_string()),
                Line::Print(ATTRIBUTION.to_string()),
            ]
        );
        let launches = harness.launcher.launches.lock();
        assert_eq!(launches[0][0], "--format-sort=ext:mkv");
    }

    #[tokio::test]
    async fn nonzero_child_exit_still_completes() {
        let mut harness = Harness::new();
        harness.launcher = Arc::new(FakeLauncher {
            exit_code: Some(2),
            ..FakeLauncher::default()
        });
        let (outcome, _) = harness.run(&["https://example.com/video", "mp4"]).await;

        let SessionOutcome::Dispatched(completion) = outcome else {
            panic!("expected a dispatched download, got {outcome:?}");
        };
        assert_eq!(completion.exit_code, Some(2));
        assert_eq!(completion.host_exit_code(), 1);
    }

    #[tokio::test]
    async fn launcher_failure_is_shown_and_ends_session() {
        let mut harness = Harness::new();
        harness.launcher = Arc::new(FakeLauncher {
            fail: true,
            ..FakeLauncher::default()
        });
        let (outcome, terminal) = harness.run(&["https://example.com/video", "mp3"]).await;

        assert_eq!(outcome, SessionOutcome::Dispatched(Completion::not_started()));
        assert!(matches!(
            terminal.transcript.last(),
            Some(Line::Warn(message)) if message.starts_with("Download failed:")
        ));
        assert_eq!(harness.launcher.launches.lock().len(), 1);
    }
}
