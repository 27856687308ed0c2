use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex as ParkingMutex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::error::SupervisorError;

/// Footer shown once the downloader has exited.
pub const ATTRIBUTION: &str = "ForgeYT made by ForgedCore8, 2023, SquawkSquad";

/// The host always leaves with this status after a dispatched download.
pub const HOST_EXIT_CODE: i32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    /// A line the downloader wrote to stdout.
    Output(String),
    /// A line the downloader wrote to stderr; diagnostic, never fatal.
    Warning(String),
}

/// Signal that the one downloader process of this host has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// `None` when the child was killed by a signal or never started.
    pub exit_code: Option<i32>,
}

impl Completion {
    pub fn exited(exit_code: Option<i32>) -> Self {
        Self { exit_code }
    }

    pub fn not_started() -> Self {
        Self { exit_code: None }
    }

    pub fn host_exit_code(&self) -> i32 {
        HOST_EXIT_CODE
    }
}

/// Seam between the session and whatever runs the downloader.
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(
        &self,
        args: Vec<String>,
        events: mpsc::Sender<DownloadEvent>,
    ) -> Result<Completion, SupervisorError>;
}

#[async_trait]
impl<L: Launcher + ?Sized> Launcher for Arc<L> {
    async fn launch(
        &self,
        args: Vec<String>,
        events: mpsc::Sender<DownloadEvent>,
    ) -> Result<Completion, SupervisorError> {
        (**self).launch(args, events).await
    }
}

/// Runs the downloader once and streams everything it prints.
pub struct ProcessSupervisor {
    program: PathBuf,
    spawned: ParkingMutex<bool>,
}

impl ProcessSupervisor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            spawned: ParkingMutex::new(false),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub async fn run(
        &self,
        args: Vec<String>,
        events: mpsc::Sender<DownloadEvent>,
    ) -> Result<Completion, SupervisorError> {
        {
            let mut spawned = self.spawned.lock();
            if *spawned {
                return Err(SupervisorError::AlreadySpawned);
            }
            *spawned = true;
        }

        info!(program = ?self.program, ?args, "starting downloader");
        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or(SupervisorError::MissingPipe("stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or(SupervisorError::MissingPipe("stderr"))?;

        let streamed = stream_output(stdout, stderr, &events).await;
        finish(child, &events, streamed).await
    }
}

#[async_trait]
impl Launcher for ProcessSupervisor {
    async fn launch(
        &self,
        args: Vec<String>,
        events: mpsc::Sender<DownloadEvent>,
    ) -> Result<Completion, SupervisorError> {
        self.run(args, events).await
    }
}

/// Cuts a byte stream at every `\r` or `\n` as soon as the byte shows up.
/// Progress bars redraw with a bare `\r`.
struct LineSplitter<R> {
    reader: R,
    partial: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LineSplitter<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            partial: Vec::new(),
        }
    }

    /// Cancel safe: bytes are moved into `partial` before anything else awaits.
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                if self.partial.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.take_partial()));
            }

            let boundary = available.iter().position(|b| matches!(b, b'\r' | b'\n'));
            let used = match boundary {
                Some(index) => {
                    self.partial.extend_from_slice(&available[..index]);
                    index + 1
                }
                None => {
                    self.partial.extend_from_slice(available);
                    available.len()
                }
            };
            self.reader.consume(used);

            if boundary.is_some() {
                let line = self.take_partial();
                if !line.trim().is_empty() {
                    return Ok(Some(line));
                }
            }
        }
    }

    fn take_partial(&mut self) -> String {
        let line = String::from_utf8_lossy(&self.partial).into_owned();
        self.partial.clear();
        line
    }
}

async fn stream_output<O, E>(
    stdout: O,
    stderr: E,
    events: &mpsc::Sender<DownloadEvent>,
) -> io::Result<()>
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    let mut stdout_lines = LineSplitter::new(BufReader::new(stdout));
    let mut stderr_lines = LineSplitter::new(BufReader::new(stderr));
    let mut stdout_open = true;
    let mut stderr_open = true;

    while stdout_open || stderr_open {
        tokio::select! {
            line = stdout_lines.next_line(), if stdout_open => match line? {
                Some(line) => {
                    debug!("yt-dlp: {line}");
                    events.send(DownloadEvent::Output(line)).await.ok();
                }
                None => stdout_open = false,
            },
            line = stderr_lines.next_line(), if stderr_open => match line? {
                Some(line) => {
                    debug!("yt-dlp stderr: {line}");
                    events.send(DownloadEvent::Warning(line)).await.ok();
                }
                None => stderr_open = false,
            },
        }
    }
    Ok(())
}

/// Waits for the child and shows the footer even when its output was lost.
async fn finish(
    mut child: Child,
    events: &mpsc::Sender<DownloadEvent>,
    streamed: io::Result<()>,
) -> Result<Completion, SupervisorError> {
    if let Err(error) = &streamed {
        warn!(%error, "stopped reading downloader output");
    }

    let status = child
        .wait()
        .await
        .map_err(|source| SupervisorError::Io { source })?;
    if status.success() {
        info!("downloader finished");
    } else {
        warn!(code = ?status.code(), "downloader exited unsuccessfully");
    }

    events
        .send(DownloadEvent::Output(ATTRIBUTION.to_string()))
        .await
        .ok();

    streamed.map_err(|source| SupervisorError::Io { source })?;
    Ok(Completion::exited(status.code()))
}
