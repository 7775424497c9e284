//! steamcmd process adapter.
//!
//! steamcmd keeps its own app-info cache in its working directory, so two
//! instances must never run at once. [`SteamCmd::invoke`] kills any running
//! copy by name before launching, captures stdout and stderr line by line in
//! arrival order, and only returns once the process has exited.
//!
//! The refresh loop talks to the tool through [`ToolRunner`], which keeps the
//! process boundary swappable.

use crate::AppId;
use crate::error::{AppInfoError, Result};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

/// Separator used when joining captured output lines
pub const LINE_SEPARATOR: &str = "\n";

/// Something that can run a steamcmd command line and return its combined output
pub trait ToolRunner: Send + Sync {
    fn invoke(&self, args: &[String]) -> impl Future<Output = Result<String>> + Send;
}

/// The real steamcmd binary
#[derive(Debug, Clone)]
pub struct SteamCmd {
    path: PathBuf,
    process_name: String,
    exclusive: bool,
}

impl SteamCmd {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let process_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "steamcmd".to_string());
        Self {
            path,
            process_name,
            exclusive: true,
        }
    }

    /// Whether to kill other instances before each launch (on by default)
    pub fn exclusive(mut self, exclusive: bool) -> Self {
        self.exclusive = exclusive;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// Kill every running process carrying this tool's name
    pub async fn kill(&self) {
        kill_by_name(&self.process_name).await;
    }
}

impl ToolRunner for SteamCmd {
    async fn invoke(&self, args: &[String]) -> Result<String> {
        if self.exclusive {
            self.kill().await;
        }

        debug!(tool = %self.path.display(), args = %args.join(" "), "launching steamcmd");
        let mut child = Command::new(&self.path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AppInfoError::Launch {
                path: self.path.clone(),
                source,
            })?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, tx.clone()));
        }
        drop(tx);

        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }

        let status = child.wait().await?;
        debug!(%status, lines = lines.len(), "steamcmd exited");

        Ok(lines.join(LINE_SEPARATOR))
    }
}

/// Forward each line of `reader` (lossily decoded, CR stripped) until EOF
async fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut segments = BufReader::new(reader).split(b'\n');
    while let Ok(Some(segment)) = segments.next_segment().await {
        let line = String::from_utf8_lossy(&segment);
        if tx.send(line.trim_end_matches('\r').to_string()).is_err() {
            break;
        }
    }
}

/// Kill processes by executable name; failures are only logged
pub async fn kill_by_name(name: &str) {
    #[cfg(windows)]
    let mut command = {
        let mut command = Command::new("taskkill");
        command.args(["/F", "/IM"]).arg(format!("{}.exe", name));
        command
    };
    #[cfg(not(windows))]
    let mut command = {
        let mut command = Command::new("pkill");
        command.args(["-x", name]);
        command
    };

    match command
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
    {
        Ok(status) => debug!(name, %status, "killed stray processes"),
        Err(e) => debug!(name, error = %e, "could not run process killer"),
    }
}

fn session(commands: &[String]) -> Vec<String> {
    let mut args: Vec<String> = ["+@ShutdownOnFailedCommand", "0", "+login", "anonymous"]
        .into_iter()
        .map(String::from)
        .collect();
    args.extend_from_slice(commands);
    args.push("+quit".to_string());
    args
}

/// Print app info after forcing an update, which refreshes steamcmd's app-info state
pub fn update_command(app_id: AppId, install_dir: &Path, refresh_app_id: AppId) -> Vec<String> {
    session(&[
        "+app_info_print".to_string(),
        app_id.to_string(),
        "+force_install_dir".to_string(),
        install_dir.display().to_string(),
        "+app_update".to_string(),
        refresh_app_id.to_string(),
    ])
}

/// Print app info only
pub fn print_command(app_id: AppId) -> Vec<String> {
    session(&["+app_info_print".to_string(), app_id.to_string()])
}

/// Start steamcmd and exit immediately (first-run self-update)
pub fn quit_command() -> Vec<String> {
    vec!["+quit".to_string()]
}
