use crate::config::toml_config::BootConfig;
use crate::domain::ports::{BootOutcome, InstallationLauncher};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::task::JoinHandle;

const STDERR_TAIL_CHARS: usize = 400;
const STDERR_TAIL_LINES: usize = 20;
/// 停止指令或 SIGTERM 之後等待伺服器結束的時間
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);
const STDERR_COLLECT_WAIT: Duration = Duration::from_secs(1);

/// 以子行程啟動安裝目錄中的伺服器腳本
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    command: String,
    args: Vec<String>,
    success_marker: Option<String>,
    stop_command: Option<String>,
    stop_args: Vec<String>,
}

impl ProcessLauncher {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            success_marker: None,
            stop_command: None,
            stop_args: Vec::new(),
        }
    }

    pub fn with_success_marker(mut self, marker: impl Into<String>) -> Self {
        self.success_marker = Some(marker.into());
        self
    }

    pub fn with_stop_command(mut self, command: impl Into<String>, args: Vec<String>) -> Self {
        self.stop_command = Some(command.into());
        self.stop_args = args;
        self
    }

    pub fn from_config(config: &BootConfig) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            success_marker: config.success_marker.clone(),
            stop_command: config.stop_command.clone(),
            stop_args: config.stop_args.clone(),
        }
    }

    /// 先執行停止指令，再對整個行程群組送 SIGTERM，最後 SIGKILL；一定會回收子行程
    async fn shutdown(&self, child: &mut Child, pid: Option<u32>, installation: &Path) {
        if let Some(stop) = &self.stop_command {
            let program = installation.join(stop);
            tracing::debug!("Stopping server with {} {:?}", program.display(), self.stop_args);
            let mut stop_command = Command::new(&program);
            stop_command
                .args(&self.stop_args)
                .current_dir(installation)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .kill_on_drop(true);
            match tokio::time::timeout(SHUTDOWN_GRACE, stop_command.status()).await {
                Ok(Ok(status)) if status.success() => {}
                Ok(Ok(status)) => tracing::warn!("Stop command exited with {}", status),
                Ok(Err(e)) => tracing::warn!("Could not run {}: {}", program.display(), e),
                Err(_) => tracing::warn!("Stop command did not finish in time"),
            }
            if wait_within(child, SHUTDOWN_GRACE).await.is_some() {
                signal_group(pid, GroupSignal::Kill);
                return;
            }
        }

        signal_group(pid, GroupSignal::Terminate);
        let exited = wait_within(child, SHUTDOWN_GRACE).await.is_some();
        signal_group(pid, GroupSignal::Kill);
        if !exited {
            tracing::warn!("Server ignored SIGTERM, killing it");
            if let Err(e) = child.kill().await {
                tracing::warn!("Failed to kill server: {}", e);
            }
        }
    }
}

fn tail(text: &str) -> String {
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return trimmed.to_string();
    }
    trimmed.chars().skip(count - STDERR_TAIL_CHARS).collect()
}

#[derive(Debug, Clone, Copy)]
enum GroupSignal {
    Terminate,
    Kill,
}

/// 伺服器在自己的行程群組中執行，訊號送給整個群組才不會留下孫行程
#[cfg(unix)]
fn signal_group(pid: Option<u32>, signal: GroupSignal) {
    let Some(pid) = pid.and_then(|pid| libc::pid_t::try_from(pid).ok()) else {
        return;
    };
    let signal = match signal {
        GroupSignal::Terminate => libc::SIGTERM,
        GroupSignal::Kill => libc::SIGKILL,
    };
    // 群組已不存在時回傳 ESRCH，可忽略
    unsafe {
        libc::kill(-pid, signal);
    }
}

#[cfg(not(unix))]
fn signal_group(_pid: Option<u32>, _signal: GroupSignal) {}

async fn wait_within(child: &mut Child, limit: Duration) -> Option<ExitStatus> {
    match tokio::time::timeout(limit, child.wait()).await {
        Ok(Ok(status)) => Some(status),
        Ok(Err(e)) => {
            tracing::warn!("Failed to wait for server: {}", e);
            None
        }
        Err(_) => None,
    }
}

/// 逐行讀取 stdout 直到出現標記；stdout 關閉仍未出現則回傳 false
async fn wait_for_marker(lines: &mut Lines<BufReader<ChildStdout>>, marker: &str) -> Result<bool> {
    while let Some(line) = lines.next_line().await? {
        tracing::trace!("server: {}", line);
        if line.contains(marker) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// 只保留 stderr 最後幾行，避免長時間執行的伺服器佔用記憶體
fn collect_stderr_tail(stderr: Option<ChildStderr>) -> JoinHandle<String> {
    tokio::spawn(async move {
        let mut recent = VecDeque::with_capacity(STDERR_TAIL_LINES);
        if let Some(stderr) = stderr {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if recent.len() == STDERR_TAIL_LINES {
                    recent.pop_front();
                }
                recent.push_back(line);
            }
        }
        recent.into_iter().collect::<Vec<_>>().join("\n")
    })
}

async fn stderr_tail(handle: JoinHandle<String>) -> String {
    match tokio::time::timeout(STDERR_COLLECT_WAIT, handle).await {
        Ok(Ok(text)) => tail(&text),
        _ => String::new(),
    }
}

fn exit_reason(status: Option<ExitStatus>, stderr: &str) -> String {
    let status = status.map_or_else(|| "unknown status".to_string(), |s| s.to_string());
    format!("exited with {}: {}", status, stderr)
}

#[async_trait]
impl InstallationLauncher for ProcessLauncher {
    async fn launch(&self, installation: &Path, timeout: Duration) -> Result<BootOutcome> {
        let program = installation.join(&self.command);
        tracing::debug!("Launching {} {:?}", program.display(), self.args);

        let mut command = Command::new(&program);
        command
            .args(&self.args)
            .current_dir(installation)
            .stdin(Stdio::null())
            .stdout(if self.success_marker.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        unsafe {
            command.pre_exec(|| {
                if libc::setpgid(0, 0) == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return Ok(BootOutcome::Failed {
                    reason: format!("could not start {}: {}", program.display(), e),
                })
            }
        };
        let pid = child.id();
        let stderr = collect_stderr_tail(child.stderr.take());

        // 沒有標記時，啟動指令必須在時限內以 0 結束
        let Some(marker) = &self.success_marker else {
            return match tokio::time::timeout(timeout, child.wait()).await {
                Ok(status) => {
                    let status = status?;
                    signal_group(pid, GroupSignal::Kill);
                    if status.success() {
                        Ok(BootOutcome::Clean)
                    } else {
                        Ok(BootOutcome::Failed {
                            reason: exit_reason(Some(status), &stderr_tail(stderr).await),
                        })
                    }
                }
                Err(_) => {
                    self.shutdown(&mut child, pid, installation).await;
                    Ok(BootOutcome::TimedOut)
                }
            };
        };

        let Some(stdout) = child.stdout.take() else {
            self.shutdown(&mut child, pid, installation).await;
            return Ok(BootOutcome::Failed {
                reason: "server stdout was not captured".to_string(),
            });
        };
        let mut lines = BufReader::new(stdout).lines();

        let watched = tokio::time::timeout(timeout, wait_for_marker(&mut lines, marker)).await;
        // 停止期間伺服器仍可能寫 stdout，持續讀取以免阻塞
        tokio::spawn(async move { while let Ok(Some(_)) = lines.next_line().await {} });

        let outcome = match watched {
            Ok(Ok(true)) => {
                tracing::debug!("Found startup marker '{}'", marker);
                BootOutcome::Clean
            }
            Ok(Ok(false)) => {
                let reason = match wait_within(&mut child, SHUTDOWN_GRACE).await {
                    Some(status) if status.success() => {
                        format!("startup marker '{}' not found in output", marker)
                    }
                    status => exit_reason(status, &stderr_tail(stderr).await),
                };
                BootOutcome::Failed { reason }
            }
            Ok(Err(e)) => BootOutcome::Failed {
                reason: format!("could not read server output: {}", e),
            },
            Err(_) => BootOutcome::TimedOut,
        };

        self.shutdown(&mut child, pid, installation).await;
        Ok(outcome)
    }
}
