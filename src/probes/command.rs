use std::process::Stdio;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;

use crate::core::errors::{ExecError, SharecrawlerError};

#[allow(dead_code)]
#[derive(Debug)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration_ms: u128,
}

/// Run one probe command to completion, capturing both streams.
///
/// A non-zero exit, a spawn failure and a timeout all become
/// `SharecrawlerError::Exec` with the stderr tail attached, which the task
/// pool then logs and counts as a fault.
pub async fn execute(tool: &str, args: &[String], timeout_ms: u64) -> Result<CommandResult> {
    let start = Instant::now();

    tracing::debug!("executing: {} {:?}", tool, args);

    let mut cmd = Command::new(tool);
    cmd.args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn {tool}"))?;

    let stdout_pipe = child.stdout.take().context("child stdout missing")?;
    let stderr_pipe = child.stderr.take().context("child stderr missing")?;

    // Drain both pipes while waiting so a chatty child can't stall on a full
    // pipe buffer.
    let (stdout_result, stderr_result, wait_result) = tokio::join!(
        read_lines(BufReader::new(stdout_pipe)),
        read_lines(BufReader::new(stderr_pipe)),
        timeout(Duration::from_millis(timeout_ms), child.wait()),
    );

    let duration_ms = start.elapsed().as_millis();

    let status = match wait_result {
        Ok(Ok(status)) => status,
        Ok(Err(err)) => {
            return Err(SharecrawlerError::Exec(ExecError {
                tool: tool.to_string(),
                args: args.to_vec(),
                exit_code: None,
                stderr_tail: format!("process error: {err}"),
                duration_ms,
            })
            .into());
        }
        Err(_) => {
            let _ = child.kill().await;
            return Err(SharecrawlerError::Exec(ExecError {
                tool: tool.to_string(),
                args: args.to_vec(),
                exit_code: None,
                stderr_tail: format!("command timed out after {timeout_ms}ms"),
                duration_ms,
            })
            .into());
        }
    };

    let stdout = stdout_result?;
    let stderr = stderr_result?;
    let exit_code = status.code().unwrap_or(-1);

    if !status.success() {
        return Err(SharecrawlerError::Exec(ExecError {
            tool: tool.to_string(),
            args: args.to_vec(),
            exit_code: Some(exit_code),
            stderr_tail: tail(&stderr, 10),
            duration_ms,
        })
        .into());
    }

    Ok(CommandResult {
        stdout,
        stderr,
        exit_code,
        duration_ms,
    })
}

async fn read_lines<R>(reader: BufReader<R>) -> Result<String>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut collected = Vec::new();
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        collected.push(line);
    }
    Ok(collected.join("\n"))
}

fn tail(text: &str, keep: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let skip = lines.len().saturating_sub(keep);
    lines[skip..].join("\n")
}
