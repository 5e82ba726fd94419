//! # Code Executor
//!
//! Runs code snippets and shell commands in a subprocess, bounded by a timeout.
//! Output is stdout, then stderr under a separator, then the exit status on failure.

use anyhow::{Context as AnyhowContext, Result, anyhow};
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Interpreter invocation for a `code_type`, reading the program from stdin.
pub fn interpreter_for(code_type: &str) -> Option<(&'static str, &'static [&'static str])> {
    match code_type.trim().to_ascii_lowercase().as_str() {
        "python" | "py" | "python3" => Some(("python3", &["-"])),
        "bash" | "sh" | "shell" => Some(("sh", &["-s"])),
        "javascript" | "js" | "node" => Some(("node", &["-"])),
        "ruby" | "rb" => Some(("ruby", &["-"])),
        "r" => Some(("Rscript", &["-"])),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct CodeExecutor {
    timeout: Duration,
    working_dir: Option<PathBuf>,
}

impl CodeExecutor {
    pub fn new(timeout: Duration, working_dir: Option<PathBuf>) -> Self {
        Self {
            timeout,
            working_dir,
        }
    }

    /// Execute a shell command.
    pub async fn execute_command(&self, command: &str) -> Result<String> {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", command]);
            c
        };
        cmd.stdin(Stdio::null());

        debug!("execute_command: {}", command);
        let child = self.prepare(&mut cmd).spawn().context("Failed to spawn command shell")?;
        let output = self.wait(child.wait_with_output()).await?;
        Ok(format_output(&output))
    }

    /// Execute `code` with the interpreter registered for `code_type`.
    pub async fn execute_code(&self, code: &str, code_type: &str) -> Result<String> {
        let (program, args) = interpreter_for(code_type)
            .ok_or_else(|| anyhow!("Unsupported code type: {}", code_type))?;

        let mut cmd = Command::new(program);
        cmd.args(args);
        cmd.stdin(Stdio::piped());

        debug!("execute_code: {} ({} bytes)", code_type, code.len());
        let mut child = self
            .prepare(&mut cmd)
            .spawn()
            .with_context(|| format!("Failed to start interpreter {}", program))?;

        // stdin is fed while stdout/stderr drain, all under the timeout.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                if let Err(e) = stdin.write_all(code.as_bytes()).await {
                    debug!("Interpreter closed stdin early: {}", e);
                }
            }
        };
        let run = async move {
            let ((), output) = tokio::join!(feed, child.wait_with_output());
            output
        };

        let output = self.wait(run).await?;
        Ok(format_output(&output))
    }

    fn prepare<'a>(&self, cmd: &'a mut Command) -> &'a mut Command {
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
    }

    async fn wait(
        &self,
        output: impl std::future::Future<Output = std::io::Result<Output>>,
    ) -> Result<Output> {
        tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| anyhow!("Execution timed out after {}s", self.timeout.as_secs()))?
            .context("Failed to collect process output")
    }
}

pub fn format_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    let mut result = String::new();
    if !stdout.is_empty() {
        result.push_str(&stdout);
    }
    if !stderr.is_empty() {
        if !result.is_empty() {
            result.push_str("\n--- STDERR ---\n");
        }
        result.push_str(&stderr);
    }

    if !output.status.success() {
        if !result.is_empty() {
            result.push('\n');
        }
        result.push_str(&format!("[Exit Code: {}]", output.status));
    }

    result
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn executor() -> CodeExecutor {
        CodeExecutor::new(Duration::from_secs(10), None)
    }

    #[tokio::test]
    async fn test_execute_command() {
        let result = executor()
            .execute_command("echo 'Hello, Coral!'")
            .await
            .expect("Failed to execute command");
        assert!(result.contains("Hello, Coral!"));
    }

    #[tokio::test]
    async fn test_failed_command_reports_exit_code() -> anyhow::Result<()> {
        let result = executor().execute_command("echo oops >&2; exit 3").await?;
        assert!(result.contains("oops"));
        assert!(result.contains("[Exit Code:"));
        Ok(())
    }

    #[tokio::test]
    async fn test_execute_shell_code_from_stdin() -> anyhow::Result<()> {
        let result = executor()
            .execute_code("x=21\necho $((x * 2))\n", "bash")
            .await?;
        assert_eq!(result.trim(), "42");
        Ok(())
    }

    #[tokio::test]
    async fn test_large_script_with_large_output() -> anyhow::Result<()> {
        let line = format!("echo {}\n", "a".repeat(64));
        let script = line.repeat(5_000);
        let result = executor().execute_code(&script, "sh").await?;
        assert_eq!(result.lines().count(), 5_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_code_timeout_covers_stdin() {
        // The interpreter never reads, so the script can only be fed under the timeout.
        let executor = CodeExecutor::new(Duration::from_secs(1), None);
        let script = "#".repeat(1 << 20);
        let err = executor
            .execute_code(&format!("sleep 5\n{}", script), "sh")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_unsupported_code_type() {
        let err = executor().execute_code("print(1)", "cobol").await.unwrap_err();
        assert!(err.to_string().contains("Unsupported code type"));
    }

    #[tokio::test]
    async fn test_timeout() {
        let executor = CodeExecutor::new(Duration::from_secs(1), None);
        let err = executor.execute_command("sleep 5").await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_runs_in_working_dir() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let executor = CodeExecutor::new(Duration::from_secs(10), Some(dir.path().to_path_buf()));
        executor.execute_command("touch marker.txt").await?;
        assert!(dir.path().join("marker.txt").exists());
        Ok(())
    }

    #[test]
    fn test_interpreter_aliases() {
        assert_eq!(interpreter_for("Python").map(|(p, _)| p), Some("python3"));
        assert_eq!(interpreter_for("js").map(|(p, _)| p), Some("node"));
        assert_eq!(interpreter_for("sh").map(|(p, _)| p), Some("sh"));
        assert!(interpreter_for("cobol").is_none());
    }
}
