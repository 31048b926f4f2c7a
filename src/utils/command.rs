use std::process::Stdio;

use log::debug;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

/// A program and the ordered arguments it is launched with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The program followed by its arguments, joined with single spaces.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to launch {command}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to collect output of {command}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Command failed: {command}\n\nSTDOUT:\n{stdout}\n\nSTDERR:\n{stderr}")]
    Failed {
        command: String,
        /// `None` when the child was terminated by a signal.
        status: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

/// Runs one external command to completion and captures both output streams.
///
/// With `use_shell` set, the command line is handed to the platform shell
/// (`cmd.exe /d /s /c` on Windows, `sh -c` elsewhere) and shell quoting and expansion
/// apply to the arguments. Otherwise the program is spawned directly.
pub struct CommandExecutor {
    use_shell: bool,
}

impl CommandExecutor {
    /// Routes through the shell only on hosts that need it (Windows).
    pub fn new() -> Self {
        Self::with_shell(cfg!(windows))
    }

    pub fn with_shell(use_shell: bool) -> Self {
        CommandExecutor { use_shell }
    }

    #[cfg(windows)]
    fn shell_command(command_line: &str) -> Command {
        // cmd.exe does its own parsing; pass the line verbatim.
        let mut command = Command::new("cmd.exe");
        command
            .raw_arg("/d /s /c")
            .raw_arg(format!("\"{}\"", command_line));
        command
    }

    #[cfg(not(windows))]
    fn shell_command(command_line: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(command_line);
        command
    }

    fn command(&self, invocation: &Invocation) -> Command {
        let mut command = if self.use_shell {
            Self::shell_command(&invocation.command_line())
        } else {
            let mut command = Command::new(invocation.program());
            command.args(invocation.args());
            command
        };

        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    /// Runs `invocation` and resolves once the child has exited.
    ///
    /// Returns the full standard output when the exit status is zero. Any
    /// other status, including termination by a signal, yields
    /// [`CommandError::Failed`] carrying both captured streams. Standard
    /// error is not part of the successful outcome.
    pub async fn execute(&self, invocation: &Invocation) -> Result<String, CommandError> {
        let command_line = invocation.command_line();
        debug!("Running {} (shell: {})", command_line, self.use_shell);

        let mut child = self
            .command(invocation)
            .spawn()
            .map_err(|source| CommandError::Launch {
                command: command_line.clone(),
                source,
            })?;

        let io_error = |source| CommandError::Io {
            command: command_line.clone(),
            source,
        };

        let captured = tokio::try_join!(
            capture(child.stdout.take()),
            capture(child.stderr.take())
        );
        let (stdout, stderr) = match captured {
            Ok(streams) => streams,
            Err(source) => {
                // Kill and reap before reporting the read error.
                let _ = child.kill().await;
                return Err(io_error(source));
            }
        };
        let status = child.wait().await.map_err(io_error)?;

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();
        debug!("{} exited with {}", command_line, status);

        if status.code() == Some(0) {
            if !stderr.is_empty() {
                debug!("Discarding stderr of {}:\n{}", command_line, stderr);
            }
            Ok(stdout)
        } else {
            Err(CommandError::Failed {
                command: command_line,
                status: status.code(),
                stdout,
                stderr,
            })
        }
    }
}

// Appends every chunk in arrival order; decoding waits for the whole buffer
// so multi-byte characters split across reads stay intact.
async fn capture<R: AsyncRead + Unpin>(stream: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let Some(mut stream) = stream else {
        return Ok(buffer);
    };

    let mut chunk = [0u8; 8192];
    loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..read]);
    }
    Ok(buffer)
}
