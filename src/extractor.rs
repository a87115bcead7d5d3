//! Cutting clips with an external media tool.
//!
//! The pipeline only needs "cut `[start, end)` of this file into that file without
//! re-encoding, and tell me whether it worked". [`ClipExtractor`] is that seam;
//! [`FfmpegExtractor`] is the production implementation.

use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::planner::SegmentJob;
use crate::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Performs one lossless trim per job.
///
/// Implementations must not overwrite an existing destination.
pub trait ClipExtractor {
    fn extract(&self, job: &SegmentJob) -> Result<()>;
}

impl<T: ClipExtractor + ?Sized> ClipExtractor for &T {
    fn extract(&self, job: &SegmentJob) -> Result<()> {
        (**self).extract(job)
    }
}

/// Runs `ffmpeg -i IN -ss START -to END -c copy -n OUT`.
#[derive(Debug, Clone)]
pub struct FfmpegExtractor {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl Default for FfmpegExtractor {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl FfmpegExtractor {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    /// Kill the tool and fail the clip if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Arguments passed to the tool for `job`.
    pub fn args(&self, job: &SegmentJob) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-hide_banner", "-nostdin", "-loglevel", "error", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(job.source_file.clone().into_os_string());
        args.push("-ss".into());
        args.push(job.start.to_string().into());
        args.push("-to".into());
        args.push(job.end.to_string().into());
        args.push("-c".into());
        args.push("copy".into());
        // Never overwrite.
        args.push("-n".into());
        args.push(job.destination_path.clone().into_os_string());
        args
    }

    fn command_line(&self, args: &[OsString]) -> String {
        let mut line = self.program.display().to_string();
        for arg in args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}

impl ClipExtractor for FfmpegExtractor {
    fn extract(&self, job: &SegmentJob) -> Result<()> {
        let args = self.args(job);
        let command = self.command_line(&args);
        debug!(%command, "running");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| Error::Extraction {
                command: command.clone(),
                status: "not started".to_owned(),
                stderr: err.to_string(),
            })?;

        // Drain stderr on its own thread so a chatty tool can't block on a full pipe.
        let stderr = child.stderr.take();
        let stderr_reader = thread::spawn(move || {
            let mut buf = Vec::new();
            if let Some(mut pipe) = stderr {
                let _ = pipe.read_to_end(&mut buf);
            }
            String::from_utf8_lossy(&buf).trim().to_owned()
        });

        let status = match self.timeout {
            None => child.wait()?,
            Some(limit) => match wait_with_deadline(&mut child, limit)? {
                Some(status) => status,
                None => {
                    // A grandchild may still hold the pipe open; the reader is left detached.
                    drop(stderr_reader);
                    return Err(Error::Timeout {
                        command,
                        after: limit,
                    });
                }
            },
        };
        if status.success() {
            return Ok(());
        }

        let stderr = stderr_reader
            .join()
            .unwrap_or_else(|_| "stderr reader panicked".to_owned());
        Err(Error::Extraction {
            command,
            status: status.to_string(),
            stderr,
        })
    }
}

/// Wait for `child`, killing it once `limit` has passed. `Ok(None)` means it was killed.
fn wait_with_deadline(child: &mut Child, limit: Duration) -> Result<Option<ExitStatus>> {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if started.elapsed() >= limit {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}
