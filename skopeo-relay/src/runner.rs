use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};
use std::thread;

use log::debug;

use crate::error::ExecError;

/// Where the transfer tool's output ends up.
pub type OutputSink = Arc<Mutex<dyn Write + Send>>;

pub fn stdout_sink() -> OutputSink
{
    Arc::new(Mutex::new(io::stdout()))
}

/// Runs the external transfer tool.
pub trait ToolRunner: Send + Sync
{
    /// Run the tool with `args` until it exits. Standard error always goes to
    /// `out`, standard output only when `verbose` is set.
    fn run(&self, out: &OutputSink, verbose: bool, args: &[String]) -> Result<(), ExecError>;
}

const CREDENTIAL_FLAGS: [&str; 2] = ["--src-creds=", "--dest-creds="];

/// Arguments safe for logging.
pub fn redact(args: &[String]) -> Vec<String>
{
    args.iter()
        .map(|arg| {
            match CREDENTIAL_FLAGS.iter().find(|flag| arg.starts_with(*flag)) {
                Some(flag) => format!("{}***", flag),
                None => arg.clone(),
            }
        })
        .collect()
}

pub struct ProcessRunner
{
    binary: String,
}

impl ProcessRunner
{
    const CHUNK: usize = 8192;

    pub fn new(binary: &str) -> Self
    {
        ProcessRunner {
            binary: binary.to_string(),
        }
    }

    fn forward<R: Read>(reader: Option<R>, out: &OutputSink, emit: bool) -> io::Result<()>
    {
        let Some(mut reader) = reader else {
            return Ok(());
        };

        let mut buf = [0u8; Self::CHUNK];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                return Ok(());
            }
            if emit {
                let mut sink = out.lock().map_err(|_| io::Error::other("output sink poisoned"))?;
                sink.write_all(&buf[..n])?;
            }
        }
    }
}

impl ToolRunner for ProcessRunner
{
    fn run(&self, out: &OutputSink, verbose: bool, args: &[String]) -> Result<(), ExecError>
    {
        debug!("Running {} {}", self.binary, redact(args).join(" "));

        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(ExecError::Launch)?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // both pipes are drained concurrently so the child never blocks on a full one
        let (out_result, err_result) = thread::scope(|scope| {
            let out_handle = scope.spawn(move || Self::forward(stdout, out, verbose));
            let err_handle = scope.spawn(move || Self::forward(stderr, out, true));
            (out_handle.join(), err_handle.join())
        });

        let status = child.wait().map_err(ExecError::Io)?;

        for result in [out_result, err_result] {
            match result {
                Ok(Ok(())) => (),
                Ok(Err(e)) => return Err(ExecError::Io(e)),
                Err(_) => return Err(ExecError::Io(io::Error::other("output forwarding panicked"))),
            }
        }

        if let Ok(mut sink) = out.lock() {
            sink.flush().map_err(ExecError::Io)?;
        }

        if !status.success() {
            return Err(ExecError::Status(status));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    fn capture() -> (Arc<Mutex<Vec<u8>>>, OutputSink)
    {
        let buf = Arc::new(Mutex::new(Vec::<u8>::new()));
        let sink: OutputSink = buf.clone();
        (buf, sink)
    }

    fn captured(buf: &Arc<Mutex<Vec<u8>>>) -> String
    {
        String::from_utf8_lossy(&buf.lock().unwrap()).to_string()
    }

    #[test]
    fn redacts_credentials()
    {
        let args: Vec<String> = ["copy", "--src-creds=alice:secret", "--dest-creds=bob:pw", "docker://a"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            redact(&args),
            vec!["copy", "--src-creds=***", "--dest-creds=***", "docker://a"]
        );
    }

    #[test]
    fn missing_binary_fails_to_launch()
    {
        let (_, sink) = capture();
        let result = ProcessRunner::new("/nonexistent/skopeo").run(&sink, true, &[]);
        assert!(matches!(result, Err(ExecError::Launch(_))));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit()
    {
        let (_, sink) = capture();
        let result = ProcessRunner::new("false").run(&sink, true, &[]);
        assert!(matches!(result, Err(ExecError::Status(_))));
    }

    #[cfg(unix)]
    #[test]
    fn verbose_forwards_stdout()
    {
        let (buf, sink) = capture();
        ProcessRunner::new("echo")
            .run(&sink, true, &["hello".to_string()])
            .unwrap();
        assert_eq!(captured(&buf), "hello\n");
    }

    #[cfg(unix)]
    #[test]
    fn quiet_drops_stdout()
    {
        let (buf, sink) = capture();
        ProcessRunner::new("echo")
            .run(&sink, false, &["hello".to_string()])
            .unwrap();
        assert_eq!(captured(&buf), "");
    }

    #[cfg(unix)]
    #[test]
    fn stderr_is_always_forwarded()
    {
        let (buf, sink) = capture();
        let result = ProcessRunner::new("sh").run(
            &sink,
            false,
            &["-c".to_string(), "echo oops >&2; exit 3".to_string()],
        );
        assert!(matches!(result, Err(ExecError::Status(_))));
        assert_eq!(captured(&buf), "oops\n");
    }
}
