//! Public tunnel
//!
//! Runs `cloudflared tunnel --url http://localhost:PORT` as a child process
//! so the dashboard can be reached from outside. The process is opaque: its
//! output lines are forwarded to the log (cloudflared prints the public URL
//! there) and it is killed on shutdown.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const CLOUDFLARED: &str = "cloudflared";

/// Start a Cloudflare quick tunnel to the local server
///
/// Returns `None` if the process could not be started. The server keeps
/// running either way.
pub fn spawn_tunnel(port: u16, cancel: CancellationToken) -> Option<JoinHandle<()>> {
    spawn_tunnel_with(CLOUDFLARED, port, cancel)
}

fn tunnel_args(port: u16) -> [String; 3] {
    [
        "tunnel".to_string(),
        "--url".to_string(),
        format!("http://localhost:{}", port),
    ]
}

fn spawn_tunnel_with(
    program: &str,
    port: u16,
    cancel: CancellationToken,
) -> Option<JoinHandle<()>> {
    info!(program, port, "starting tunnel");

    let mut child = match Command::new(program)
        .args(tunnel_args(port))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            warn!(program, error = %e, "failed to start tunnel, continuing on localhost only");
            return None;
        }
    };

    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_lines(stdout, "stdout"));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_lines(stderr, "stderr"));
    }

    let program = program.to_string();
    Some(tokio::spawn(async move {
        tokio::select! {
            status = child.wait() => match status {
                Ok(status) => info!(program = %program, code = ?status.code(), "tunnel process exited"),
                Err(e) => warn!(program = %program, error = %e, "failed to wait for tunnel process"),
            },
            _ = cancel.cancelled() => {
                if let Err(e) = child.kill().await {
                    warn!(program = %program, error = %e, "failed to stop tunnel process");
                } else {
                    info!(program = %program, "tunnel stopped");
                }
            }
        }
    }))
}

/// Log each line of a child output stream
async fn forward_lines<R>(reader: R, stream: &'static str)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => info!(stream, "tunnel: {}", line),
            Ok(None) => break,
            Err(e) => {
                warn!(stream, error = %e, "failed to read tunnel output");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tunnel_args() {
        assert_eq!(
            tunnel_args(6969),
            ["tunnel", "--url", "http://localhost:6969"].map(String::from)
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_not_fatal() {
        let handle = spawn_tunnel_with(
            "dstats-no-such-tunnel-binary",
            6969,
            CancellationToken::new(),
        );
        assert!(handle.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exited_process_finishes_task() {
        // `true` ignores its arguments and exits 0
        let handle = spawn_tunnel_with("true", 6969, CancellationToken::new()).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancel_kills_process() {
        // `yes` runs until killed
        let cancel = CancellationToken::new();
        let handle = spawn_tunnel_with("yes", 6969, cancel.clone()).unwrap();
        cancel.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
