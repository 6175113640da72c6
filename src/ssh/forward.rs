// ABOUTME: Unix socket forwarding over SSH direct-streamlocal channels.
// ABOUTME: Binds a local socket and pipes each accepted connection to the remote socket.

use super::client::SshHandler;
use super::error::{Error, Result};
use russh::ChannelMsg;
use russh::client::Handle;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Notify;

const COPY_BUFFER_SIZE: usize = 64 * 1024;
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(100);
const STOP_GRACE: Duration = Duration::from_secs(2);

/// A running forward. The local socket file is removed on stop or drop.
pub struct ForwardHandle {
    local_path: PathBuf,
    shutdown: Arc<AtomicBool>,
    stopped: Arc<Notify>,
}

impl ForwardHandle {
    pub(crate) fn path(&self) -> Option<&str> {
        self.local_path.to_str()
    }

    /// Stop accepting connections and remove the local socket.
    pub async fn stop(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        tokio::select! {
            _ = self.stopped.notified() => {}
            _ = tokio::time::sleep(STOP_GRACE) => {}
        }
        let _ = std::fs::remove_file(&self.local_path);
    }
}

impl Drop for ForwardHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        let _ = std::fs::remove_file(&self.local_path);
    }
}

/// Bind a fresh local socket and forward it to `remote_socket`.
pub async fn start_forward(
    handle: Arc<Handle<SshHandler>>,
    remote_socket: String,
) -> Result<ForwardHandle> {
    tracing::debug!("forwarding to remote {}", remote_socket);
    serve(local_socket_path(), move |stream| {
        let handle = Arc::clone(&handle);
        let remote_socket = remote_socket.clone();
        async move { pipe_connection(stream, &handle, &remote_socket).await }
    })
}

/// Bind `local_path` and hand every accepted connection to `connect`.
fn serve<F, Fut>(local_path: PathBuf, connect: F) -> Result<ForwardHandle>
where
    F: Fn(UnixStream) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let _ = std::fs::remove_file(&local_path);

    let listener = UnixListener::bind(&local_path).map_err(|e| {
        Error::SocketForwardFailed(format!("failed to bind {}: {}", local_path.display(), e))
    })?;
    tracing::debug!("listening on {}", local_path.display());

    let shutdown = Arc::new(AtomicBool::new(false));
    let stopped = Arc::new(Notify::new());

    tokio::spawn(accept_loop(
        listener,
        connect,
        Arc::clone(&shutdown),
        Arc::clone(&stopped),
    ));

    Ok(ForwardHandle {
        local_path,
        shutdown,
        stopped,
    })
}

fn local_socket_path() -> PathBuf {
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("hauler-{}-{}.sock", std::process::id(), n))
}

async fn accept_loop<F, Fut>(
    listener: UnixListener,
    connect: F,
    shutdown: Arc<AtomicBool>,
    stopped: Arc<Notify>,
) where
    F: Fn(UnixStream) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    while !shutdown.load(Ordering::SeqCst) {
        let accepted = tokio::select! {
            result = listener.accept() => result,
            _ = tokio::time::sleep(ACCEPT_POLL_INTERVAL) => continue,
        };

        match accepted {
            Ok((stream, _)) => {
                let connection = connect(stream);
                tokio::spawn(async move {
                    if let Err(e) = connection.await {
                        tracing::debug!("forwarded connection ended with error: {}", e);
                    }
                });
            }
            Err(e) => {
                if !shutdown.load(Ordering::SeqCst) {
                    tracing::warn!("accept failed on forwarded socket: {}", e);
                }
                break;
            }
        }
    }

    stopped.notify_one();
}

/// Copy bytes both ways between one local connection and a new SSH channel.
async fn pipe_connection(
    mut local: UnixStream,
    handle: &Handle<SshHandler>,
    remote_socket: &str,
) -> Result<()> {
    let mut channel = handle
        .channel_open_direct_streamlocal(remote_socket)
        .await
        .map_err(|e| {
            Error::SocketForwardFailed(format!("failed to open channel to {}: {}", remote_socket, e))
        })?;

    let mut local_eof = false;
    let mut remote_eof = false;
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];

    loop {
        tokio::select! {
            read = local.read(&mut buf), if !local_eof => match read {
                Ok(0) => {
                    local_eof = true;
                    let _ = channel.eof().await;
                }
                Ok(n) => channel.data(&buf[..n]).await?,
                Err(e) => return Err(e.into()),
            },

            msg = channel.wait(), if !remote_eof => match msg {
                Some(ChannelMsg::Data { ref data }) => local.write_all(data).await?,
                Some(ChannelMsg::Eof) => {
                    remote_eof = true;
                    if local_eof {
                        break;
                    }
                }
                Some(ChannelMsg::Close) | None => break,
                Some(_) => {}
            },

            else => break,
        }
    }

    Ok(())
}
