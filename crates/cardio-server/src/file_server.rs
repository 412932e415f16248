//! Single-client TCP file server.
//!
//! The accept loop runs for the whole acquisition and keeps exactly one
//! client attached; a newer connection replaces the previous one with a
//! warning. The coordinator triggers the actual transfer at end-of-run via
//! [`TcpFileServer::send_available_files`]. A transport error closes the
//! offending socket and aborts the send; the server keeps listening until
//! stopped.

use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::error::{Result, ServerError};

/// Poll interval of the accept loop; caps shutdown latency at one second
/// the way a receive timeout would.
const ACCEPT_POLL: Duration = Duration::from_secs(1);

/// Chunk size for streaming file contents.
const CHUNK_SIZE: usize = 8192;

struct Shared {
    data_dir: PathBuf,
    client: Mutex<Option<TcpStream>>,
    files_ready: AtomicBool,
    stop: AtomicBool,
    connections: AtomicU64,
    bytes_transferred: AtomicU64,
}

pub struct TcpFileServer {
    shared: Arc<Shared>,
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    handle: Option<JoinHandle<()>>,
}

impl TcpFileServer {
    /// Bind the listening socket on all interfaces.
    ///
    /// Port 0 binds an ephemeral port; see [`TcpFileServer::local_addr`].
    /// The served directory must already exist.
    pub fn bind(port: u16, data_dir: &Path) -> Result<Self> {
        if !data_dir.is_dir() {
            return Err(ServerError::DataDirMissing {
                path: data_dir.to_path_buf(),
            });
        }

        let listener =
            TcpListener::bind(("0.0.0.0", port)).map_err(|source| ServerError::Bind {
                port,
                source,
            })?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        info!(%local_addr, dir = %data_dir.display(), "file server listening");

        Ok(Self {
            shared: Arc::new(Shared {
                data_dir: data_dir.to_path_buf(),
                client: Mutex::new(None),
                files_ready: AtomicBool::new(false),
                stop: AtomicBool::new(false),
                connections: AtomicU64::new(0),
                bytes_transferred: AtomicU64::new(0),
            }),
            listener: Some(listener),
            local_addr,
            handle: None,
        })
    }

    /// Address the server is actually bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Start the accept loop thread.
    pub fn run(&mut self) {
        let Some(listener) = self.listener.take() else {
            warn!("file server already running");
            return;
        };
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("file-server".into())
            .spawn(move || accept_loop(listener, shared))
            .expect("failed to spawn file server thread");
        self.handle = Some(handle);
    }

    /// Whether a client is currently attached.
    pub fn has_connected_client(&self) -> bool {
        self.shared.client.lock().is_some()
    }

    /// Push all produced files to the attached client, if any.
    ///
    /// Marks the files ready, so a client that connects afterwards is
    /// served immediately by the accept loop.
    pub fn send_available_files(&self) {
        send_files(&self.shared);
    }

    /// Stop the accept loop and close any attached client.
    pub fn stop(&mut self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        *self.shared.client.lock() = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("file server thread panicked");
            }
        }
        info!(
            connections = self.shared.connections.load(Ordering::Relaxed),
            bytes = self.shared.bytes_transferred.load(Ordering::Relaxed),
            "file server stopped"
        );
    }
}

fn accept_loop(listener: TcpListener, shared: Arc<Shared>) {
    while !shared.stop.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, peer)) => {
                info!(%peer, "client connected");
                // The listener is non-blocking; the per-client transfer
                // must not be.
                if let Err(error) = stream.set_nonblocking(false) {
                    warn!(%error, "failed to configure client socket");
                }
                {
                    let mut slot = shared.client.lock();
                    if slot.is_some() {
                        warn!("new client connected, closing previous connection");
                    }
                    *slot = Some(stream);
                }
                shared.connections.fetch_add(1, Ordering::Relaxed);
                if shared.files_ready.load(Ordering::SeqCst) {
                    send_files(&shared);
                }
            }
            Err(error) if error.kind() == ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL);
            }
            Err(error) => {
                if !shared.stop.load(Ordering::SeqCst) {
                    error!(%error, "accept failed");
                }
                break;
            }
        }
    }
    info!("file server loop exited");
}

/// Atomically take the attached client and stream every regular file of the
/// data directory to it, lexicographically sorted. The connection is closed
/// after the last file, or immediately on a transport error.
fn send_files(shared: &Shared) {
    shared.files_ready.store(true, Ordering::SeqCst);

    let mut slot = shared.client.lock();
    let Some(mut stream) = slot.take() else {
        info!("no client connected, files will not be sent");
        return;
    };

    let files = match list_files(&shared.data_dir) {
        Ok(files) => files,
        Err(error) => {
            error!(%error, "failed to enumerate data directory");
            return;
        }
    };

    if files.is_empty() {
        warn!("no files available to send");
        let _ = stream.write_all(b"ERROR: no files available\n");
        return;
    }

    info!(count = files.len(), "sending files to client");

    if let Err(error) = stream.write_all(format!("FILES {}\n", files.len()).as_bytes()) {
        error!(%error, "failed to send file count");
        return;
    }

    for path in &files {
        if let Err(error) = send_file(&mut stream, path, shared) {
            error!(path = %path.display(), %error, "transfer failed, closing client");
            return;
        }
    }

    info!("all files sent");
}

fn list_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|entry| entry.path())
        .collect();
    files.sort();
    Ok(files)
}

fn send_file(stream: &mut TcpStream, path: &Path, shared: &Shared) -> std::io::Result<()> {
    let mut file = File::open(path)?;
    let length = file.metadata()?.len();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    stream.write_all(format!("FILE {name} {length}\n").as_bytes())?;

    let mut buffer = [0u8; CHUNK_SIZE];
    let mut sent: u64 = 0;
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        stream.write_all(&buffer[..read])?;
        sent += read as u64;
    }

    shared.bytes_transferred.fetch_add(sent, Ordering::Relaxed);
    info!(name = %name, bytes = sent, "file sent");
    Ok(())
}
