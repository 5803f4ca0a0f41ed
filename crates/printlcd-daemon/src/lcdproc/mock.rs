//! In-process LCDd stand-in for tests
//!
//! Listens on a loopback port, records every command line it receives and
//! answers the way LCDd does: `connect ...` for `hello`, `success` for known
//! commands and `huh? ...` for anything else.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub(crate) const HELLO_20X4: &str =
    "connect LCDproc 0.5.9 protocol 0.3 lcd wid 20 hgt 4 cellwid 5 cellhgt 8";

#[derive(Default)]
struct Shared {
    commands: Mutex<Vec<String>>,
    connections: AtomicUsize,
    hangups: AtomicUsize,
}

pub(crate) struct MockLcdd {
    addr: SocketAddr,
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl MockLcdd {
    pub(crate) async fn start() -> Self {
        Self::with_hello(HELLO_20X4).await
    }

    /// Start a mock answering `hello` with `hello_reply`
    pub(crate) async fn with_hello(hello_reply: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shared = Arc::new(Shared::default());

        let accept_shared = shared.clone();
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                accept_shared.connections.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve(stream, accept_shared.clone(), hello_reply));
            }
        });

        Self { addr, shared, task }
    }

    pub(crate) fn host(&self) -> &'static str {
        "127.0.0.1"
    }

    pub(crate) fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Every command received so far, across all connections
    pub(crate) fn commands(&self) -> Vec<String> {
        self.shared.commands.lock().unwrap().clone()
    }

    /// Commands received so far, then forget them
    pub(crate) fn take_commands(&self) -> Vec<String> {
        std::mem::take(&mut *self.shared.commands.lock().unwrap())
    }

    /// Number of TCP connections accepted so far
    pub(crate) fn connection_count(&self) -> usize {
        self.shared.connections.load(Ordering::SeqCst)
    }

    /// Drop the connection instead of answering the next `count` commands
    pub(crate) fn hang_up_next(&self, count: usize) {
        self.shared.hangups.store(count, Ordering::SeqCst);
    }
}

impl Drop for MockLcdd {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(stream: TcpStream, shared: Arc<Shared>, hello_reply: &'static str) {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let hang_up = shared
            .hangups
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if hang_up {
            return;
        }

        shared.commands.lock().unwrap().push(line.clone());

        let verb = line.split_whitespace().next().unwrap_or_default();
        let reply = match verb {
            "hello" => format!("{}\n", hello_reply),
            // LCDd announces a screen becoming visible before acknowledging
            "screen_set" if line.contains("foreground") => {
                let screen = line.split_whitespace().nth(1).unwrap_or_default();
                format!("listen {}\nsuccess\n", screen)
            }
            "screen_add" | "screen_set" | "screen_del" | "widget_add" | "widget_set"
            | "widget_del" | "client_set" => "success\n".to_string(),
            other => format!("huh? Invalid command \"{}\"\n", other),
        };

        if write_half.write_all(reply.as_bytes()).await.is_err() {
            return;
        }
    }
}
