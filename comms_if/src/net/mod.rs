//! # Network Module
//!
//! This module provides the line-oriented TCP transport for the command link.
//! The server accepts a single client at a time; a reader thread feeds
//! received lines into a bounded channel which the controller's main loop
//! drains once per cycle, so no controller state is ever touched off the main
//! thread.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender, TryRecvError};
use std::sync::Arc;
use std::thread;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Depth of the inbound line channel between the reader thread and the main
/// loop.
const LINE_CHANNEL_DEPTH: usize = 64;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetParams {
    /// Endpoint the command server listens on, e.g. `"0.0.0.0:9999"`
    pub cmd_endpoint: String,
}

/// A single-client TCP line server.
///
/// Accepting is non-blocking and a new connection replaces the previous
/// client. Received lines are buffered in a bounded channel until the owner
/// drains them with [`CmdServer::recv_line`].
pub struct CmdServer {
    listener: TcpListener,
    client: Option<Client>,
}

/// The connection to the current client.
struct Client {
    /// Write half of the connection
    stream: TcpStream,

    /// Lines received by the reader thread
    lines_rx: Receiver<String>,

    /// Cleared by the reader thread when the connection goes down
    connected: Arc<AtomicBool>,

    addr: SocketAddr,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur in the [`CmdServer`]
#[derive(thiserror::Error, Debug)]
pub enum CmdServerError {
    #[error("Could not bind the command server to {0}: {1}")]
    BindError(String, std::io::Error),

    #[error("Could not accept an incoming connection: {0}")]
    AcceptError(std::io::Error),

    #[error("No client is connected")]
    NotConnected,

    #[error("Could not send data to the client: {0}")]
    SendError(std::io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl CmdServer {
    /// Create a new command server listening on the given endpoint.
    ///
    /// This function will not wait for a client to connect before returning.
    pub fn new(endpoint: &str) -> Result<Self, CmdServerError> {
        let listener = TcpListener::bind(endpoint)
            .map_err(|e| CmdServerError::BindError(endpoint.to_string(), e))?;

        listener
            .set_nonblocking(true)
            .map_err(|e| CmdServerError::BindError(endpoint.to_string(), e))?;

        Ok(Self {
            listener,
            client: None,
        })
    }

    /// The local address the server is listening on.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr().ok()
    }

    /// Accept a pending connection, if there is one.
    ///
    /// Returns the address of the new client, or `None` if no connection is
    /// pending. A new client replaces any previous one, whose connection is
    /// shut down.
    pub fn accept(&mut self) -> Result<Option<SocketAddr>, CmdServerError> {
        let (stream, addr) = match self.listener.accept() {
            Ok(c) => c,
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(None),
            Err(e) => return Err(CmdServerError::AcceptError(e)),
        };

        // Only one client is tracked at a time
        if let Some(old) = self.client.take() {
            warn!(
                "New connection from {} replaces the client at {}",
                addr, old.addr
            );
            old.stream.shutdown(Shutdown::Both).ok();
        }

        let read_stream = stream.try_clone().map_err(CmdServerError::AcceptError)?;

        let (lines_tx, lines_rx) = sync_channel(LINE_CHANNEL_DEPTH);
        let connected = Arc::new(AtomicBool::new(true));

        let connected_clone = connected.clone();
        thread::spawn(move || reader_thread(read_stream, lines_tx, connected_clone));

        self.client = Some(Client {
            stream,
            lines_rx,
            connected,
            addr,
        });

        Ok(Some(addr))
    }

    /// Return if a client is connected or not.
    pub fn is_connected(&self) -> bool {
        match &self.client {
            Some(c) => c.connected.load(Ordering::Relaxed),
            None => false,
        }
    }

    /// Receive a single line from the client, without blocking.
    ///
    /// The protocol here is to call `recv_line` in a loop until `None` is
    /// returned, indicating that no more lines are buffered right now.
    pub fn recv_line(&mut self) -> Option<String> {
        match &self.client {
            Some(c) => match c.lines_rx.try_recv() {
                Ok(l) => Some(l),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
            },
            None => None,
        }
    }

    /// Send a single line to the client, appending the line terminator.
    pub fn send_line(&mut self, line: &str) -> Result<(), CmdServerError> {
        let client = match &mut self.client {
            Some(c) if c.connected.load(Ordering::Relaxed) => c,
            _ => return Err(CmdServerError::NotConnected),
        };

        if let Err(e) = client.stream.write_all(format!("{}\n", line).as_bytes()) {
            client.connected.store(false, Ordering::Relaxed);
            return Err(CmdServerError::SendError(e));
        }
        if let Err(e) = client.stream.flush() {
            client.connected.store(false, Ordering::Relaxed);
            return Err(CmdServerError::SendError(e));
        }

        Ok(())
    }

    /// Drop the client if its connection has gone down.
    ///
    /// Returns true on the cycle the disconnection is first observed. Buffered
    /// lines should be drained before calling this.
    pub fn check_disconnected(&mut self) -> bool {
        let down = match &self.client {
            Some(c) => !c.connected.load(Ordering::Relaxed),
            None => false,
        };

        if down {
            if let Some(old) = self.client.take() {
                debug!("Client {} disconnected", old.addr);
            }
        }

        down
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Read lines from the client until the connection drops.
///
/// Runs on its own thread. The bounded channel provides backpressure if the
/// main loop falls behind.
fn reader_thread(stream: TcpStream, lines_tx: SyncSender<String>, connected: Arc<AtomicBool>) {
    let reader = BufReader::new(stream);

    for line in reader.lines() {
        match line {
            Ok(l) => {
                // If the receiving end is gone there is nothing left to do
                if lines_tx.send(l).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    }

    connected.store(false, Ordering::Relaxed);
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    /// Full accept/receive/send round trip over the loopback interface.
    #[test]
    fn loopback_round_trip() {
        let mut server = CmdServer::new("127.0.0.1:0").unwrap();
        let addr = server.local_addr().unwrap();

        let mut client = TcpStream::connect(addr).unwrap();

        // Accepting is non-blocking, poll until the connection is seen
        let mut accepted = None;
        for _ in 0..100 {
            accepted = server.accept().unwrap();
            if accepted.is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(accepted.is_some());
        assert!(server.is_connected());

        client.write_all(b"status\n").unwrap();
        client.flush().unwrap();

        let mut line = None;
        for _ in 0..100 {
            line = server.recv_line();
            if line.is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(line.as_deref(), Some("status"));

        server.send_line("OK: Robot stopped").unwrap();

        let mut reader = BufReader::new(client.try_clone().unwrap());
        let mut response = String::new();
        reader.read_line(&mut response).unwrap();
        assert_eq!(response, "OK: Robot stopped\n");

        // Dropping the client is eventually observed as a disconnection
        client.shutdown(Shutdown::Both).unwrap();
        drop(reader);
        drop(client);

        let mut disconnected = false;
        for _ in 0..100 {
            if server.check_disconnected() {
                disconnected = true;
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(disconnected);
        assert!(!server.is_connected());
    }

    #[test]
    fn send_without_client() {
        let mut server = CmdServer::new("127.0.0.1:0").unwrap();

        assert!(matches!(
            server.send_line("OK: Robot stopped"),
            Err(CmdServerError::NotConnected)
        ));
    }
}
