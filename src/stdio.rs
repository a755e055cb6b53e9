use std::collections::VecDeque;
use std::io::{self, Read, Stdout, Write};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use embedded_hal_v0::serial;
use tracing::{debug, warn};

/// Bytes requested from stdin per read.
const CHUNK: usize = 256;

/// Serial-like byte channel over the process's standard input and output.
///
/// Standard input is read on a background thread and handed over through a
/// channel, so that reading from this side never blocks. When input ends, a
/// final newline is delivered so that an unterminated last line still
/// counts, and the channel reports itself closed once everything is read.
pub struct StdioChannel {
    rx: Receiver<Vec<u8>>,
    pending: VecDeque<u8>,
    closed: bool,
    stdout: Stdout,
}
impl StdioChannel {
    /// Starts the stdin reader thread.
    pub fn spawn() -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("stdin-reader".into())
            .spawn(move || {
                let mut stdin = io::stdin().lock();
                let mut chunk = [0u8; CHUNK];
                loop {
                    match stdin.read(&mut chunk) {
                        Ok(0) => break,
                        Ok(n) => {
                            if tx.send(chunk[..n].to_vec()).is_err() {
                                return;
                            }
                        }
                        Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                        Err(e) => {
                            warn!("stdin read failed: {e}");
                            break;
                        }
                    }
                }
                debug!("stdin closed");
                let _ = tx.send(vec![b'\n']);
            })?;

        Ok(Self {
            rx,
            pending: VecDeque::new(),
            closed: false,
            stdout: io::stdout(),
        })
    }

    /// Input has ended and every byte of it has been read.
    pub fn is_closed(&self) -> bool {
        self.closed && self.pending.is_empty()
    }
}

impl serial::Read<u8> for StdioChannel {
    type Error = io::Error;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        if self.pending.is_empty() && !self.closed {
            match self.rx.try_recv() {
                Ok(chunk) => self.pending.extend(chunk),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => self.closed = true,
            }
        }
        self.pending.pop_front().ok_or(nb::Error::WouldBlock)
    }
}

impl serial::Write<u8> for StdioChannel {
    type Error = io::Error;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.stdout.write_all(&[word]).map_err(nb::Error::Other)
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        self.stdout.flush().map_err(nb::Error::Other)
    }
}
