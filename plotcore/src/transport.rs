use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal_v0::serial;
use thiserror::Error;

/// Default capacity of the inbound line buffer, in bytes.
pub const LINE_CAPACITY: usize = 96;

/// Line-oriented view of a byte-oriented duplex channel.
///
/// Inbound bytes are accumulated until a line terminator (`\n` or `\r`)
/// arrives. Neither [LineTransport::poll] nor [LineTransport::send] ever
/// blocks; a channel with nothing to read is a normal, empty poll.
///
/// # Type Parameters
///
/// - `C`: The byte channel.
/// - `N`: Capacity of the line buffer, in bytes.
pub struct LineTransport<C, const N: usize = LINE_CAPACITY> {
    channel: C,
    buffer: heapless::String<N>,
    overflowed: bool,
}
impl<C, E, const N: usize> LineTransport<C, N>
where
    C: serial::Read<u8, Error = E> + serial::Write<u8, Error = E>,
{
    /// Creates a new LineTransport.
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            buffer: heapless::String::new(),
            overflowed: false,
        }
    }

    /// Reads whatever is available, returning at most one complete line.
    ///
    /// A partial line stays buffered until a later poll completes it. Empty
    /// lines are skipped, so `\r\n` and `\n\r` endings both work.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(line))`: a complete line (without terminator).
    /// - `Ok(None)`: no complete line is available yet.
    /// - `Err(TransportError::LineTooLong)`: a line overflowed the buffer;
    ///   it has been discarded up to its terminator.
    /// - `Err(TransportError::Channel(_))`: the channel failed.
    pub fn poll(
        &mut self,
    ) -> Result<Option<heapless::String<N>>, TransportError<E>> {
        loop {
            let byte = match self.channel.read() {
                Ok(byte) => byte,
                Err(nb::Error::WouldBlock) => return Ok(None),
                Err(nb::Error::Other(error)) => {
                    return Err(TransportError::Channel(error))
                }
            };

            match byte {
                b'\n' | b'\r' => {
                    if self.overflowed {
                        self.overflowed = false;
                        self.buffer.clear();
                        return Err(TransportError::LineTooLong);
                    }
                    if !self.buffer.is_empty() {
                        return Ok(Some(core::mem::take(&mut self.buffer)));
                    }
                }
                _ if self.overflowed => {}
                _ => {
                    if self.buffer.push(byte as char).is_err() {
                        self.overflowed = true;
                        self.buffer.clear();
                    }
                }
            }
        }
    }

    /// Writes `text` to the channel.
    ///
    /// There is no retry: if the channel cannot take a byte, the rest of
    /// the text is dropped and `TransportError::WouldBlock` is returned.
    pub fn send(&mut self, text: &str) -> Result<(), TransportError<E>> {
        for byte in text.bytes() {
            match self.channel.write(byte) {
                Ok(()) => {}
                Err(nb::Error::WouldBlock) => {
                    return Err(TransportError::WouldBlock)
                }
                Err(nb::Error::Other(error)) => {
                    return Err(TransportError::Channel(error))
                }
            }
        }
        match self.channel.flush() {
            Ok(()) | Err(nb::Error::WouldBlock) => Ok(()),
            Err(nb::Error::Other(error)) => Err(TransportError::Channel(error)),
        }
    }

    /// The underlying channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// A line has been started but not yet terminated.
    pub fn has_partial_line(&self) -> bool {
        !self.buffer.is_empty() || self.overflowed
    }
}

/// Errors that might occur on a line transport.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TransportError<E> {
    /// An inbound line did not fit the line buffer.
    #[error("inbound line too long")]
    LineTooLong,
    /// The channel could not accept the whole response.
    #[error("channel would block")]
    WouldBlock,
    /// The channel itself failed.
    #[error("channel error: {0:?}")]
    Channel(E),
}

/// One direction of an in-memory duplex link.
type Pipe = Rc<RefCell<VecDeque<u8>>>;

/// One end of an in-memory duplex byte channel.
///
/// Create a connected pair with [duplex]. Bytes written to one end are read
/// from the other. Reads never block; an empty pipe is `WouldBlock`.
#[derive(Debug)]
pub struct DuplexEnd {
    rx: Pipe,
    tx: Pipe,
}
impl DuplexEnd {
    /// Queues text for the other end to read.
    pub fn write_str(&mut self, text: &str) {
        self.tx.borrow_mut().extend(text.bytes());
    }

    /// Drains everything the other end has written so far.
    pub fn read_available(&mut self) -> String {
        let bytes: Vec<u8> = self.rx.borrow_mut().drain(..).collect();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Creates a connected pair of in-memory channel ends.
///
/// By convention the first end is given to the device (the transport) and the
/// second is kept by the host (the sender).
pub fn duplex() -> (DuplexEnd, DuplexEnd) {
    let a: Pipe = Rc::default();
    let b: Pipe = Rc::default();
    (
        DuplexEnd {
            rx: a.clone(),
            tx: b.clone(),
        },
        DuplexEnd { rx: b, tx: a },
    )
}

impl serial::Read<u8> for DuplexEnd {
    type Error = Infallible;

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        self.rx.borrow_mut().pop_front().ok_or(nb::Error::WouldBlock)
    }
}

impl serial::Write<u8> for DuplexEnd {
    type Error = Infallible;

    fn write(&mut self, word: u8) -> nb::Result<(), Self::Error> {
        self.tx.borrow_mut().push_back(word);
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Self::Error> {
        Ok(())
    }
}
