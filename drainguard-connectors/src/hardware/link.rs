//! Byte links to the sensor device and line framing

use std::io::{self, ErrorKind, Read};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use drainguard_core::constants::buffers::MAX_LINK_LINE_LEN;
use heapless::Vec as LineBuf;
use thiserror::Error;

/// Link-level errors
#[derive(Debug, Error)]
pub enum LinkError {
    /// Opening or reading the link failed
    #[error("I/O error on {target}: {source}")]
    Io {
        /// Link description
        target: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Opening or configuring the serial port failed
    #[error("cannot open serial port {target}: {source}")]
    Serial {
        /// Link description
        target: String,
        /// Underlying error
        #[source]
        source: serialport::Error,
    },

    /// Peer closed the link
    #[error("link closed")]
    Closed,

    /// Line exceeded the line buffer and was discarded
    #[error("line longer than {0} bytes discarded")]
    LineTooLong(usize),
}

impl LinkError {
    /// Whether the link must be re-established
    pub fn is_fatal(&self) -> bool {
        !matches!(self, LinkError::LineTooLong(_))
    }
}

/// Opens a readable byte stream to the device
pub trait LinkConnector: Send + Sync {
    /// Open the link
    fn connect(&self) -> Result<Box<dyn Read + Send>, LinkError>;

    /// Human-readable target for logs
    fn describe(&self) -> String;
}

impl<L: LinkConnector + ?Sized> LinkConnector for Box<L> {
    fn connect(&self) -> Result<Box<dyn Read + Send>, LinkError> {
        (**self).connect()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Pick a link for a configured port.
///
/// `tcp://host:port` and bare socket addresses open a TCP bridge; anything
/// else is treated as a serial port name (`/dev/ttyUSB0`, `COM3`) opened at
/// `baud_rate`.
pub fn link_for_port(port: &str, baud_rate: u32, read_timeout: Duration) -> Box<dyn LinkConnector> {
    if let Some(address) = port.strip_prefix("tcp://") {
        return Box::new(TcpLink::new(address, read_timeout));
    }
    if port.parse::<SocketAddr>().is_ok() {
        return Box::new(TcpLink::new(port, read_timeout));
    }
    Box::new(SerialLink::new(port, baud_rate, read_timeout))
}

/// Serial-to-TCP bridge at `host:port`
#[derive(Debug, Clone)]
pub struct TcpLink {
    address: String,
    read_timeout: Duration,
}

impl TcpLink {
    /// Link to `address` with a read timeout
    pub fn new(address: impl Into<String>, read_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            read_timeout,
        }
    }
}

impl LinkConnector for TcpLink {
    fn connect(&self) -> Result<Box<dyn Read + Send>, LinkError> {
        let io_err = |source| LinkError::Io {
            target: self.describe(),
            source,
        };
        let stream = TcpStream::connect(&self.address).map_err(io_err)?;
        // A zero timeout is rejected by the socket API
        let timeout = Some(self.read_timeout).filter(|t| !t.is_zero());
        stream.set_read_timeout(timeout).map_err(io_err)?;
        Ok(Box::new(stream))
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.address)
    }
}

/// Serial port opened at a fixed baud rate
#[derive(Debug, Clone)]
pub struct SerialLink {
    port: String,
    baud_rate: u32,
    read_timeout: Duration,
}

impl SerialLink {
    /// Link to `port` at `baud_rate`, 8N1, with a read timeout
    pub fn new(port: impl Into<String>, baud_rate: u32, read_timeout: Duration) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            read_timeout,
        }
    }

    /// Configured baud rate
    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }
}

impl LinkConnector for SerialLink {
    fn connect(&self) -> Result<Box<dyn Read + Send>, LinkError> {
        let port = serialport::new(self.port.as_str(), self.baud_rate)
            .timeout(self.read_timeout)
            .open()
            .map_err(|source| LinkError::Serial {
                target: self.describe(),
                source,
            })?;
        Ok(Box::new(port))
    }

    fn describe(&self) -> String {
        self.port.clone()
    }
}

/// Splits a byte stream into trimmed text lines
///
/// Lines are accumulated in a fixed buffer of `MAX_LINK_LINE_LEN` bytes.
/// An overlong line is dropped up to its newline and reported once as
/// [`LinkError::LineTooLong`]. A partial line at end of stream is lost.
pub struct LineReader<R> {
    reader: R,
    target: String,
    chunk: [u8; 256],
    pos: usize,
    filled: usize,
    line: LineBuf<u8, MAX_LINK_LINE_LEN>,
    overflow: bool,
}

impl<R: Read> LineReader<R> {
    /// Frame lines from `reader`; `target` names it in errors
    pub fn new(reader: R, target: impl Into<String>) -> Self {
        Self {
            reader,
            target: target.into(),
            chunk: [0; 256],
            pos: 0,
            filled: 0,
            line: LineBuf::new(),
            overflow: false,
        }
    }

    /// Next complete line.
    ///
    /// `Ok(None)` means the read timed out with no complete line; callers
    /// use it to check for cancellation.
    pub fn next_line(&mut self) -> Result<Option<String>, LinkError> {
        loop {
            while self.pos < self.filled {
                let byte = self.chunk[self.pos];
                self.pos += 1;

                if byte == b'\n' {
                    if self.overflow {
                        self.overflow = false;
                        self.line.clear();
                        return Err(LinkError::LineTooLong(MAX_LINK_LINE_LEN));
                    }
                    let text = String::from_utf8_lossy(&self.line).trim().to_string();
                    self.line.clear();
                    return Ok(Some(text));
                }

                if !self.overflow && self.line.push(byte).is_err() {
                    self.overflow = true;
                }
            }

            match self.reader.read(&mut self.chunk) {
                Ok(0) => return Err(LinkError::Closed),
                Ok(n) => {
                    self.pos = 0;
                    self.filled = n;
                }
                Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Ok(None)
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => {}
                Err(source) => {
                    return Err(LinkError::Io {
                        target: self.target.clone(),
                        source,
                    })
                }
            }
        }
    }
}
