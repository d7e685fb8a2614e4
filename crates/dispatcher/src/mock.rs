//! In-memory sink for unit tests

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use contracts::{ConnectionStatus, ContractError, Delivery, LineSink};

#[derive(Debug, Clone, Copy)]
enum Mode {
    Accept,
    Fail,
    Reconnect,
}

pub struct MockSink {
    name: String,
    mode: Mode,
    status: ConnectionStatus,
    lines: Arc<Mutex<Vec<Vec<u8>>>>,
    closes: Arc<AtomicUsize>,
}

impl MockSink {
    fn with_mode(name: &str, mode: Mode) -> Self {
        Self {
            name: name.to_string(),
            mode,
            status: ConnectionStatus::Connected,
            lines: Arc::new(Mutex::new(Vec::new())),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn new(name: &str) -> Self {
        Self::with_mode(name, Mode::Accept)
    }

    /// Every write fails with a write error
    pub fn failing(name: &str) -> Self {
        Self::with_mode(name, Mode::Fail)
    }

    /// Every write reports a reconnect
    pub fn reconnecting(name: &str) -> Self {
        Self::with_mode(name, Mode::Reconnect)
    }

    pub fn lines(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.lines)
    }

    pub fn close_count(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }
}

impl LineSink for MockSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn status(&self) -> ConnectionStatus {
        self.status
    }

    async fn write(&mut self, line: &[u8]) -> Result<Delivery, ContractError> {
        if self.status == ConnectionStatus::Closed {
            return Err(ContractError::DestinationClosed {
                destination: self.name.clone(),
            });
        }
        match self.mode {
            Mode::Accept => {
                self.lines.lock().unwrap().push(line.to_vec());
                Ok(Delivery::Written(line.len()))
            }
            Mode::Fail => Err(ContractError::write(
                &self.name,
                io::Error::new(io::ErrorKind::BrokenPipe, "mock failure"),
            )),
            Mode::Reconnect => Ok(Delivery::Reconnected),
        }
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        self.status = ConnectionStatus::Closed;
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
