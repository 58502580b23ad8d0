use crate::signal::{CancelToken, Event};
use crate::{HarnessError, HarnessResult};
use crossbeam_channel::{unbounded, Sender};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Serial transmitter.
///
/// A worker thread owns the sink and plays the part of the DMA channel: it
/// drains one submitted buffer at a time and raises `tx-complete` when done.
/// A new buffer is only handed over after the previous completion was seen.
#[derive(Debug)]
pub struct SerialPort {
    tx_buffer_len: usize,
    submit: Option<Sender<Vec<u8>>>,
    complete: Event,
    worker: Option<JoinHandle<()>>,
    cancel: CancelToken,
    timeout: Option<Duration>,
    messages: u64,
}

impl SerialPort {
    pub fn new(
        mut sink: Box<dyn Write + Send>,
        tx_buffer_len: usize,
        cancel: CancelToken,
        timeout: Option<Duration>,
    ) -> HarnessResult<Self> {
        let (submit, rx) = unbounded::<Vec<u8>>();
        let complete = Event::new("tx-complete");
        let done = complete.clone();

        let worker = thread::Builder::new()
            .name("uart-tx".to_string())
            .spawn(move || {
                for buf in rx {
                    if let Err(e) = sink.write_all(&buf).and_then(|_| sink.flush()) {
                        tracing::error!("Serial sink write failed: {}", e);
                    }
                    done.set();
                }
            })?;

        // Idle line: nothing in flight.
        complete.set();

        Ok(Self {
            tx_buffer_len,
            submit: Some(submit),
            complete,
            worker: Some(worker),
            cancel,
            timeout,
            messages: 0,
        })
    }

    pub fn tx_buffer_len(&self) -> usize {
        self.tx_buffer_len
    }

    /// Number of buffers handed to the worker so far.
    pub fn messages(&self) -> u64 {
        self.messages
    }

    /// Copies `text` into a transmit buffer, truncating like `snprintf`
    /// (room is kept for the terminator the wire never sees).
    fn fill(&self, text: &str) -> Vec<u8> {
        let room = self.tx_buffer_len.saturating_sub(1);
        if text.len() <= room {
            return text.as_bytes().to_vec();
        }
        let mut end = room;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        tracing::debug!("Serial message truncated from {} to {} bytes", text.len(), end);
        text.as_bytes()[..end].to_vec()
    }

    /// Starts transmitting `text` once the previous transmission is done.
    pub fn submit(&mut self, text: &str) -> HarnessResult<()> {
        self.complete.wait(&self.cancel, self.timeout)?;
        let buf = self.fill(text);
        self.submit
            .as_ref()
            .ok_or(HarnessError::SerialClosed)?
            .send(buf)
            .map_err(|_| HarnessError::SerialClosed)?;
        self.messages += 1;
        Ok(())
    }

    /// Waits until the line is idle.
    pub fn flush(&self) -> HarnessResult<()> {
        self.complete.wait(&self.cancel, self.timeout)?;
        self.complete.set();
        Ok(())
    }

    pub fn print_and_wait(&mut self, text: &str) -> HarnessResult<()> {
        self.submit(text)?;
        self.flush()
    }
}

impl Drop for SerialPort {
    fn drop(&mut self) {
        self.submit.take();
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                tracing::warn!("Serial worker thread panicked");
            }
        }
    }
}

/// In-memory sink that keeps everything written to it, optionally echoing
/// to stdout.
#[derive(Debug, Clone, Default)]
pub struct CaptureSink {
    buf: Arc<Mutex<Vec<u8>>>,
    echo: bool,
}

impl CaptureSink {
    pub fn new(echo: bool) -> Self {
        Self {
            buf: Arc::default(),
            echo,
        }
    }

    pub fn contents(&self) -> String {
        let guard = match self.buf.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        String::from_utf8_lossy(&guard).into_owned()
    }
}

impl Write for CaptureSink {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf
            .lock()
            .map_err(|_| io::Error::other("capture buffer poisoned"))?
            .extend_from_slice(data);
        if self.echo {
            io::stdout().write_all(data)?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.echo {
            io::stdout().flush()?;
        }
        Ok(())
    }
}
