/*!
Buffered byte I/O over a reader, a writer, or a memory region.

A [`Buffer`] is opened in one direction and stays that way: a reading buffer
holds a window of unread bytes plus a single pushback slot, a writing buffer
holds bytes not yet handed to the sink. Memory buffers read from, or append
to, an owned `Vec<u8>`.
*/

use super::*;
use std::{
    fs::File,
    io::{self, Read, Write},
    path::Path,
};

pub const DEFAULT_CAPACITY: usize = 4096;

// Payloads are read in steps of at most this size, so a declared length only
// turns into an allocation once the bytes actually arrive.
const READ_STEP: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
}

enum Backing {
    Reader(Box<dyn Read + Send>),
    Writer(Box<dyn Write + Send>),
    Memory,
}

pub struct Buffer {
    backing: Backing,
    mode: Mode,
    data: Vec<u8>,
    capacity: usize,
    pos: usize,
    len: usize,
    pushback: Option<u8>,
    dirty: bool,
    exhausted: bool,
    offset: u64,
}

impl Buffer {
    pub fn reader<R: Read + Send + 'static>(reader: R) -> Self {
        Self::reader_with_capacity(reader, DEFAULT_CAPACITY)
    }

    pub fn reader_with_capacity<R: Read + Send + 'static>(reader: R, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            backing: Backing::Reader(Box::new(reader)),
            mode: Mode::Read,
            data: vec![0; capacity],
            capacity,
            pos: 0,
            len: 0,
            pushback: None,
            dirty: false,
            exhausted: false,
            offset: 0,
        }
    }

    pub fn writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self::writer_with_capacity(writer, DEFAULT_CAPACITY)
    }

    pub fn writer_with_capacity<W: Write + Send + 'static>(writer: W, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            backing: Backing::Writer(Box::new(writer)),
            mode: Mode::Write,
            data: Vec::with_capacity(capacity),
            capacity,
            pos: 0,
            len: 0,
            pushback: None,
            dirty: false,
            exhausted: false,
            offset: 0,
        }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        File::open(path).map(Self::reader).map_err(Error::Read)
    }

    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        File::create(path).map(Self::writer).map_err(Error::Write)
    }

    /// A reading buffer over an owned byte vector.
    pub fn from_vec(data: Vec<u8>) -> Self {
        let len = data.len();
        Self {
            backing: Backing::Memory,
            mode: Mode::Read,
            data,
            capacity: len,
            pos: 0,
            len,
            pushback: None,
            dirty: false,
            exhausted: true,
            offset: 0,
        }
    }

    pub fn from_slice(data: &[u8]) -> Self {
        Self::from_vec(data.to_vec())
    }

    /// A writing buffer that grows in memory; see [`Buffer::into_vec`].
    pub fn memory() -> Self {
        Self {
            backing: Backing::Memory,
            mode: Mode::Write,
            data: Vec::new(),
            capacity: 0,
            pos: 0,
            len: 0,
            pushback: None,
            dirty: false,
            exhausted: false,
            offset: 0,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Size of the read or write window; 0 for a growable memory sink.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes consumed (reading) or produced (writing) so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// True when written bytes are waiting to be flushed to the sink.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn check_mode(&self, mode: Mode) -> Result<(), Error> {
        if self.mode != mode {
            Err(Error::Operation(match mode {
                Mode::Read => "buffer is not open for reading",
                Mode::Write => "buffer is not open for writing",
            }))
        } else {
            Ok(())
        }
    }

    // Ensures at least one unread byte is in the window, returning false at end of input
    fn fill(&mut self) -> Result<bool, Error> {
        if self.pos < self.len {
            return Ok(true);
        }
        if self.exhausted {
            return Ok(false);
        }
        let Backing::Reader(reader) = &mut self.backing else {
            return Ok(false);
        };
        loop {
            match reader.read(&mut self.data) {
                Ok(0) => {
                    self.exhausted = true;
                    return Ok(false);
                }
                Ok(n) => {
                    self.pos = 0;
                    self.len = n;
                    return Ok(true);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Read(e)),
            }
        }
    }

    pub fn getc(&mut self) -> Result<u8, Error> {
        self.check_mode(Mode::Read)?;
        if let Some(b) = self.pushback.take() {
            self.offset += 1;
            return Ok(b);
        }
        if !self.fill()? {
            return Err(Error::Eof);
        }
        let b = self.data[self.pos];
        self.pos += 1;
        self.offset += 1;
        Ok(b)
    }

    /// Pushes one byte back so the next read returns it.
    ///
    /// # Panics
    ///
    /// Panics if a previously pushed-back byte has not been consumed yet.
    pub fn ungetc(&mut self, b: u8) {
        assert!(
            self.pushback.is_none(),
            "ungetc called twice without an intervening read"
        );
        self.pushback = Some(b);
        self.offset = self.offset.saturating_sub(1);
    }

    pub fn peek(&mut self) -> Result<u8, Error> {
        let b = self.getc()?;
        self.ungetc(b);
        Ok(b)
    }

    /// Fills ahead without consuming anything.
    pub fn is_eof(&mut self) -> Result<bool, Error> {
        self.check_mode(Mode::Read)?;
        if self.pushback.is_some() {
            return Ok(false);
        }
        self.fill().map(|more| !more)
    }

    /// Fills `out` completely, or fails with [`Error::Eof`].
    pub fn read(&mut self, out: &mut [u8]) -> Result<(), Error> {
        self.check_mode(Mode::Read)?;
        let mut done = 0;
        if !out.is_empty() {
            if let Some(b) = self.pushback.take() {
                out[0] = b;
                done = 1;
                self.offset += 1;
            }
        }
        while done < out.len() {
            if !self.fill()? {
                return Err(Error::Eof);
            }
            let n = (self.len - self.pos).min(out.len() - done);
            out[done..done + n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            done += n;
            self.offset += n as u64;
        }
        Ok(())
    }

    /// Appends exactly `n` bytes to `dst`.
    ///
    /// `dst` grows as the bytes arrive, so an oversized `n` over a short
    /// input fails with [`Error::Eof`] rather than a huge allocation.
    pub fn read_append(&mut self, dst: &mut Vec<u8>, n: u64) -> Result<(), Error> {
        let mut remaining = n;
        while remaining > 0 {
            let step = remaining.min(READ_STEP as u64) as usize;
            dst.try_reserve(step).map_err(|_| Error::NoMemory(step))?;
            let start = dst.len();
            dst.resize(start + step, 0);
            if let Err(e) = self.read(&mut dst[start..]) {
                dst.truncate(start);
                return Err(e);
            }
            remaining -= step as u64;
        }
        Ok(())
    }

    pub fn read_vec(&mut self, n: u64) -> Result<Vec<u8>, Error> {
        let mut v = Vec::new();
        self.read_append(&mut v, n)?;
        Ok(v)
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.check_mode(Mode::Write)?;
        if matches!(self.backing, Backing::Memory) {
            self.data
                .try_reserve(bytes.len())
                .map_err(|_| Error::NoMemory(bytes.len()))?;
            self.data.extend_from_slice(bytes);
            self.len = self.data.len();
        } else {
            if self.data.len() + bytes.len() > self.capacity {
                self.flush_pending()?;
            }
            if bytes.len() >= self.capacity {
                if let Backing::Writer(writer) = &mut self.backing {
                    writer.write_all(bytes).map_err(Error::Write)?;
                }
            } else {
                self.data.extend_from_slice(bytes);
                self.dirty = true;
            }
        }
        self.offset += bytes.len() as u64;
        Ok(())
    }

    fn flush_pending(&mut self) -> Result<(), Error> {
        if let Backing::Writer(writer) = &mut self.backing {
            let r = if self.data.is_empty() {
                Ok(())
            } else {
                writer.write_all(&self.data)
            };
            // Whatever happened, the pending bytes cannot be retried
            self.data.clear();
            self.dirty = false;
            r.map_err(Error::Write)?;
        }
        Ok(())
    }

    /// Hands all pending bytes to the sink and flushes it.
    pub fn flush(&mut self) -> Result<(), Error> {
        self.check_mode(Mode::Write)?;
        self.flush_pending()?;
        if let Backing::Writer(writer) = &mut self.backing {
            writer.flush().map_err(Error::Write)?;
        }
        Ok(())
    }

    /// Takes the bytes of a memory buffer.
    pub fn into_vec(mut self) -> Result<Vec<u8>, Error> {
        match self.backing {
            Backing::Memory => {
                self.len = 0;
                Ok(std::mem::take(&mut self.data))
            }
            _ => Err(Error::Operation("not a memory buffer")),
        }
    }

    /// Flushes a writing buffer and releases the source or sink.
    pub fn close(mut self) -> Result<(), Error> {
        if self.mode == Mode::Write {
            self.flush()?;
        }
        Ok(())
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(e) = self.flush() {
                warn!("Failed to flush buffer on drop: {e}");
            }
        }
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field(
                "backing",
                &match self.backing {
                    Backing::Reader(_) => "reader",
                    Backing::Writer(_) => "writer",
                    Backing::Memory => "memory",
                },
            )
            .field("mode", &self.mode)
            .field("pos", &self.pos)
            .field("len", &self.len)
            .field("offset", &self.offset)
            .field("dirty", &self.dirty)
            .finish()
    }
}
