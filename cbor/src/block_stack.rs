/*!
The stack of open containers.

Encoder and decoder push a [`Frame`] when a container begins, count every
item encoded or decoded while it is on top, and pop it when the container
ends, so the same well-formedness rules hold in both directions.
*/

use super::*;

/// The kinds of item that can stay open across calls.
///
/// Byte and text strings only appear here while an indefinite-length string
/// is being assembled from chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    Bytes,
    Text,
    Array,
    Map,
}

impl Container {
    pub fn major(self) -> Major {
        match self {
            Container::Bytes => Major::Bytes,
            Container::Text => Major::Text,
            Container::Array => Major::Array,
            Container::Map => Major::Map,
        }
    }

    pub fn name(self) -> &'static str {
        self.major().name()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: Container,
    pub indefinite: bool,
    /// Declared length; pairs for a map. Meaningless when indefinite.
    pub declared_len: u64,
    pub items_seen: u64,
}

impl Frame {
    // Item slots a definite frame holds, two per map pair
    fn slots(&self) -> u64 {
        match self.kind {
            Container::Map => self.declared_len * 2,
            _ => self.declared_len,
        }
    }

    /// Slots left in a definite frame, `None` when indefinite.
    pub fn remaining(&self) -> Option<u64> {
        (!self.indefinite).then(|| self.slots() - self.items_seen)
    }

    pub fn is_full(&self) -> bool {
        !self.indefinite && self.items_seen >= self.slots()
    }

    /// True between a map key and its value.
    pub fn expects_value(&self) -> bool {
        self.kind == Container::Map && self.items_seen % 2 == 1
    }

    pub fn count_item(&mut self) -> Result<(), Error> {
        if self.is_full() {
            return Err(Error::NItems {
                seen: self.items_seen + 1,
                expected: self.slots(),
            });
        }
        self.items_seen += 1;
        Ok(())
    }

    pub fn check_close(&self) -> Result<(), Error> {
        if self.indefinite {
            if self.kind == Container::Map && self.items_seen % 2 != 0 {
                return Err(Error::NItems {
                    seen: self.items_seen,
                    expected: self.items_seen + 1,
                });
            }
        } else if self.items_seen != self.slots() {
            return Err(Error::NItems {
                seen: self.items_seen,
                expected: self.slots(),
            });
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct BlockStack {
    frames: Vec<Frame>,
    max_depth: usize,
}

impl BlockStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    pub fn push(&mut self, kind: Container, indefinite: bool, declared_len: u64) -> Result<(), Error> {
        if self.frames.len() >= self.max_depth {
            return Err(Error::Depth(self.max_depth));
        }
        if kind == Container::Map && !indefinite && declared_len.checked_mul(2).is_none() {
            return Err(Error::Range(declared_len as i128));
        }
        self.frames.try_reserve(1).map_err(|_| {
            Error::NoMemory(std::mem::size_of::<Frame>() * (self.frames.len() + 1))
        })?;
        self.frames.push(Frame {
            kind,
            indefinite,
            declared_len,
            items_seen: 0,
        });
        Ok(())
    }

    pub fn top(&self) -> Result<&Frame, Error> {
        self.frames.last().ok_or(Error::Operation("no container is open"))
    }

    pub fn top_mut(&mut self) -> Result<&mut Frame, Error> {
        self.frames
            .last_mut()
            .ok_or(Error::Operation("no container is open"))
    }

    pub fn current(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub(crate) fn current_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    pub fn pop(&mut self) -> Result<Frame, Error> {
        self.frames.pop().ok_or(Error::Operation("no container is open"))
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames from the outermost inwards.
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }
}
