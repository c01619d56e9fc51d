use crate::error::Result;
use crate::models::Chunk;
use crate::utils::constants::DEFAULT_CHUNK_SIZE;
use std::io::Read;

/// Reads a source in fixed-size blocks and yields newline-aligned chunks.
///
/// The bytes after the last `\n` of each block are carried into the next
/// iteration, so a record is never split across two chunks. The final chunk
/// is whatever remains at end of input and may lack a terminator.
pub struct ChunkReader<R> {
    source: R,
    block_size: usize,
    remainder: Vec<u8>,
    next_seq: u64,
    finished: bool,
}

impl<R: Read> ChunkReader<R> {
    pub fn new(source: R) -> Self {
        Self::with_block_size(source, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_block_size(source: R, block_size: usize) -> Self {
        Self {
            source,
            block_size: block_size.max(1),
            remainder: Vec::new(),
            next_seq: 0,
            finished: false,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Read up to one block onto the end of the remainder. Returns the byte
    /// count, `0` meaning end of input. Short reads are retried until the
    /// block is full or the source is exhausted.
    fn fill(&mut self) -> std::io::Result<usize> {
        self.remainder.reserve(self.block_size);
        (&mut self.source)
            .take(self.block_size as u64)
            .read_to_end(&mut self.remainder)
    }

    fn emit(&mut self, data: Vec<u8>) -> Chunk {
        let chunk = Chunk::new(self.next_seq, data);
        self.next_seq += 1;
        chunk
    }

    fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        loop {
            let scanned_from = self.remainder.len();
            let read = self.fill()?;

            if read == 0 {
                self.finished = true;
                if self.remainder.is_empty() {
                    return Ok(None);
                }
                let rest = std::mem::take(&mut self.remainder);
                return Ok(Some(self.emit(rest)));
            }

            // Bytes before `scanned_from` were already searched and hold no terminator.
            if let Some(pos) = memchr::memrchr(b'\n', &self.remainder[scanned_from..]) {
                let split = scanned_from + pos + 1;
                let rest = self.remainder.split_off(split);
                let lines = std::mem::replace(&mut self.remainder, rest);
                return Ok(Some(self.emit(lines)));
            }
        }
    }
}

impl<R: Read> Iterator for ChunkReader<R> {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
