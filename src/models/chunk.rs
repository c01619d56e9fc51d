/// A newline-aligned span of the input.
///
/// Every chunk except possibly the last one of a stream ends with `\n`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    seq: u64,
    data: Vec<u8>,
}

impl Chunk {
    pub fn new(seq: u64, data: Vec<u8>) -> Self {
        Self { seq, data }
    }

    /// Position of this chunk in emission order.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_terminated(&self) -> bool {
        self.data.last() == Some(&b'\n')
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
