use std::collections::HashMap;

use crate::scene::{Id, SceneGraph};

/// Record operation: append payload to the buffer's tail.
pub const OP_APPEND: u8 = 1;
/// Record operation: overwrite payload at an offset, growing if needed.
pub const OP_UPDATE_RANGE: u8 = 2;

/// Record header: op (1) + bufferId (4) + offset (4) + payloadLen (4).
pub const HEADER_SIZE: usize = 13;

/// Default per-buffer cap before front eviction kicks in.
pub const DEFAULT_MAX_BYTES: u32 = 4 * 1024 * 1024;

/// Outcome of decoding one batch.
#[derive(Debug, Clone, Default)]
pub struct IngestResult {
    /// Buffers mutated by this batch, deduplicated, in first-touch order.
    pub touched_buffer_ids: Vec<Id>,
    /// Payload bytes committed.
    pub payload_bytes: u32,
    /// Trailing bytes dropped because they did not form a complete record.
    pub dropped_bytes: u32,
}

#[derive(Debug)]
struct CpuBuffer {
    data: Vec<u8>,
    max_bytes: u32,
}

impl CpuBuffer {
    fn new() -> Self {
        Self {
            data: Vec::new(),
            max_bytes: DEFAULT_MAX_BYTES,
        }
    }

    fn enforce_cap(&mut self) {
        if self.data.len() > self.max_bytes as usize {
            let excess = self.data.len() - self.max_bytes as usize;
            self.data.drain(..excess);
        }
    }
}

/// CPU-side byte store fed by the binary record stream.
///
/// Holds the actual bytes for every scene buffer; the scene only records
/// lengths. Buffers are created implicitly on first ingest.
#[derive(Debug, Default)]
pub struct IngestProcessor {
    buffers: HashMap<Id, CpuBuffer>,
}

impl IngestProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one batch: a little-endian concatenation of records.
    ///
    /// Valid records before a malformed tail are committed; the trailing
    /// bytes, including a partial header, are dropped and counted from the start of
    /// the offending record.
    pub fn process_batch(&mut self, batch: &[u8]) -> IngestResult {
        let mut result = IngestResult::default();
        let mut pos = 0usize;

        while pos + HEADER_SIZE <= batch.len() {
            let op = batch[pos];
            let buffer_id = Id::from(read_u32_le(&batch[pos + 1..pos + 5]));
            let offset = read_u32_le(&batch[pos + 5..pos + 9]) as usize;
            let payload_len = read_u32_le(&batch[pos + 9..pos + 13]) as usize;

            let payload_start = pos + HEADER_SIZE;
            if payload_start + payload_len > batch.len() {
                break;
            }
            let payload = &batch[payload_start..payload_start + payload_len];

            let buf = self.buffers.entry(buffer_id).or_insert_with(CpuBuffer::new);
            match op {
                OP_APPEND => {
                    buf.data.extend_from_slice(payload);
                    buf.enforce_cap();
                }
                OP_UPDATE_RANGE => {
                    let needed = offset + payload_len;
                    if needed > buf.data.len() {
                        buf.data.resize(needed, 0);
                    }
                    buf.data[offset..needed].copy_from_slice(payload);
                }
                _ => {
                    // Unknown op: the record framing is still valid, skip it.
                    pos = payload_start + payload_len;
                    continue;
                }
            }

            result.payload_bytes += payload_len as u32;
            if !result.touched_buffer_ids.contains(&buffer_id) {
                result.touched_buffer_ids.push(buffer_id);
            }
            pos = payload_start + payload_len;
        }

        if pos < batch.len() {
            result.dropped_bytes = (batch.len() - pos) as u32;
            log::warn!(
                "ingest batch truncated: dropped {} trailing bytes",
                result.dropped_bytes
            );
        }
        result
    }

    /// Bytes of a buffer; empty when the buffer does not exist.
    pub fn data(&self, id: Id) -> &[u8] {
        self.buffers.get(&id).map_or(&[], |b| b.data.as_slice())
    }

    /// Current size of a buffer in bytes; 0 when absent.
    pub fn size(&self, id: Id) -> u32 {
        self.buffers.get(&id).map_or(0, |b| b.data.len() as u32)
    }

    /// Ids of every CPU buffer currently held.
    pub fn buffer_ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.buffers.keys().copied()
    }

    /// Create the buffer if it does not exist yet.
    pub fn ensure_buffer(&mut self, id: Id) {
        self.buffers.entry(id).or_insert_with(CpuBuffer::new);
    }

    /// Replace a buffer's contents wholesale.
    pub fn set_buffer_data(&mut self, id: Id, bytes: &[u8]) {
        let buf = self.buffers.entry(id).or_insert_with(CpuBuffer::new);
        buf.data.clear();
        buf.data.extend_from_slice(bytes);
        buf.enforce_cap();
    }

    /// Drop a CPU buffer entirely (the owning scene resource was deleted).
    pub fn remove_buffer(&mut self, id: Id) {
        self.buffers.remove(&id);
    }

    /// Set a buffer's cap and enforce it immediately.
    pub fn set_max_bytes(&mut self, id: Id, max_bytes: u32) {
        let buf = self.buffers.entry(id).or_insert_with(CpuBuffer::new);
        buf.max_bytes = max_bytes;
        buf.enforce_cap();
    }

    pub fn max_bytes(&self, id: Id) -> u32 {
        self.buffers.get(&id).map_or(DEFAULT_MAX_BYTES, |b| b.max_bytes)
    }

    /// Erase up to `bytes` from the front of a buffer.
    pub fn evict_front(&mut self, id: Id, bytes: u32) {
        if let Some(buf) = self.buffers.get_mut(&id) {
            let n = (bytes as usize).min(buf.data.len());
            buf.data.drain(..n);
        }
    }

    /// Keep only the newest `bytes` of a buffer.
    pub fn keep_last(&mut self, id: Id, bytes: u32) {
        if let Some(buf) = self.buffers.get_mut(&id) {
            let len = buf.data.len();
            if (bytes as usize) < len {
                buf.data.drain(..len - bytes as usize);
            }
        }
    }

    /// Write each CPU buffer's size into the corresponding scene buffer.
    pub(crate) fn sync_buffer_lengths(&self, scene: &mut SceneGraph) {
        for (&id, buf) in &self.buffers {
            if let Some(b) = scene.buffer_mut(id) {
                b.byte_length = buf.data.len() as u32;
            }
        }
    }
}

fn read_u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Append one wire record (header + payload) to `out`.
/// The inverse of `process_batch`'s per-record decode; used by producers and
/// tests.
pub fn encode_record(out: &mut Vec<u8>, op: u8, buffer_id: u32, offset: u32, payload: &[u8]) {
    out.push(op);
    out.extend_from_slice(&buffer_id.to_le_bytes());
    out.extend_from_slice(&offset.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
}
