pub mod processor;

pub use processor::{
    encode_record, IngestProcessor, IngestResult, DEFAULT_MAX_BYTES, HEADER_SIZE, OP_APPEND,
    OP_UPDATE_RANGE,
};
