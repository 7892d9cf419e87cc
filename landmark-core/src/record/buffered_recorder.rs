use super::{Record, RecordStorage, RecordValue, Recorder, STEP_KEY};

/// Keeps written records in memory.
///
/// Flushed aggregates are kept as records with the step under
/// [`STEP_KEY`]. Mostly used in tests and for inspecting evaluation runs.
#[derive(Default)]
pub struct BufferedRecorder {
    buf: Vec<Record>,
    storage: RecordStorage,
}

impl BufferedRecorder {
    /// Constructs the recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an iterator over the written records.
    pub fn iter(&self) -> std::slice::Iter<Record> {
        self.buf.iter()
    }

    /// Returns the latest written scalar of the given key.
    pub fn last_scalar(&self, key: &str) -> Option<f32> {
        self.buf
            .iter()
            .rev()
            .find_map(|record| record.get_scalar(key).ok())
    }
}

impl Recorder for BufferedRecorder {
    fn write(&mut self, record: Record) {
        self.buf.push(record);
    }

    fn store(&mut self, record: Record) {
        self.storage.store(record);
    }

    fn flush(&mut self, step: i64) {
        let mut record = self.storage.aggregate();
        record.insert(STEP_KEY, RecordValue::Scalar(step as f32));
        self.buf.push(record);
    }
}
