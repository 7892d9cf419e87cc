use super::Record;

/// Writes [`Record`]s to an output destination.
pub trait Recorder {
    /// Writes a record immediately.
    ///
    /// The step of the record is taken from its [`STEP_KEY`](super::STEP_KEY)
    /// value if any, otherwise from the last [`Recorder::flush`].
    fn write(&mut self, record: Record);

    /// Keeps a record until the next [`Recorder::flush`].
    fn store(&mut self, record: Record);

    /// Writes values aggregated from the stored records at `step`.
    fn flush(&mut self, step: i64);
}
