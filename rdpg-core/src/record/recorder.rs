use super::Record;

/// Writes a record to an output destination with [`Recorder::write`].
///
/// Recorders are write-only and best-effort: a failure to write must not stop
/// training, so the method does not return a `Result`.
pub trait Recorder {
    /// Write a record to the [`Recorder`].
    fn write(&mut self, record: Record);
}
