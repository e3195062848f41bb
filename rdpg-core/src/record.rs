//! Types for recording training metrics.
//!
//! * [`Record`] - key-value pairs of values of various types
//! * [`Recorder`] - a write-only sink of [`Record`]s, such as a TensorBoard writer
//! * [`Aggregator`] - accumulates named scalars between two reports
//!
//! ```rust
//! use rdpg_core::record::{Aggregator, Record, RecordValue};
//!
//! let mut agg = Aggregator::default();
//! agg.add("value_loss", 0.5, 1);
//! agg.add("value_loss", 1.5, 1);
//!
//! let mut record = Record::from_scalar("env_steps", 100.0);
//! record.insert("train/value_loss", RecordValue::Scalar(agg.mean("value_loss") as f32));
//! assert_eq!(record.get_scalar("train/value_loss").unwrap(), 1.0);
//! ```
mod aggregator;
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;

pub use aggregator::{AggregateMethod, Aggregator};
pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
