//! Aggregation of stored records.
use super::{Record, RecordValue};
use std::collections::HashSet;
use xxhash_rust::xxh3::Xxh3Builder;

/// Stores records between two flushes and aggregates them.
///
/// Scalars stored more than once under a key are summarized as
/// `{key}_min`, `{key}_max`, `{key}_mean` and `{key}_median`; a single scalar
/// is passed through. For other value types the latest value wins.
#[derive(Default)]
pub struct RecordStorage {
    data: Vec<Record>,
}

fn min(vs: &[f32]) -> f32 {
    vs.iter().copied().fold(f32::INFINITY, f32::min)
}

fn max(vs: &[f32]) -> f32 {
    vs.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

fn mean(vs: &[f32]) -> f32 {
    vs.iter().sum::<f32>() / vs.len() as f32
}

fn median(mut vs: Vec<f32>) -> f32 {
    vs.sort_by(|x, y| x.total_cmp(y));
    vs[vs.len() / 2]
}

impl RecordStorage {
    /// Creates an empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a record.
    pub fn store(&mut self, record: Record) {
        self.data.push(record);
    }

    /// `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn keys(&self) -> HashSet<String, Xxh3Builder> {
        let mut keys = HashSet::<String, Xxh3Builder>::default();
        for record in self.data.iter() {
            keys.extend(record.keys().cloned());
        }
        keys
    }

    fn aggregate_key(&self, key: &str, record: &mut Record) {
        let mut scalars = vec![];
        let mut latest = None;
        for value in self.data.iter().filter_map(|r| r.get(key)) {
            match value {
                RecordValue::Scalar(v) => scalars.push(*v),
                v => latest = Some(v.clone()),
            }
        }

        if let Some(v) = latest {
            record.insert(key, v);
        } else if scalars.len() == 1 {
            record.insert(key, RecordValue::Scalar(scalars[0]));
        } else if !scalars.is_empty() {
            record.insert(format!("{}_min", key), RecordValue::Scalar(min(&scalars)));
            record.insert(format!("{}_max", key), RecordValue::Scalar(max(&scalars)));
            record.insert(format!("{}_mean", key), RecordValue::Scalar(mean(&scalars)));
            record.insert(format!("{}_median", key), RecordValue::Scalar(median(scalars)));
        }
    }

    /// Aggregates the stored records and clears the storage.
    pub fn aggregate(&mut self) -> Record {
        let mut record = Record::empty();
        for key in self.keys().iter() {
            self.aggregate_key(key, &mut record);
        }
        self.data.clear();
        record
    }
}
