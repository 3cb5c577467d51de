//! Date range partitioning.
//!
//! Splits an ordered sequence of units (days or fire instants) into contiguous chunks,
//! one chunk per command.
//!
//! - chunk count = `min(N, P)` (`P <= 0` is treated as 1)
//! - the first `N % count` chunks get one extra unit
//! - chunks consume units in order: no gaps, no overlaps

use std::fmt;

/// One contiguous chunk of the unit series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePartition<T> {
    pub index: usize,
    pub start_boundary: T,
    pub end_boundary: T,
    /// Every unit in the chunk, `start_boundary..=end_boundary`.
    pub members: Vec<T>,
}

impl<T> DatePartition<T> {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl<T: fmt::Display> fmt::Display for DatePartition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.start_boundary, self.end_boundary)
    }
}

/// Number of chunks `partition` produces for `len` units.
pub fn effective_count(len: usize, parallelism: i32) -> usize {
    let parallelism = usize::try_from(parallelism.max(1)).unwrap_or(1);
    len.min(parallelism)
}

/// Split `dates` into `effective_count(dates.len(), parallelism)` ordered chunks.
pub fn partition<T: Clone>(dates: &[T], parallelism: i32) -> Vec<DatePartition<T>> {
    let count = effective_count(dates.len(), parallelism);
    if count == 0 {
        return Vec::new();
    }

    let base = dates.len() / count;
    let remainder = dates.len() % count;

    let mut partitions = Vec::with_capacity(count);
    let mut cursor = 0;
    for index in 0..count {
        let size = if index < remainder { base + 1 } else { base };
        let chunk = &dates[cursor..cursor + size];
        cursor += size;
        // size >= 1 because count <= len
        let (Some(first), Some(last)) = (chunk.first(), chunk.last()) else {
            continue;
        };
        partitions.push(DatePartition {
            index,
            start_boundary: first.clone(),
            end_boundary: last.clone(),
            members: chunk.to_vec(),
        });
    }
    partitions
}
