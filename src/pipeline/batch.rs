//! In-memory batch of pending log lines.
//!
//! Exactly one writer role at a time: the flush task appends formatted lines
//! between ticks and drains on each tick. Draining is an atomic
//! swap-and-clear (`mem::take`), never a lock held across I/O, so appends
//! resume immediately while the drained batch is being written.

/// Ordered buffer of formatted log lines awaiting a flush.
///
/// Insertion order is emission order and is preserved by
/// [`drain_batch`](Self::drain_batch).
#[derive(Debug, Default)]
pub struct BatchAccumulator {
    lines: Vec<String>,
}

impl BatchAccumulator {
    /// An empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a formatted line to the tail of the batch.
    pub fn append(&mut self, line: String) {
        self.lines.push(line);
    }

    /// Whether the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Take the current batch, leaving the accumulator empty.
    ///
    /// The returned lines are owned by the caller; a line is never both here
    /// and in the returned batch.
    pub fn drain_batch(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_returns_lines_in_append_order() {
        let mut acc = BatchAccumulator::new();
        for i in 0..10 {
            acc.append(format!("line-{i}\n"));
        }

        let batch = acc.drain_batch();
        assert_eq!(batch.len(), 10);
        for (i, line) in batch.iter().enumerate() {
            assert_eq!(line, &format!("line-{i}\n"));
        }
        assert!(acc.is_empty());
    }

    #[test]
    fn drains_are_disjoint_and_complete() {
        let mut acc = BatchAccumulator::new();
        acc.append("a\n".to_string());
        acc.append("b\n".to_string());
        let first = acc.drain_batch();

        acc.append("c\n".to_string());
        let second = acc.drain_batch();

        let all: Vec<_> = first.into_iter().chain(second).collect();
        assert_eq!(all, vec!["a\n", "b\n", "c\n"]);
        assert!(acc.drain_batch().is_empty());
    }
}
