use std::time::SystemTime;

use serde::Serialize;

use crate::SerialResult;

/// Per-result counters for the operations run on a channel.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResultStats {
    counts: [u64; SerialResult::ALL.len()],
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub last_error: Option<SerialResult>,
    pub last_error_at: Option<SystemTime>,
}

impl ResultStats {
    pub fn record(&mut self, result: SerialResult) {
        let slot = &mut self.counts[result.code() as usize];
        *slot = slot.saturating_add(1);

        if result.is_error() {
            self.last_error = Some(result);
            self.last_error_at = Some(SystemTime::now());
        }
    }

    pub fn record_read(&mut self, bytes: usize) {
        self.bytes_read = self.bytes_read.saturating_add(bytes as u64);
    }

    pub fn record_written(&mut self, bytes: usize) {
        self.bytes_written = self.bytes_written.saturating_add(bytes as u64);
    }

    pub fn count(&self, result: SerialResult) -> u64 {
        self.counts[result.code() as usize]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn error_count(&self) -> u64 {
        SerialResult::ALL
            .into_iter()
            .filter(|result| result.is_error())
            .map(|result| self.count(result))
            .sum()
    }

    /// Non-zero counters in code order.
    pub fn non_zero(&self) -> impl Iterator<Item = (SerialResult, u64)> + '_ {
        SerialResult::ALL
            .into_iter()
            .map(|result| (result, self.count(result)))
            .filter(|(_, count)| *count > 0)
    }
}

impl std::fmt::Display for ResultStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{} operations, {} errors, {} bytes read, {} bytes written",
            self.total(),
            self.error_count(),
            self.bytes_read,
            self.bytes_written
        )?;
        for (result, count) in self.non_zero() {
            writeln!(f, "  {:<26} {}", result.name(), count)?;
        }
        Ok(())
    }
}
