//! Per-epoch timing and traffic figures.

use std::time::{Duration, Instant};

use derive_getters::Getters;

/// What one completed epoch cost a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Getters)]
pub struct EpochMetrics {
    /// The epoch number these figures belong to.
    epoch: u64,
    /// Encoded size of every request the node handled during the epoch.
    bytes_received: u64,
    /// From `StartEpoch` until the polynomial was reconstructed.
    reconstruction: Duration,
    /// From reconstruction until the zero-sharing verified.
    proactivization: Duration,
    /// From the zero-sharing check until the new shares verified.
    redistribution: Duration,
    /// The whole epoch.
    total: Duration,
}

/// Collects timestamps while an epoch runs.
#[derive(Debug, Default)]
pub(crate) struct MetricsRecorder {
    started: Option<Instant>,
    reconstructed: Option<Instant>,
    proactivized: Option<Instant>,
    bytes_received: u64,
}

impl MetricsRecorder {
    pub(crate) fn start(&mut self) {
        *self = Self {
            started: Some(Instant::now()),
            // Phase 1 shares can arrive before StartEpoch does.
            bytes_received: self.bytes_received,
            ..Self::default()
        };
    }

    pub(crate) fn received(&mut self, bytes: usize) {
        self.bytes_received = self.bytes_received.saturating_add(bytes as u64);
    }

    pub(crate) fn reconstructed(&mut self) {
        self.reconstructed = Some(Instant::now());
    }

    pub(crate) fn proactivized(&mut self) {
        self.proactivized = Some(Instant::now());
    }

    /// Closes the epoch and resets the recorder.
    pub(crate) fn finish(&mut self, epoch: u64) -> EpochMetrics {
        let now = Instant::now();
        let started = self.started.unwrap_or(now);
        let reconstructed = self.reconstructed.unwrap_or(started);
        let proactivized = self.proactivized.unwrap_or(reconstructed);
        let metrics = EpochMetrics {
            epoch,
            bytes_received: self.bytes_received,
            reconstruction: reconstructed.saturating_duration_since(started),
            proactivization: proactivized.saturating_duration_since(reconstructed),
            redistribution: now.saturating_duration_since(proactivized),
            total: now.saturating_duration_since(started),
        };
        *self = Self::default();
        metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_add_up_to_total() {
        let mut recorder = MetricsRecorder::default();
        recorder.received(10);
        recorder.start();
        recorder.received(5);
        recorder.reconstructed();
        recorder.proactivized();
        let metrics = recorder.finish(1);
        assert_eq!(*metrics.bytes_received(), 15);
        assert_eq!(*metrics.epoch(), 1);
        assert_eq!(
            *metrics.reconstruction() + *metrics.proactivization() + *metrics.redistribution(),
            *metrics.total()
        );
        assert_eq!(recorder.finish(2).bytes_received, 0);
    }
}
