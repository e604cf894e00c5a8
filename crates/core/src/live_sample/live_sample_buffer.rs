use log::{debug, warn};
use std::sync::{Arc, RwLock};

use super::live_sample_model::{parse_sample_payload, LiveSample};
use crate::errors::Result;
use crate::events::{DomainEvent, DomainEventSink};

/// Holds the latest unsaved weight triple pushed by the plate.
///
/// The triple is replaced as a whole under one lock, so readers never see a
/// mix of two samples.
pub struct LiveSampleBuffer {
    current: RwLock<LiveSample>,
    event_sink: Arc<dyn DomainEventSink>,
}

impl LiveSampleBuffer {
    pub fn new(event_sink: Arc<dyn DomainEventSink>) -> Self {
        Self {
            current: RwLock::new(LiveSample::default()),
            event_sink,
        }
    }

    /// Overwrite all three weights.
    pub fn apply_sample(&self, protein: f64, carbohydrate: f64, vegetable: f64) {
        self.store(LiveSample::new(protein, carbohydrate, vegetable));
    }

    /// Decode a raw telemetry payload and apply it. A malformed payload
    /// leaves the buffer untouched.
    pub fn apply_payload(&self, payload: &[u8]) -> Result<LiveSample> {
        match parse_sample_payload(payload) {
            Ok(sample) => {
                self.store(sample);
                Ok(sample)
            }
            Err(e) => {
                warn!("Rejected plate payload: {}", e);
                self.event_sink
                    .emit(DomainEvent::payload_rejected(e.to_string()));
                Err(e)
            }
        }
    }

    /// Latest triple, (0, 0, 0) before the first sample.
    pub fn current(&self) -> LiveSample {
        match self.current.read() {
            Ok(sample) => *sample,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// Reset to (0, 0, 0).
    pub fn clear(&self) {
        self.store(LiveSample::default());
    }

    fn store(&self, sample: LiveSample) {
        match self.current.write() {
            Ok(mut current) => *current = sample,
            Err(poisoned) => *poisoned.into_inner() = sample,
        }
        debug!("Live sample updated: {:?}", sample);
        self.event_sink
            .emit(DomainEvent::LiveSampleUpdated { sample });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::events::MockDomainEventSink;

    fn buffer() -> (LiveSampleBuffer, MockDomainEventSink) {
        let sink = MockDomainEventSink::new();
        (LiveSampleBuffer::new(Arc::new(sink.clone())), sink)
    }

    #[test]
    fn test_defaults_to_zero() {
        let (buffer, _) = buffer();
        assert_eq!(buffer.current(), LiveSample::new(0.0, 0.0, 0.0));
        assert!(buffer.current().is_empty());
    }

    #[test]
    fn test_apply_sample_overwrites_all_fields() {
        let (buffer, sink) = buffer();
        buffer.apply_sample(1.0, 2.0, 3.0);
        assert_eq!(buffer.current(), LiveSample::new(1.0, 2.0, 3.0));

        buffer.apply_sample(4.0, 5.0, 6.0);
        assert_eq!(buffer.current(), LiveSample::new(4.0, 5.0, 6.0));
        assert_eq!(sink.len(), 2);
    }

    #[test]
    fn test_malformed_payload_leaves_buffer_unchanged() {
        let (buffer, sink) = buffer();
        buffer.apply_sample(1.0, 2.0, 3.0);

        let err = buffer
            .apply_payload(br#"{"pesoProteina": 9, "pesoCarbohidrato": 9}"#)
            .unwrap_err();

        assert!(matches!(err, Error::Parse(_)));
        assert_eq!(buffer.current(), LiveSample::new(1.0, 2.0, 3.0));
        assert!(sink.events().last().unwrap().is_failure());
    }

    #[test]
    fn test_valid_payload_is_applied() {
        let (buffer, _) = buffer();
        let applied = buffer
            .apply_payload(br#"{"pesoProteina": 50, "pesoCarbohidrato": 80, "pesoVegetal": 30}"#)
            .unwrap();
        assert_eq!(applied, LiveSample::new(50.0, 80.0, 30.0));
        assert_eq!(buffer.current(), applied);
    }

    #[test]
    fn test_clear_resets_to_zero() {
        let (buffer, _) = buffer();
        buffer.apply_sample(1.0, 2.0, 3.0);
        buffer.clear();
        assert!(buffer.current().is_empty());
    }

    #[test]
    fn test_concurrent_readers_never_see_partial_triples() {
        let (buffer, _) = buffer();
        let buffer = Arc::new(buffer);

        let writer = {
            let buffer = buffer.clone();
            std::thread::spawn(move || {
                for i in 0..2_000 {
                    let v = i as f64;
                    buffer.apply_sample(v, v, v);
                }
            })
        };

        for _ in 0..2_000 {
            let s = buffer.current();
            assert_eq!(s.protein, s.carbohydrate);
            assert_eq!(s.carbohydrate, s.vegetable);
        }
        writer.join().unwrap();
    }
}
