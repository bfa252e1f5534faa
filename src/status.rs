//! Point-in-time status shared between the vision thread and request handlers.

use crate::emotion::Mood;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Read view of the tracked subject
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusSnapshot {
    /// A usable face region was found on the most recent analyzed frame
    pub present: bool,
    /// Stabilized mood from the majority smoother
    pub emotion: Mood,
    /// Confidence of the latest classified frame
    pub confidence: f32,
    /// Latest embedding the classifier produced; kept while later frames have none
    pub embedding: Option<Arc<[f32]>>,
    /// Last wall-clock second at which `present` was true
    pub last_seen_epoch_seconds: i64,
}

/// One analyzed frame's contribution to the snapshot
#[derive(Debug, Clone, Default)]
pub struct FrameObservation {
    pub present: bool,
    pub emotion: Mood,
    /// `None` when the frame was not classified
    pub confidence: Option<f32>,
    pub embedding: Option<Vec<f32>>,
}

/// Wire form of `GET /status`
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub present: bool,
    pub emotion: Mood,
    pub emotion_conf: f32,
    pub embedding: String,
    pub last_seen_ts: i64,
}

impl From<&StatusSnapshot> for StatusResponse {
    fn from(snapshot: &StatusSnapshot) -> Self {
        Self {
            present: snapshot.present,
            emotion: snapshot.emotion,
            emotion_conf: snapshot.confidence,
            embedding: snapshot.embedding.as_deref().map(encode_embedding).unwrap_or_default(),
            last_seen_ts: snapshot.last_seen_epoch_seconds,
        }
    }
}

/// Base64 of the little-endian f32 bytes
#[must_use]
pub fn encode_embedding(embedding: &[f32]) -> String {
    let bytes: Vec<u8> = embedding.iter().flat_map(|v| v.to_le_bytes()).collect();
    STANDARD.encode(bytes)
}

/// Inverse of [`encode_embedding`]; `None` on bad base64 or a ragged length
#[must_use]
pub fn decode_embedding(encoded: &str) -> Option<Vec<f32>> {
    let bytes = STANDARD.decode(encoded).ok()?;
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

/// Current wall-clock time in whole seconds since the epoch
#[must_use]
pub fn epoch_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Mutex-guarded snapshot; every write replaces it as a unit
#[derive(Debug, Clone, Default)]
pub struct SharedStatus {
    inner: Arc<Mutex<StatusSnapshot>>,
}

impl SharedStatus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current snapshot
    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        self.inner.lock().clone()
    }

    /// Fold one analyzed frame into the snapshot, stamping presence at `now_epoch`
    pub fn publish(&self, observation: FrameObservation, now_epoch: i64) {
        let embedding: Option<Arc<[f32]>> = observation.embedding.map(Into::into);

        let mut snapshot = self.inner.lock();
        snapshot.present = observation.present;
        snapshot.emotion = observation.emotion;
        if let Some(confidence) = observation.confidence {
            snapshot.confidence = confidence;
        }
        if embedding.is_some() {
            snapshot.embedding = embedding;
        }
        if observation.present {
            snapshot.last_seen_epoch_seconds = now_epoch;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_roundtrip_bit_exact() {
        let original = vec![0.0f32, -0.0, 1.5, f32::MIN_POSITIVE, f32::MAX, -3.25e-7];
        let decoded = decode_embedding(&encode_embedding(&original)).unwrap();
        let original_bits: Vec<u32> = original.iter().map(|v| v.to_bits()).collect();
        let decoded_bits: Vec<u32> = decoded.iter().map(|v| v.to_bits()).collect();
        assert_eq!(original_bits, decoded_bits);
    }

    #[test]
    fn test_embedding_little_endian() {
        assert_eq!(encode_embedding(&[1.0]), STANDARD.encode([0x00, 0x00, 0x80, 0x3f]));
        assert_eq!(decode_embedding("AAE="), None);
    }

    #[test]
    fn test_publish_keeps_stale_embedding() {
        let status = SharedStatus::new();
        status.publish(
            FrameObservation {
                present: true,
                emotion: Mood::Happy,
                confidence: Some(0.9),
                embedding: Some(vec![0.5, 0.25]),
            },
            100,
        );
        status.publish(
            FrameObservation {
                present: false,
                emotion: Mood::Happy,
                confidence: None,
                embedding: None,
            },
            160,
        );

        let snapshot = status.snapshot();
        assert!(!snapshot.present);
        assert_eq!(snapshot.confidence, 0.9);
        assert_eq!(snapshot.embedding.as_deref(), Some(&[0.5f32, 0.25][..]));
        assert_eq!(snapshot.last_seen_epoch_seconds, 100);
    }

    #[test]
    fn test_response_without_embedding() {
        let response = StatusResponse::from(&StatusSnapshot::default());
        assert_eq!(response.embedding, "");
        assert_eq!(response.emotion, Mood::Neutral);
    }
}
