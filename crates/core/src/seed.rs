//! Initial annotation seed loading
//!
//! At startup the host supplies an array of already-persisted annotations
//! (every record carries its host id), tagged by `type`. Records are decoded
//! one by one so a single bad entry never aborts the load: unknown types and
//! malformed records are reported and skipped.

use marginalia_bridge::{AnnotationId, HostBridge, WirePoint};
use serde::Deserialize;

use crate::annotation::{Color, NormSize};
use crate::store::AnnotationStore;

/// Statistics about one seed load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Records turned into resident annotations.
    pub loaded: usize,
    /// Records skipped (unknown type or undecodable).
    pub skipped: usize,
}

#[derive(Debug, Deserialize)]
struct SeedHighlight {
    id: AnnotationId,
    #[serde(rename = "collectionId")]
    collection_id: i64,
    page: u32,
    color: String,
    #[serde(rename = "startPosition")]
    start_position: WirePoint,
    #[serde(rename = "endPosition")]
    end_position: WirePoint,
}

#[derive(Debug, Deserialize)]
struct SeedStickyNote {
    id: AnnotationId,
    #[serde(rename = "ownerId")]
    owner_id: i64,
    #[serde(rename = "collectionId")]
    collection_id: i64,
    page: u32,
    color: String,
    position: WirePoint,
    content: Option<String>,
}

impl<B: HostBridge> AnnotationStore<B> {
    /// Load the host's startup seed into the store.
    ///
    /// Sticky notes receive fresh local ids as they are loaded, so the
    /// counter keeps advancing across seed records and later placements.
    /// Seeded highlights keep the signed `end - start` extent, so a seed
    /// that echoes back a previously created highlight reproduces the
    /// record exactly, drag direction included.
    pub fn load_seed(&mut self, records: &[serde_json::Value]) -> SeedReport {
        let mut report = SeedReport::default();

        for record in records {
            let kind = record.get("type").and_then(|value| value.as_str());
            match kind {
                Some("highlight") => match decode_highlight(record) {
                    Ok((seed, color)) => {
                        let start = seed.start_position.into();
                        self.insert_seed_highlight(
                            seed.id,
                            seed.collection_id,
                            seed.page,
                            start,
                            NormSize::between(start, seed.end_position.into()),
                            color,
                        );
                        report.loaded += 1;
                    }
                    Err(error) => {
                        tracing::error!(%error, "skipping undecodable highlight seed record");
                        report.skipped += 1;
                    }
                },
                Some("stickyNote") => match decode_sticky_note(record) {
                    Ok((seed, color)) => {
                        self.insert_seed_sticky_note(
                            seed.id,
                            seed.owner_id,
                            seed.collection_id,
                            seed.page,
                            seed.position.into(),
                            color,
                            seed.content,
                        );
                        report.loaded += 1;
                    }
                    Err(error) => {
                        tracing::error!(%error, "skipping undecodable sticky note seed record");
                        report.skipped += 1;
                    }
                },
                other => {
                    tracing::error!(kind = ?other, "unknown annotation type in seed, skipping");
                    report.skipped += 1;
                }
            }
        }

        tracing::debug!(loaded = report.loaded, skipped = report.skipped, "seed load finished");
        report
    }
}

fn decode_highlight(record: &serde_json::Value) -> Result<(SeedHighlight, Color), SeedDecodeError> {
    let seed: SeedHighlight = serde_json::from_value(record.clone())?;
    let color = Color::from_hex(&seed.color)?;
    Ok((seed, color))
}

fn decode_sticky_note(
    record: &serde_json::Value,
) -> Result<(SeedStickyNote, Color), SeedDecodeError> {
    let seed: SeedStickyNote = serde_json::from_value(record.clone())?;
    let color = Color::from_hex(&seed.color)?;
    Ok((seed, color))
}

#[derive(Debug, thiserror::Error)]
enum SeedDecodeError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Color(#[from] crate::annotation::ColorParseError),
}
