use thiserror::Error;

use crate::model::{Answer, DecodedFlip, FlipHash, ValidationStage};

/// One entry of a readiness poll, in node order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessRecord {
    pub hash: FlipHash,
    pub ready: bool,
}

impl ReadinessRecord {
    #[must_use]
    pub fn new(hash: FlipHash, ready: bool) -> Self {
        Self { hash, ready }
    }
}

/// A single position of a completed poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotEntry {
    pub hash: FlipHash,
    pub ready: bool,
    pub flip: Option<DecodedFlip>,
}

/// Everything one poll-fetch-decode cycle learned, in poller order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollSnapshot {
    entries: Vec<SnapshotEntry>,
}

impl PollSnapshot {
    #[must_use]
    pub fn new(entries: Vec<SnapshotEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of positions that carry a decoded flip.
    #[must_use]
    pub fn decoded_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.flip.is_some()).count()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MergeRejected {
    #[error("poll returned no flips")]
    Empty,

    #[error("poll returned {got} flips but the session already holds {established}")]
    Shrunk { established: usize, got: usize },
}

/// All facets of one flip position, replaced together.
#[derive(Debug, Clone, PartialEq)]
pub struct FlipItem {
    hash: FlipHash,
    flip: Option<DecodedFlip>,
    ready: bool,
    answer: Answer,
}

impl FlipItem {
    #[must_use]
    pub fn hash(&self) -> &FlipHash {
        &self.hash
    }

    /// Decoded content, `None` until the payload has been fetched and decoded.
    #[must_use]
    pub fn flip(&self) -> Option<&DecodedFlip> {
        self.flip.as_ref()
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    #[must_use]
    pub fn answer(&self) -> Answer {
        self.answer
    }
}

/// In-memory state of one validation stage.
///
/// Positions are defined by the first successful poll and never shrink. Poll results
/// replace hashes, content and readiness; answers and the cursor change only through
/// the user-facing mutators.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationSession {
    stage: ValidationStage,
    items: Vec<FlipItem>,
    current: usize,
    fully_loaded: bool,
}

impl ValidationSession {
    #[must_use]
    pub fn new(stage: ValidationStage) -> Self {
        Self {
            stage,
            items: Vec::new(),
            current: 0,
            fully_loaded: false,
        }
    }

    /// Build the state that results from applying a poll cycle to this one.
    ///
    /// Answers stay where they are when the hash order is unchanged; otherwise they
    /// follow their hash. A flip already decoded for a hash is kept when the fresh
    /// cycle could not fetch it again.
    ///
    /// # Errors
    ///
    /// Returns `MergeRejected::Empty` for an empty snapshot and
    /// `MergeRejected::Shrunk` when it would drop established positions.
    pub fn merged(&self, snapshot: PollSnapshot) -> Result<Self, MergeRejected> {
        if snapshot.is_empty() {
            return Err(MergeRejected::Empty);
        }
        let established = self.items.len();
        if snapshot.len() < established {
            return Err(MergeRejected::Shrunk {
                established,
                got: snapshot.len(),
            });
        }

        let same_positions = established == snapshot.len()
            && self
                .items
                .iter()
                .zip(snapshot.entries())
                .all(|(item, entry)| item.hash == entry.hash);

        let items: Vec<FlipItem> = snapshot
            .entries
            .into_iter()
            .enumerate()
            .map(|(position, entry)| {
                let previous = if same_positions {
                    self.items.get(position)
                } else {
                    self.items.iter().find(|item| item.hash == entry.hash)
                };
                let answer = previous.map_or(Answer::Unanswered, |item| item.answer);
                let flip = entry
                    .flip
                    .or_else(|| previous.and_then(|item| item.flip.clone()));
                FlipItem {
                    hash: entry.hash,
                    flip,
                    ready: entry.ready,
                    answer,
                }
            })
            .collect();

        let fully_loaded = items.iter().all(|item| item.ready);
        let current = self.current.min(items.len() - 1);

        Ok(Self {
            stage: self.stage,
            items,
            current,
            fully_loaded,
        })
    }

    #[must_use]
    pub fn stage(&self) -> ValidationStage {
        self.stage
    }

    #[must_use]
    pub fn items(&self) -> &[FlipItem] {
        &self.items
    }

    #[must_use]
    pub fn item(&self, position: usize) -> Option<&FlipItem> {
        self.items.get(position)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_item(&self) -> Option<&FlipItem> {
        self.items.get(self.current)
    }

    /// True once every position has reported ready.
    #[must_use]
    pub fn is_fully_loaded(&self) -> bool {
        self.fully_loaded
    }

    #[must_use]
    pub fn hashes(&self) -> Vec<&FlipHash> {
        self.items.iter().map(|item| &item.hash).collect()
    }

    #[must_use]
    pub fn answers(&self) -> Vec<Answer> {
        self.items.iter().map(|item| item.answer).collect()
    }

    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.answer.is_answered())
            .count()
    }

    /// Submission is possible once at least one flip exists and every flip is answered.
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|item| item.answer.is_answered())
    }

    fn last_index(&self) -> usize {
        self.items.len().saturating_sub(1)
    }

    pub fn prev(&mut self) {
        self.current = self.current.saturating_sub(1);
    }

    pub fn next(&mut self) {
        self.current = (self.current + 1).min(self.last_index());
    }

    /// Jump to `position`, clamped to the last flip.
    pub fn pick(&mut self, position: usize) {
        self.current = position.min(self.last_index());
    }

    /// Record `answer` for the flip under the cursor.
    pub fn answer(&mut self, answer: Answer) {
        if let Some(item) = self.items.get_mut(self.current) {
            item.answer = answer;
        }
    }

    /// Mark the flip under the cursor as inappropriate and move on.
    pub fn report_inappropriate(&mut self) {
        self.answer(Answer::Inappropriate);
        self.next();
    }
}
