mod answer;
mod flip;
mod ids;
mod session;
mod stage;

pub use answer::{Answer, WIRE_NONE};
pub use flip::{DecodedFlip, FlipOrder};
pub use ids::FlipHash;
pub use session::{
    FlipItem, MergeRejected, PollSnapshot, ReadinessRecord, SnapshotEntry, ValidationSession,
};
pub use stage::{ParseStageError, ValidationStage};
