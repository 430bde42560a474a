//! quickadd-core: message types, the dedup watermark, and the seams to the host app

pub mod dedup;
pub mod gateway;
pub mod message;
pub mod store;
pub mod time;

pub use dedup::{DedupClaim, DedupTracker, NOTHING_ACCEPTED};
pub use gateway::{
    ActionGateway, FailureKind, FallbackOutcome, NotificationPayload, PresentOutcome,
    QuickAddRequest,
};
pub use message::{Amount, CandidateEvent, Folder, InvalidAmount, RawMessage};
pub use store::{MessageStore, StoreError, recent_messages};

#[cfg(any(test, feature = "testing"))]
pub use gateway::MockActionGateway;
#[cfg(any(test, feature = "testing"))]
pub use store::MockMessageStore;
