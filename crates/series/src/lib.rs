//! Series orchestration: single-flight cache-or-fetch over parsed bulletins,
//! parameter selection, and response shaping.

pub mod compact;
pub mod fingerprint;
pub mod queue;
pub mod service;
pub mod store;

pub use compact::{compact_series, CompactItem};
pub use fingerprint::fingerprint;
pub use queue::{QueueRegistry, SeqQueue};
pub use service::{SeriesData, SeriesResponse, SeriesService};
pub use store::MemoryStore;
