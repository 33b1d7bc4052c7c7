// Live metrics: derivation, per-container streaming and the fleet summary

pub mod derive;
pub mod stream;
pub mod summary;

pub use derive::{derive, round2};
pub use stream::{Sink, forward, snapshot, stream_one};
pub use summary::{SummaryAggregator, TOP_CONTAINERS_BY_MEMORY};
