// Domain models: runtime records, usage samples and summary output

mod container;
mod image;
mod metrics;
mod summary;
mod volume;

pub use container::{ContainerRecord, HostConfig, Mount, PortBinding, RUNNING_STATE};
pub use image::ImageRecord;
pub use metrics::{DerivedMetrics, RawUsageSample};
pub use summary::{ContainerMemoryEntry, ContainerMetricsEntry, FleetSummary};
pub use volume::VolumeRecord;
