//! Parallel Mean Shift clustering.
//!
//! Every point is shifted towards the kernel-weighted mean of its bandwidth
//! window until it settles on a mode; points whose modes fall within the merge
//! tolerance of each other share a cluster. The shift runs either on a rayon
//! thread pool or on actix actors, and both give identical results.

pub use actors::ActorScheduler;
pub use aggregate::{aggregate, CenterPolicy};
pub use bandwidth::{estimate_bandwidth, BandwidthEstimator, MIN_BANDWIDTH};
pub use distance::{DistanceMeasure, Kernel};
pub use error::{ClusterError, Result};
pub use mean_shift::{meanshift_algorithm, Clustering, MeanShift};
pub use mode::{seek_mode, Mode, ShiftSettings};
pub use parallel::{resolve_workers, run, Scheduler, ThreadPoolScheduler};
pub use points::PointSet;

mod actors;
mod aggregate;
mod bandwidth;
mod distance;
mod error;
mod mean_shift;
mod mode;
mod parallel;
mod points;
