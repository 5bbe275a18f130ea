//! Helpers around the external training program: scheduling long runs,
//! profiling its kernels, preparing samples and visualising trained filters.

pub mod heatmap;
pub mod profiler;
pub mod samples;
pub mod scheduler;

pub use heatmap::{render_weights, visualize_layer, GridLayout};
pub use profiler::{parse_kernel_timings, KernelTiming, ProfileReport};
pub use samples::{SampleBatch, SampleGenerator, SamplePair};
pub use scheduler::{IterationPlan, ProcessRunner, SystemRunner, TrainingCommand, TrainingScheduler};
