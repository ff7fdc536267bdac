//! Coordinator domain logic for the Spindle disc-ripping and transcoding
//! orchestrator: the durable store abstraction, the job queue and
//! assignment engine, agent/worker lifecycle management, the disc preview
//! pipeline, season continuation, the organizer, and the metadata/
//! notification sink traits.

pub mod error;
pub mod managers;
pub mod metadata;
pub mod notify;
pub mod organizer;
pub mod preview;
pub mod queue;
pub mod season;
pub mod store;

pub use error::{AssignmentError, PreviewError, StoreError};
pub use managers::{AgentManager, WorkerManager};
pub use metadata::{MovieMetadataProvider, NullMovieProvider, NullTvProvider, TvMetadataProvider};
pub use notify::{NotificationSink, NullSink};
pub use preview::{PreviewConfig, PreviewPipeline};
pub use queue::{AssignmentFilter, JobQueue};
pub use store::Store;
