//! Wire DTOs for the coordinator's HTTP API and the ripping/
//! transcoding tool line protocols the agent runtime consumes.

pub mod agents;
pub mod discs;
pub mod jobs;
pub mod subprocess;
pub mod vlc;
