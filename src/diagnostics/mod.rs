//! Diagnostics data model returned by the detector and written by the tools.
//!
//! `DetectionReport` bundles the detection result, a serializable summary
//! and a `PipelineTrace` describing every stage that ran: how many regions
//! each selector scanned, which candidates were passed over and why, the
//! fallback density, the refinement outcome and the fragment counts.

mod pipeline;
mod stages;
mod timing;

pub use pipeline::{DetectionReport, InputDescriptor, PipelineTrace};
pub use stages::{
    CandidateSample, CandidateVerdict, FallbackStage, PrimaryStage, RefineStage,
    SegmentationStage,
};
pub use timing::{elapsed_ms, StageTiming, TimingBreakdown};
