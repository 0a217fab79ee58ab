//! The normalized bibliographic record every adapter produces and the
//! orchestrator operates on.

mod paper;

pub use paper::{
    AccessType, Author, Paper, ReliabilityLevel, ReliabilityScore, SourceType,
};
