//! Settings documents and the merge engine that combines them.

pub mod merge;

pub use merge::{FieldAction, MergeAction, MergeOutcome, merge};
