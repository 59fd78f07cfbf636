//! Structured record extraction from a document scope.
//!
//! Split along the seams of the work:
//!
//! - [`fields`]: first-non-empty text/attribute lookups inside one parent
//! - [`rows`]: pairing the independently-counted title and date sequences
//! - [`pipeline`]: orchestration into a sequence of records with row-scoped
//!   failure isolation

pub mod fields;
pub mod pipeline;
pub mod rows;
