//! Output generation for the extracted record sequences.
//!
//! - [`rss`]: renders a record sequence as an RSS 2.0 document and writes
//!   one feed file per site.

pub mod rss;
