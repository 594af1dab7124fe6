//! File output for result series and run summaries.

pub mod export;
