//! Retail order normalizer
//!
//! Reads a denormalized, tab-separated order export and rebuilds it as a
//! small relational schema in SQLite:
//!
//! ```text
//! Region <- Country <- Customer -.
//!                                 +-> OrderDetail
//! ProductCategory <- Product ----'
//! ```
//!
//! Tables are built one at a time in dependency order by [`Pipeline`]; each
//! step rescans the source file and resolves natural keys to the IDs
//! assigned by earlier steps. [`ReportQuery`] holds the fixed analytical
//! queries that run over the result.

pub mod builder;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod query;
pub mod resolver;
pub mod schema;
pub mod source;
pub mod storage;

pub use builder::{Pipeline, PipelineReport, TableReport, TableStep};
pub use config::{MalformedRowPolicy, NormalizerConfig};
pub use error::{Error, Result};
pub use query::{Query, ReportQuery};
pub use storage::{ResultSet, Storage};

/// Build every table of `config` from scratch.
pub fn normalize(config: NormalizerConfig) -> Result<PipelineReport> {
    Pipeline::new(config)?.run()
}
