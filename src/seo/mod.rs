//! SEO analysis and optimization.
//!
//! - [`keywords`]: keyword density and LSI coverage
//! - [`meta`]: title and meta description limits
//! - [`readability`]: Flesch Reading Ease
//! - [`links`]: internal and external link counting
//! - [`schema`]: JSON-LD generation and validation
//! - [`scorer`]: basic and advanced page scoring
//! - [`optimizer`]: the bounded optimization loop

pub mod keywords;
pub mod links;
pub mod meta;
pub mod optimizer;
pub mod readability;
pub mod schema;
pub mod scorer;

pub use keywords::{KeywordAnalyzer, KeywordDensityReport, KeywordStat, LsiCoverage};
pub use links::{LinkAnalyzer, LinkReport};
pub use meta::{MetaLimits, MetaTagOptimizer, MetaValidation};
pub use optimizer::{ContentOptimizer, IterationRecord, OptimizationOutcome, StopReason};
pub use readability::{flesch_reading_ease, ReadabilityBand, ReadabilityReport};
pub use schema::{build_location_schema, SchemaValidation, SchemaValidator};
pub use scorer::{
    Recommendation, ScoringMode, SeoCategory, SeoMetrics, SeoOptimizationResult, SeoScorer,
    Severity,
};
