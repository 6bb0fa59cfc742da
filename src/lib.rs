//! locpage - location landing pages for a women's health practice
//!
//! Research about a locality is turned into templated page copy, scored
//! and optimized for local search, checked by a quality assurance run and
//! written out as Next.js data and page files plus a sitemap and registry.

pub mod config;
pub mod content;
pub mod lexicon;
pub mod location;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod quality;
pub mod research;
pub mod seo;
pub mod ui;
pub mod validation;
