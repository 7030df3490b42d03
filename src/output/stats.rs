//! Statistics collected during normalization.

use crate::assets::AssetReport;
use crate::resolve::ResolveReport;
use serde::{Deserialize, Serialize};

/// Counters for one normalized document, or a batch of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeStats {
    /// Documents processed
    pub document_count: usize,

    /// Elements in the element map
    pub element_count: usize,

    /// Entries in the reading-order sequence
    pub sequence_length: usize,

    /// Number of pages
    pub page_count: usize,

    /// Number of headings in the sequence
    pub heading_count: usize,

    /// Number of tables in the sequence
    pub table_count: usize,

    /// Number of pictures in the sequence
    pub picture_count: usize,

    /// Number of furniture elements in the map
    pub furniture_count: usize,

    /// Reference markers discovered
    pub markers_found: usize,

    /// Markers substituted by a snapshot
    pub resolved_count: usize,

    /// Markers left unresolved
    pub unresolved_count: usize,

    /// Markers left in place to break a cycle
    pub cycles_broken: usize,

    /// Resolution passes performed
    pub passes: usize,

    /// Asset files written
    pub assets_written: usize,

    /// Payloads replaced by an existing asset
    pub assets_reused: usize,

    /// Payloads left inline after a failure
    pub assets_failed: usize,

    /// Documents whose sequence came from the page fallback
    pub fallback_count: usize,
}

impl NormalizeStats {
    /// Create new empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment heading count.
    pub fn add_heading(&mut self) {
        self.heading_count += 1;
    }

    /// Increment table count.
    pub fn add_table(&mut self) {
        self.table_count += 1;
    }

    /// Increment picture count.
    pub fn add_picture(&mut self) {
        self.picture_count += 1;
    }

    /// Copy the resolver's counters.
    pub fn record_resolution(&mut self, report: &ResolveReport) {
        self.markers_found += report.markers_found;
        self.resolved_count += report.substitutions;
        self.unresolved_count += report.unresolved();
        self.cycles_broken += report.cycles_broken;
        self.passes = self.passes.max(report.passes);
    }

    /// Copy the externalizer's counters.
    pub fn record_assets(&mut self, report: &AssetReport) {
        self.assets_written += report.written.len();
        self.assets_reused += report.reused;
        self.assets_failed += report.failed;
    }

    /// Merge another stats instance into this one.
    pub fn merge(&mut self, other: &NormalizeStats) {
        self.document_count += other.document_count;
        self.element_count += other.element_count;
        self.sequence_length += other.sequence_length;
        self.page_count += other.page_count;
        self.heading_count += other.heading_count;
        self.table_count += other.table_count;
        self.picture_count += other.picture_count;
        self.furniture_count += other.furniture_count;
        self.markers_found += other.markers_found;
        self.resolved_count += other.resolved_count;
        self.unresolved_count += other.unresolved_count;
        self.cycles_broken += other.cycles_broken;
        self.passes = self.passes.max(other.passes);
        self.assets_written += other.assets_written;
        self.assets_reused += other.assets_reused;
        self.assets_failed += other.assets_failed;
        self.fallback_count += other.fallback_count;
    }
}
