//! Table detection from text positions.
//!
//! Works like a stream-mode detector: no ruling lines are consulted. Spans
//! are grouped into rows by baseline, left edges that recur across rows
//! become column boundaries, and runs of rows that align with those
//! boundaries become tables.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::model::{cell, Table};

use super::layout::TextSpan;

/// Left edges within this many points fall into the same bucket.
const EDGE_BUCKET: f32 = 5.0;

/// How far a span may sit from a column edge and still count as aligned.
const ALIGN_TOLERANCE: f32 = 5.0;

/// Slack allowed for spans that start just left of their column.
const COLUMN_SLACK: f32 = 10.0;

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 8,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
        }
    }
}

/// Spans sharing one baseline.
#[derive(Debug, Clone)]
struct SpanRow {
    spans: Vec<TextSpan>,
}

impl SpanRow {
    /// Spans of one row, left to right.
    fn new(mut spans: Vec<TextSpan>) -> Self {
        spans.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
        Self { spans }
    }
}

/// Detects tables in the text spans of a page.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect tables, top of page first.
    ///
    /// Cells with no text come back as `None`.
    pub fn detect(&self, spans: &[TextSpan]) -> Vec<Table> {
        if spans.len() < self.config.min_rows * self.config.min_columns {
            return Vec::new();
        }

        let rows = self.group_into_rows(spans);
        if rows.len() < self.config.min_rows {
            return Vec::new();
        }

        let columns = self.detect_columns(&rows);
        if columns.len() < self.config.min_columns {
            log::trace!("TableDetector: only {} column edge(s)", columns.len());
            return Vec::new();
        }

        let mut tables = Vec::new();
        for (start, end) in self.find_regions(&rows, &columns) {
            let region = &rows[start..=end];

            // Columns are re-derived per region; one page may hold tables
            // with different layouts.
            let region_columns = self.detect_columns(region);
            if region_columns.len() < self.config.min_columns {
                continue;
            }
            if region_columns.len() > self.config.max_columns {
                log::debug!(
                    "TableDetector: skipping region, too many columns ({} > {})",
                    region_columns.len(),
                    self.config.max_columns
                );
                continue;
            }
            if is_list_pattern(region, &region_columns) {
                log::debug!("TableDetector: skipping region, looks like a list");
                continue;
            }

            tables.push(build_table(region, &region_columns));
        }

        log::debug!("TableDetector: {} table(s) from {} spans", tables.len(), spans.len());
        tables
    }

    /// Group spans into rows by Y position, top to bottom.
    fn group_into_rows(&self, spans: &[TextSpan]) -> Vec<SpanRow> {
        let mut sorted = spans.to_vec();
        sorted.sort_by(|a, b| {
            b.y.partial_cmp(&a.y)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
        });

        let mut rows: Vec<SpanRow> = Vec::new();
        let mut anchor: Option<f32> = None;
        let mut current: Vec<TextSpan> = Vec::new();

        for span in sorted {
            let tolerance = span.font_size * self.config.y_tolerance_factor;
            match anchor {
                Some(y) if (span.y - y).abs() <= tolerance => current.push(span),
                _ => {
                    if !current.is_empty() {
                        rows.push(SpanRow::new(std::mem::take(&mut current)));
                    }
                    anchor = Some(span.y);
                    current.push(span);
                }
            }
        }
        if !current.is_empty() {
            rows.push(SpanRow::new(current));
        }

        rows
    }

    /// Column edges: left edges recurring across enough rows.
    ///
    /// Prefers rows holding two or more spans; when too few exist every
    /// span votes instead.
    fn detect_columns(&self, rows: &[SpanRow]) -> Vec<f32> {
        let multi: Vec<&SpanRow> = rows.iter().filter(|r| r.spans.len() >= 2).collect();

        let mut votes: HashMap<i32, usize> = HashMap::new();
        let voters = if multi.len() >= self.config.min_rows {
            for row in &multi {
                let buckets: HashSet<i32> = row.spans.iter().map(|s| bucket(s.x)).collect();
                for b in buckets {
                    *votes.entry(b).or_insert(0) += 1;
                }
            }
            multi.len()
        } else {
            for span in rows.iter().flat_map(|r| r.spans.iter()) {
                *votes.entry(bucket(span.x)).or_insert(0) += 1;
            }
            rows.len()
        };

        let min_votes = ((voters as f32 * self.config.min_alignment_ratio) as usize).max(2);
        cluster_edges(&votes, min_votes, self.config.min_column_gap)
    }

    /// Contiguous row runs whose spans align with `columns`.
    fn find_regions(&self, rows: &[SpanRow], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            if alignment_score(row, columns) >= self.config.min_alignment_ratio {
                start.get_or_insert(i);
            } else if let Some(s) = start.take() {
                if i - s >= self.config.min_rows {
                    regions.push((s, i - 1));
                }
            }
        }
        if let Some(s) = start {
            if rows.len() - s >= self.config.min_rows {
                regions.push((s, rows.len() - 1));
            }
        }

        regions
    }
}

fn bucket(x: f32) -> i32 {
    (x / EDGE_BUCKET).round() as i32
}

/// Keep buckets with enough votes, then drop edges closer than `min_gap`
/// to the previous kept edge.
fn cluster_edges(votes: &HashMap<i32, usize>, min_votes: usize, min_gap: f32) -> Vec<f32> {
    let mut edges: Vec<f32> = votes
        .iter()
        .filter(|(_, count)| **count >= min_votes)
        .map(|(b, _)| *b as f32 * EDGE_BUCKET)
        .collect();
    edges.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mut merged: Vec<f32> = Vec::with_capacity(edges.len());
    for edge in edges {
        match merged.last() {
            Some(last) if edge - last < min_gap => {}
            _ => merged.push(edge),
        }
    }
    merged
}

fn alignment_score(row: &SpanRow, columns: &[f32]) -> f32 {
    if row.spans.is_empty() || columns.is_empty() {
        return 0.0;
    }
    let aligned = row
        .spans
        .iter()
        .filter(|s| columns.iter().any(|c| (s.x - c).abs() <= ALIGN_TOLERANCE))
        .count();
    aligned as f32 / row.spans.len() as f32
}

/// Lay the region's spans out on the column grid.
fn build_table(rows: &[SpanRow], columns: &[f32]) -> Table {
    let right = rows
        .iter()
        .flat_map(|r| r.spans.iter())
        .map(TextSpan::right)
        .fold(f32::MIN, f32::max);

    let mut table = Table::new();
    for row in rows {
        let mut texts: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
        for span in &row.spans {
            texts[column_for(span.x, columns, right)].push(span.text.trim());
        }
        table.add_row(texts.iter().map(|parts| cell(&parts.join(" "))).collect());
    }
    table
}

/// Column index for a span starting at `x`: the column whose range holds
/// it, else the nearest edge.
fn column_for(x: f32, columns: &[f32], right: f32) -> usize {
    for (i, &start) in columns.iter().enumerate() {
        let end = columns.get(i + 1).copied().unwrap_or(right + 100.0);
        if x >= start - COLUMN_SLACK && x < end - COLUMN_SLACK {
            return i;
        }
    }

    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (x - *a)
                .abs()
                .partial_cmp(&(x - *b).abs())
                .unwrap_or(Ordering::Equal)
        })
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Numbered or bulleted lists split marker and text into separate spans,
/// which aligns like a two-column table.
fn is_list_pattern(rows: &[SpanRow], columns: &[f32]) -> bool {
    if columns.len() < 2 || rows.is_empty() {
        return false;
    }

    let mut bullets = 0;
    let mut numbers = 0;
    for row in rows {
        let first = row
            .spans
            .iter()
            .min_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
        match first.map(|s| s.text.trim()) {
            Some(t) if is_bullet_marker(t) => bullets += 1,
            Some(t) if is_number_marker(t) => numbers += 1,
            _ => {}
        }
    }

    let total = rows.len() as f32;
    if bullets as f32 / total >= 0.5 {
        return true;
    }
    // Numbered first columns are common in real tables; only reject the
    // two-column case.
    columns.len() == 2 && (bullets + numbers) as f32 / total >= 0.5
}

fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "►" | "■" | "●" | "□" | "◆" | "▶" | "➤"
    )
}

/// "1.", "12)", "3", "a.", "B)"
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    let digits = cleaned.chars().take_while(|c| c.is_ascii_digit()).count();
    let rest = &cleaned[digits..];
    if digits > 0 && (rest.is_empty() || rest == "." || rest == ")") {
        return true;
    }

    let mut chars = cleaned.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some('.' | ')'), None) if c.is_alphabetic()
    )
}
