//! Manager activity view: submissions and reports merged into one
//! newest-first stream, with conjunctive filters.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::document::{Document, Report, Submission};
use crate::seed::temperature_unit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Submission,
    Report,
}

/// One row of the activity log.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum ActivityEntry<'a> {
    Submission(&'a Submission),
    Report(&'a Report),
}

impl<'a> ActivityEntry<'a> {
    pub fn kind(&self) -> ActivityKind {
        match self {
            ActivityEntry::Submission(_) => ActivityKind::Submission,
            ActivityEntry::Report(_) => ActivityKind::Report,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ActivityEntry::Submission(s) => s.timestamp,
            ActivityEntry::Report(r) => r.timestamp,
        }
    }

    /// Who created the record: employee name or report author.
    pub fn actor(&self) -> &'a str {
        match *self {
            ActivityEntry::Submission(s) => &s.employee_name,
            ActivityEntry::Report(r) => &r.submitted_by,
        }
    }

    /// One-line description for listings.
    pub fn summary(&self) -> String {
        match self {
            ActivityEntry::Submission(s) => format!(
                "{} by {} at {} ({}/{} tasks)",
                s.checklist_name,
                s.employee_name,
                s.location,
                s.completed_tasks.len(),
                s.total_tasks
            ),
            ActivityEntry::Report(r) => format!("{} report by {}: {}", r.kind, r.submitted_by, r.content),
        }
    }
}

/// Conjunctive filter over activity entries. `None` fields match anything.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub kind: Option<ActivityKind>,
    /// Exact location match; reports have no location and never match.
    pub location: Option<String>,
    /// Exact checklist match; reports never match.
    pub checklist_id: Option<String>,
    /// Submitter id (submissions) or uid (reports).
    pub submitter: Option<String>,
    /// Inclusive lower bound on the creation timestamp.
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the creation timestamp.
    pub until: Option<DateTime<Utc>>,
    /// Case-insensitive substring over names and report content.
    pub text: Option<String>,
}

impl ActivityFilter {
    pub fn matches(&self, entry: &ActivityEntry<'_>) -> bool {
        if self.kind.is_some_and(|k| k != entry.kind()) {
            return false;
        }

        let ts = entry.timestamp();
        if self.since.is_some_and(|since| ts < since) || self.until.is_some_and(|until| ts >= until) {
            return false;
        }

        match entry {
            ActivityEntry::Submission(s) => {
                if self.location.as_ref().is_some_and(|l| *l != s.location)
                    || self.checklist_id.as_ref().is_some_and(|c| *c != s.checklist_id)
                    || self.submitter.as_ref().is_some_and(|u| *u != s.submitter_id)
                {
                    return false;
                }
            }
            ActivityEntry::Report(r) => {
                if self.location.is_some()
                    || self.checklist_id.is_some()
                    || self.submitter.as_ref().is_some_and(|u| *u != r.uid)
                {
                    return false;
                }
            }
        }

        match &self.text {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                let detail = match entry {
                    ActivityEntry::Submission(s) => s.checklist_name.as_str(),
                    ActivityEntry::Report(r) => r.content.as_str(),
                };
                let haystacks = [entry.actor(), detail];
                haystacks.iter().any(|h| h.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Read-only activity view over a document.
#[derive(Debug, Clone, Copy)]
pub struct ActivityLog<'a> {
    document: &'a Document,
}

impl<'a> ActivityLog<'a> {
    pub fn new(document: &'a Document) -> Self {
        Self { document }
    }

    /// All entries, newest first.
    pub fn entries(&self) -> Vec<ActivityEntry<'a>> {
        self.query(&ActivityFilter::default())
    }

    /// Entries matching `filter`, newest first.
    pub fn query(&self, filter: &ActivityFilter) -> Vec<ActivityEntry<'a>> {
        let submissions = self.document.submissions.iter().map(ActivityEntry::Submission);
        let reports = self.document.reports().iter().map(ActivityEntry::Report);

        let mut entries: Vec<ActivityEntry<'a>> = submissions
            .chain(reports)
            .filter(|e| filter.matches(e))
            .collect();
        entries.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
        entries
    }

    /// Distinct submission locations, sorted.
    pub fn locations(&self) -> Vec<&'a str> {
        let mut locations: Vec<&str> = self
            .document
            .submissions
            .iter()
            .map(|s| s.location.as_str())
            .collect();
        locations.sort_unstable();
        locations.dedup();
        locations
    }
}

/// Temperature readings in a submission that exceed their unit's standard,
/// as `(unit key, reading)`.
///
/// Unknown units and non-numeric readings are skipped.
pub fn out_of_range(submission: &Submission) -> Vec<(&str, f64)> {
    let Some(logs) = submission.temp_logs.as_ref() else {
        return Vec::new();
    };
    logs.iter()
        .filter_map(|(key, value)| {
            let unit = temperature_unit(key)?;
            let reading = value.trim().parse::<f64>().ok()?;
            (reading > unit.max_fahrenheit).then_some((key.as_str(), reading))
        })
        .collect()
}
