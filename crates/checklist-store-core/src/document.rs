use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Temperature readings keyed by unit key (e.g. `Kitchen_Meat_Cooler`).
///
/// Values are kept as the text the employee entered so that historical
/// records round-trip exactly.
pub type TempLogs = BTreeMap<String, String>;

/// Fields this version does not know about, carried through unchanged so a
/// write never drops what a newer client stored.
pub type UnknownFields = serde_json::Map<String, serde_json::Value>;

/// The whole application state, persisted as a single JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Ordered checklists; `id` is unique.
    #[serde(default)]
    pub checklists: Vec<Checklist>,
    /// Append-only completed checklist records.
    #[serde(default)]
    pub submissions: Vec<Submission>,
    /// Append-only manager reports. Older documents do not carry this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reports: Option<Vec<Report>>,
    #[serde(flatten)]
    pub extra: UnknownFields,
}

impl Document {
    /// Get a checklist by ID.
    pub fn checklist(&self, checklist_id: &str) -> Option<&Checklist> {
        self.checklists.iter().find(|c| c.id == checklist_id)
    }

    /// Get a mutable checklist by ID.
    pub fn checklist_mut(&mut self, checklist_id: &str) -> Option<&mut Checklist> {
        self.checklists.iter_mut().find(|c| c.id == checklist_id)
    }

    /// Get a submission by ID.
    pub fn submission(&self, submission_id: &str) -> Option<&Submission> {
        self.submissions.iter().find(|s| s.id == submission_id)
    }

    /// Reports, treating a missing list as empty.
    pub fn reports(&self) -> &[Report] {
        self.reports.as_deref().unwrap_or(&[])
    }

    /// Append a report, creating the list on first use.
    pub fn push_report(&mut self, report: Report) {
        self.reports.get_or_insert_with(Vec::new).push(report);
    }
}

/// A named, ordered list of tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checklist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(flatten)]
    pub extra: UnknownFields,
}

/// A completed checklist.
///
/// `checklist_name` and `completed_tasks` are copies taken at submission
/// time, so the record stays readable after the checklist is edited or
/// deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: String,
    pub checklist_id: String,
    pub checklist_name: String,
    pub submitter_id: String,
    pub employee_name: String,
    pub location: String,
    /// `YYYY-MM-DD` as entered.
    pub completion_date: String,
    /// `HH:MM` as entered.
    pub completion_time: String,
    #[serde(default)]
    pub completed_tasks: Vec<String>,
    pub total_tasks: usize,
    /// When the record was created (distinct from the completion date/time).
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_email: Option<String>,
    #[serde(default)]
    pub temp_logs: Option<TempLogs>,
    #[serde(flatten)]
    pub extra: UnknownFields,
}

/// Category of a manager report.
///
/// Stored as its display text. Categories this version does not know are
/// kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReportKind {
    Incident,
    Maintenance,
    Inventory,
    Other(String),
}

impl From<String> for ReportKind {
    fn from(text: String) -> Self {
        match text.as_str() {
            "Incident" => ReportKind::Incident,
            "Maintenance" => ReportKind::Maintenance,
            "Inventory" => ReportKind::Inventory,
            _ => ReportKind::Other(text),
        }
    }
}

impl From<ReportKind> for String {
    fn from(kind: ReportKind) -> Self {
        match kind {
            ReportKind::Other(text) => text,
            known => known.to_string(),
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportKind::Incident => write!(f, "Incident"),
            ReportKind::Maintenance => write!(f, "Maintenance"),
            ReportKind::Inventory => write!(f, "Inventory"),
            ReportKind::Other(text) => write!(f, "{}", text),
        }
    }
}

impl std::str::FromStr for ReportKind {
    type Err = String;

    /// Parse one of the categories offered when filing a report.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "incident" => Ok(ReportKind::Incident),
            "maintenance" => Ok(ReportKind::Maintenance),
            "inventory" => Ok(ReportKind::Inventory),
            "other" => Ok(ReportKind::Other("Other".to_string())),
            _ => Err(format!("unknown report kind: {}", s)),
        }
    }
}

/// A free-text report filed by a manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ReportKind,
    pub content: String,
    pub submitted_by: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: UnknownFields,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_document_without_reports() {
        let json = r#"{
            "checklists": [{"id": "foh", "name": "FOH Opening Checklist", "tasks": ["Turn on lights."]}],
            "submissions": [{
                "id": "s1",
                "checklistId": "foh",
                "checklistName": "FOH Opening Checklist",
                "submitterId": "u1",
                "employeeName": "Dana",
                "location": "Austell",
                "completionDate": "2024-03-01",
                "completionTime": "09:00",
                "completedTasks": ["Turn on lights."],
                "totalTasks": 1,
                "timestamp": "2024-03-01T09:05:12.345Z",
                "notificationEmail": "manager@restaurant-app-alerts.com",
                "tempLogs": null
            }]
        }"#;

        let doc: Document = serde_json::from_str(json).unwrap();
        assert_eq!(doc.checklists.len(), 1);
        assert!(doc.reports.is_none());
        assert!(doc.reports().is_empty());

        let submission = doc.submission("s1").unwrap();
        assert_eq!(submission.total_tasks, 1);
        assert!(submission.temp_logs.is_none());
        assert_eq!(
            submission.notification_email.as_deref(),
            Some("manager@restaurant-app-alerts.com")
        );
    }

    #[test]
    fn test_serializes_camel_case_fields() {
        let submission = Submission {
            id: "s1".to_string(),
            checklist_id: "health".to_string(),
            checklist_name: "Health Compliance".to_string(),
            submitter_id: "u1".to_string(),
            employee_name: "Dana".to_string(),
            location: "Austell".to_string(),
            completion_date: "2024-03-01".to_string(),
            completion_time: "09:00".to_string(),
            completed_tasks: vec![],
            total_tasks: 0,
            timestamp: Utc::now(),
            notification_email: None,
            temp_logs: Some(TempLogs::from([(
                "Kitchen_Meat_Cooler".to_string(),
                "38".to_string(),
            )])),
            extra: Default::default(),
        };

        let value = serde_json::to_value(&submission).unwrap();
        assert_eq!(value["checklistId"], "health");
        assert_eq!(value["tempLogs"]["Kitchen_Meat_Cooler"], "38");
        assert!(value.get("notificationEmail").is_none());
    }

    #[test]
    fn test_unknown_report_kind_is_kept_verbatim() {
        let json = r#"{
            "type": "Complaint",
            "content": "Walk-in door sticks",
            "submittedBy": "owner@example.com",
            "timestamp": "2024-03-01T10:00:00Z"
        }"#;
        let report: Report = serde_json::from_str(json).unwrap();
        assert_eq!(report.kind, ReportKind::Other("Complaint".to_string()));
        assert_eq!(report.kind.to_string(), "Complaint");
        assert!(report.id.is_empty());

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["type"], "Complaint");
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_report_kind_parses_filing_categories() {
        assert_eq!("MAINTENANCE".parse::<ReportKind>().unwrap(), ReportKind::Maintenance);
        assert_eq!(
            "other".parse::<ReportKind>().unwrap(),
            ReportKind::Other("Other".to_string())
        );
        assert!("complaint".parse::<ReportKind>().is_err());
        assert_eq!(
            serde_json::to_value(ReportKind::Inventory).unwrap(),
            serde_json::json!("Inventory")
        );
    }

    #[test]
    fn test_load_save_keeps_fields_from_newer_clients() {
        let original = serde_json::json!({
            "checklists": [{
                "id": "foh",
                "name": "FOH Opening Checklist",
                "tasks": ["Turn on lights."],
                "color": "teal"
            }],
            "submissions": [{
                "id": "s1",
                "checklistId": "foh",
                "checklistName": "FOH Opening Checklist",
                "submitterId": "u1",
                "employeeName": "Dana",
                "location": "Smyrna",
                "completionDate": "2024-03-01",
                "completionTime": "09:00",
                "completedTasks": ["Turn on lights."],
                "totalTasks": 1,
                "timestamp": "2024-03-01T09:05:12.345Z",
                "notificationEmail": "manager@restaurant-app-alerts.com",
                "tempLogs": null,
                "signature": {"strokes": 3}
            }],
            "reports": [{
                "id": "r1",
                "type": "Complaint",
                "content": "Guest found hair in waffle",
                "submittedBy": "owner@example.com",
                "uid": "u9",
                "timestamp": "2024-03-01T10:00:00Z",
                "photoUrl": "https://x/y.jpg"
            }],
            "locations": ["Austell", "Smyrna"]
        });

        let doc: Document = serde_json::from_value(original.clone()).unwrap();
        assert_eq!(doc.extra["locations"], serde_json::json!(["Austell", "Smyrna"]));
        assert_eq!(doc.reports()[0].extra["photoUrl"], "https://x/y.jpg");

        let written = serde_json::to_value(&doc).unwrap();
        assert_eq!(written, original);
    }

    #[test]
    fn test_push_report_creates_list() {
        let mut doc = Document::default();
        doc.push_report(Report {
            id: "r1".to_string(),
            kind: ReportKind::Maintenance,
            content: "Fryer 2 thermostat".to_string(),
            submitted_by: "mgr@example.com".to_string(),
            uid: "u2".to_string(),
            timestamp: Utc::now(),
            extra: Default::default(),
        });
        assert_eq!(doc.reports().len(), 1);
    }
}
