//! Document transformations applied inside a session write.
//!
//! Each edit validates its input against the document it is given and
//! either mutates it completely or leaves it untouched.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::document::{Checklist, Document, Report, ReportKind, Submission, TempLogs};
use crate::error::StoreError;
use crate::ids::{checklist_id_for, IdGenerator};
use crate::seed::{is_structural, requires_temperature_log, temperature_task, TEMPERATURE_UNITS};

fn checklist_mut<'a>(
    document: &'a mut Document,
    checklist_id: &str,
) -> Result<&'a mut Checklist, StoreError> {
    document
        .checklist_mut(checklist_id)
        .ok_or_else(|| StoreError::NotFound(format!("Checklist {}", checklist_id)))
}

/// Append a task to a checklist.
pub fn add_task(document: &mut Document, checklist_id: &str, text: &str) -> Result<(), StoreError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(StoreError::Validation("Task text is empty".to_string()));
    }
    checklist_mut(document, checklist_id)?.tasks.push(text.to_string());
    Ok(())
}

/// Remove the task at `index`, returning its text.
pub fn remove_task(
    document: &mut Document,
    checklist_id: &str,
    index: usize,
) -> Result<String, StoreError> {
    let checklist = checklist_mut(document, checklist_id)?;
    if index >= checklist.tasks.len() {
        return Err(StoreError::NotFound(format!(
            "Task {} in checklist {} ({} tasks)",
            index,
            checklist_id,
            checklist.tasks.len()
        )));
    }
    Ok(checklist.tasks.remove(index))
}

/// Create an empty checklist, returning its generated id.
pub fn create_checklist(
    document: &mut Document,
    name: &str,
    now: DateTime<Utc>,
) -> Result<String, StoreError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::Validation("Checklist name is empty".to_string()));
    }

    let id = checklist_id_for(name, now);
    if document.checklist(&id).is_some() {
        return Err(StoreError::Validation(format!("Checklist {} already exists", id)));
    }

    document.checklists.push(Checklist {
        id: id.clone(),
        name: name.to_string(),
        tasks: Vec::new(),
        extra: Default::default(),
    });
    Ok(id)
}

/// Delete a non-structural checklist.
///
/// Submissions that reference it keep their own copies of its name and
/// tasks and are not touched.
pub fn delete_checklist(document: &mut Document, checklist_id: &str) -> Result<Checklist, StoreError> {
    if is_structural(checklist_id) {
        return Err(StoreError::Validation(format!(
            "Cannot delete core structural checklist {}",
            checklist_id
        )));
    }
    let pos = document
        .checklists
        .iter()
        .position(|c| c.id == checklist_id)
        .ok_or_else(|| StoreError::NotFound(format!("Checklist {}", checklist_id)))?;
    Ok(document.checklists.remove(pos))
}

/// What an employee fills in before submitting a checklist.
#[derive(Debug, Clone, Default)]
pub struct SubmissionDraft {
    pub checklist_id: String,
    pub submitter_id: String,
    pub employee_name: String,
    pub location: String,
    pub completion_date: String,
    pub completion_time: String,
    /// Indices of tasks the employee ticked. Temperature log tasks are
    /// derived from `temp_logs` and ignored here.
    pub checked_tasks: BTreeSet<usize>,
    pub temp_logs: TempLogs,
    pub notification_email: Option<String>,
}

/// Whether a temperature reading is a usable number.
pub fn is_numeric_reading(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value.parse::<f64>().map(|v| v.is_finite()).unwrap_or(false)
}

fn require(field: &str, value: &str) -> Result<String, StoreError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StoreError::Validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Validate a draft against the current checklist and append the resulting
/// submission, returning its id.
pub fn record_submission(
    document: &mut Document,
    draft: &SubmissionDraft,
    ids: &dyn IdGenerator,
    now: DateTime<Utc>,
) -> Result<String, StoreError> {
    let checklist = document
        .checklist(&draft.checklist_id)
        .ok_or_else(|| StoreError::NotFound(format!("Checklist {}", draft.checklist_id)))?;

    let employee_name = require("Employee name", &draft.employee_name)?;
    let location = require("Location", &draft.location)?;
    let completion_date = require("Completion date", &draft.completion_date)?;
    let completion_time = require("Completion time", &draft.completion_time)?;

    if let Some(index) = draft.checked_tasks.iter().find(|i| **i >= checklist.tasks.len()) {
        return Err(StoreError::Validation(format!(
            "Task {} is out of range for {} ({} tasks)",
            index,
            checklist.name,
            checklist.tasks.len()
        )));
    }

    let needs_temps = requires_temperature_log(&checklist.id);
    if needs_temps {
        let missing: Vec<&str> = TEMPERATURE_UNITS
            .iter()
            .filter(|u| {
                !draft
                    .temp_logs
                    .get(u.key)
                    .is_some_and(|v| is_numeric_reading(v))
            })
            .map(|u| u.key)
            .collect();
        if !missing.is_empty() {
            return Err(StoreError::Validation(format!(
                "All {} temperature readings must be numbers; missing or invalid: {}",
                TEMPERATURE_UNITS.len(),
                missing.join(", ")
            )));
        }
    }

    let temp_task_texts: Vec<String> = if needs_temps {
        TEMPERATURE_UNITS.iter().map(temperature_task).collect()
    } else {
        Vec::new()
    };

    let completed_tasks: Vec<String> = checklist
        .tasks
        .iter()
        .enumerate()
        .filter(|(index, task)| {
            // Readings were validated above, so every temperature task is done.
            temp_task_texts.contains(*task) || draft.checked_tasks.contains(index)
        })
        .map(|(_, task)| task.clone())
        .collect();

    let total_tasks = checklist.tasks.len();
    if completed_tasks.len() < total_tasks {
        return Err(StoreError::Validation(format!(
            "{} of {} tasks completed; every task must be completed before submitting",
            completed_tasks.len(),
            total_tasks
        )));
    }

    let submission = Submission {
        id: ids.next_id(),
        checklist_id: checklist.id.clone(),
        checklist_name: checklist.name.clone(),
        submitter_id: draft.submitter_id.clone(),
        employee_name,
        location,
        completion_date,
        completion_time,
        completed_tasks,
        total_tasks,
        timestamp: now,
        notification_email: draft.notification_email.clone(),
        temp_logs: needs_temps.then(|| draft.temp_logs.clone()),
        extra: Default::default(),
    };

    debug!(
        "Recorded submission {} of {} by {}",
        submission.id, submission.checklist_id, submission.employee_name
    );
    let id = submission.id.clone();
    document.submissions.push(submission);
    Ok(id)
}

/// What a manager fills in before filing a report.
#[derive(Debug, Clone)]
pub struct ReportDraft {
    pub kind: ReportKind,
    pub content: String,
    pub submitted_by: String,
    pub uid: String,
}

/// Append a report, returning its id.
pub fn file_report(
    document: &mut Document,
    draft: &ReportDraft,
    ids: &dyn IdGenerator,
    now: DateTime<Utc>,
) -> Result<String, StoreError> {
    let content = require("Report content", &draft.content)?;
    let id = ids.next_id();
    document.push_report(Report {
        id: id.clone(),
        kind: draft.kind.clone(),
        content,
        submitted_by: draft.submitted_by.clone(),
        uid: draft.uid.clone(),
        timestamp: now,
        extra: Default::default(),
    });
    Ok(id)
}
