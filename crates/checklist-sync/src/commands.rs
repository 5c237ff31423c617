//! Subcommands and their handlers.
//!
//! Every handler reads from or edits the session's snapshot; edits go
//! through `SyncSession::apply_with_retry`, so a conflicting write is
//! replayed on the fresh document instead of being resent.

use std::collections::BTreeSet;
use std::io::Write;

use anyhow::{anyhow, bail, Context as _, Result};
use checklist_store_core::activity::{out_of_range, ActivityEntry, ActivityFilter, ActivityKind, ActivityLog};
use checklist_store_core::edits::{
    add_task, create_checklist, delete_checklist, file_report, record_submission, remove_task,
    ReportDraft, SubmissionDraft,
};
use checklist_store_core::seed::{display_order, MANAGER_EMAIL};
use checklist_store_core::{IdGenerator, ReportKind, SyncSession, TempLogs};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Subcommand;
use tracing::info;

const DEFAULT_LOCATION: &str = "Austell";

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Summarize the current document
    Show,

    /// List checklists with their numbered tasks
    Checklists {
        /// Only this checklist
        #[arg(long)]
        checklist: Option<String>,
    },

    /// Append a task to a checklist
    AddTask {
        #[arg(long)]
        checklist: String,
        /// Task text
        text: String,
    },

    /// Remove a task by its number (as shown by `checklists`)
    RemoveTask {
        #[arg(long)]
        checklist: String,
        number: usize,
    },

    /// Create an empty checklist
    CreateChecklist {
        /// Display name
        name: String,
    },

    /// Delete a checklist (core checklists cannot be deleted)
    DeleteChecklist { checklist: String },

    /// Submit a completed checklist
    Submit {
        #[arg(long)]
        checklist: String,
        #[arg(long)]
        employee: String,
        #[arg(long, default_value = DEFAULT_LOCATION)]
        location: String,
        /// Completion date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Completion time, HH:MM (defaults to now)
        #[arg(long)]
        time: Option<String>,
        /// Completed task number; repeat for each task
        #[arg(long = "task")]
        tasks: Vec<usize>,
        /// Mark every task as completed
        #[arg(long, conflicts_with = "tasks")]
        all_tasks: bool,
        /// Temperature reading as UNIT=VALUE; repeat for each unit
        #[arg(long = "temp", value_parser = parse_key_value)]
        temps: Vec<(String, String)>,
        /// Address stamped on the record for the completion notice
        #[arg(long, default_value = MANAGER_EMAIL, env = "CHECKLIST_NOTIFY_EMAIL")]
        notify_email: String,
    },

    /// File a manager report
    Report {
        /// incident, maintenance, inventory or other
        #[arg(long, default_value = "incident")]
        kind: ReportKind,
        /// Author name
        #[arg(long)]
        by: String,
        content: String,
    },

    /// List submissions and reports, newest first
    Activity {
        /// submission or report
        #[arg(long, value_parser = parse_activity_kind)]
        kind: Option<ActivityKind>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        checklist: Option<String>,
        /// Submitter id or report uid
        #[arg(long)]
        submitter: Option<String>,
        /// On or after this date, YYYY-MM-DD
        #[arg(long, value_parser = parse_day)]
        since: Option<DateTime<Utc>>,
        /// Before this date, YYYY-MM-DD
        #[arg(long, value_parser = parse_day)]
        until: Option<DateTime<Utc>>,
        /// Case-insensitive text search
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        limit: Option<usize>,
        /// Print entries as JSON lines
        #[arg(long)]
        json: bool,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected UNIT=VALUE, got '{}'", s))?;
    Ok((key.trim().to_string(), value.trim().to_string()))
}

fn parse_activity_kind(s: &str) -> Result<ActivityKind, String> {
    match s.to_ascii_lowercase().as_str() {
        "submission" | "submissions" => Ok(ActivityKind::Submission),
        "report" | "reports" => Ok(ActivityKind::Report),
        _ => Err(format!("unknown activity kind: {}", s)),
    }
}

fn parse_day(s: &str) -> Result<DateTime<Utc>, String> {
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("{}: {}", s, e))?;
    Ok(day.and_time(chrono::NaiveTime::MIN).and_utc())
}

/// Convert 1-based task numbers to indices.
fn task_indices(numbers: &[usize]) -> Result<BTreeSet<usize>> {
    numbers
        .iter()
        .map(|&n| n.checked_sub(1).ok_or_else(|| anyhow!("Task numbers start at 1")))
        .collect()
}

/// Per-invocation settings shared by the handlers.
pub struct Context<'a> {
    pub session: &'a SyncSession,
    pub ids: &'a dyn IdGenerator,
    pub user_id: String,
    pub write_attempts: usize,
    pub now: DateTime<Utc>,
}

pub async fn run(ctx: &Context<'_>, command: Command, out: &mut dyn Write) -> Result<()> {
    match command {
        Command::Show => show(ctx, out).await,
        Command::Checklists { checklist } => list_checklists(ctx, checklist.as_deref(), out).await,
        Command::AddTask { checklist, text } => {
            let description = format!("Add task to {}", checklist);
            ctx.session
                .apply_with_retry(&description, ctx.write_attempts, |doc| {
                    add_task(doc, &checklist, &text)
                })
                .await?;
            writeln!(out, "Added task to {}", checklist)?;
            Ok(())
        }
        Command::RemoveTask { checklist, number } => {
            let index = number
                .checked_sub(1)
                .ok_or_else(|| anyhow!("Task numbers start at 1"))?;
            let description = format!("Remove task from {}", checklist);
            let removed = ctx
                .session
                .apply_with_retry(&description, ctx.write_attempts, |doc| {
                    remove_task(doc, &checklist, index)
                })
                .await?;
            writeln!(out, "Removed \"{}\" from {}", removed, checklist)?;
            Ok(())
        }
        Command::CreateChecklist { name } => {
            let description = format!("Create checklist {}", name.trim());
            let id = ctx
                .session
                .apply_with_retry(&description, ctx.write_attempts, |doc| {
                    create_checklist(doc, &name, ctx.now)
                })
                .await?;
            writeln!(out, "Created checklist {}", id)?;
            Ok(())
        }
        Command::DeleteChecklist { checklist } => {
            let description = format!("Delete checklist {}", checklist);
            let removed = ctx
                .session
                .apply_with_retry(&description, ctx.write_attempts, |doc| {
                    delete_checklist(doc, &checklist)
                })
                .await?;
            writeln!(out, "Deleted checklist {} ({})", removed.id, removed.name)?;
            Ok(())
        }
        Command::Submit {
            checklist,
            employee,
            location,
            date,
            time,
            tasks,
            all_tasks,
            temps,
            notify_email,
        } => {
            let draft = SubmissionDraft {
                checklist_id: checklist,
                submitter_id: ctx.user_id.clone(),
                employee_name: employee,
                location,
                completion_date: date.unwrap_or_else(|| ctx.now.format("%Y-%m-%d").to_string()),
                completion_time: time.unwrap_or_else(|| ctx.now.format("%H:%M").to_string()),
                checked_tasks: task_indices(&tasks)?,
                temp_logs: temps.into_iter().collect::<TempLogs>(),
                notification_email: Some(notify_email),
            };
            submit(ctx, draft, all_tasks, out).await
        }
        Command::Report { kind, by, content } => {
            let draft = ReportDraft {
                kind,
                content,
                submitted_by: by,
                uid: ctx.user_id.clone(),
            };
            let id = ctx
                .session
                .apply_with_retry("New manager report", ctx.write_attempts, |doc| {
                    file_report(doc, &draft, ctx.ids, ctx.now)
                })
                .await?;
            writeln!(out, "Filed {} report {}", draft.kind, id)?;
            Ok(())
        }
        Command::Activity {
            kind,
            location,
            checklist,
            submitter,
            since,
            until,
            search,
            limit,
            json,
        } => {
            let filter = ActivityFilter {
                kind,
                location,
                checklist_id: checklist,
                submitter,
                since,
                until,
                text: search,
            };
            activity(ctx, &filter, limit, json, out).await
        }
    }
}

async fn show(ctx: &Context<'_>, out: &mut dyn Write) -> Result<()> {
    let snapshot = ctx.session.snapshot().await;
    let doc = &snapshot.document;

    writeln!(out, "Backend:     {}", ctx.session.backend_name())?;
    writeln!(out, "Version:     {}", snapshot.version)?;
    writeln!(out, "Checklists:  {}", doc.checklists.len())?;
    writeln!(out, "Submissions: {}", doc.submissions.len())?;
    writeln!(out, "Reports:     {}", doc.reports().len())?;
    if let Some(latest) = ActivityLog::new(doc).entries().first() {
        writeln!(out, "Latest:      {} {}", latest.timestamp().to_rfc3339(), latest.summary())?;
    }
    Ok(())
}

async fn list_checklists(ctx: &Context<'_>, only: Option<&str>, out: &mut dyn Write) -> Result<()> {
    let snapshot = ctx.session.snapshot().await;
    let doc = &snapshot.document;

    if let Some(id) = only {
        if doc.checklist(id).is_none() {
            bail!("Checklist {} not found", id);
        }
    }

    for checklist in display_order(&doc.checklists) {
        if only.is_some_and(|id| id != checklist.id) {
            continue;
        }
        writeln!(out, "{} [{}] ({} tasks)", checklist.name, checklist.id, checklist.tasks.len())?;
        for (i, task) in checklist.tasks.iter().enumerate() {
            writeln!(out, "  {:>2}. {}", i + 1, task)?;
        }
    }
    Ok(())
}

async fn submit(
    ctx: &Context<'_>,
    draft: SubmissionDraft,
    all_tasks: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let description = format!("New submission for {}", draft.checklist_id);
    let id = ctx
        .session
        .apply_with_retry(&description, ctx.write_attempts, |doc| {
            let mut draft = draft.clone();
            if all_tasks {
                if let Some(checklist) = doc.checklist(&draft.checklist_id) {
                    draft.checked_tasks = (0..checklist.tasks.len()).collect();
                }
            }
            record_submission(doc, &draft, ctx.ids, ctx.now)
        })
        .await
        .with_context(|| format!("Submitting {}", draft.checklist_id))?;

    info!("Submission {} recorded for {}", id, draft.checklist_id);
    writeln!(out, "Submitted {} as {}", draft.checklist_id, id)?;

    let snapshot = ctx.session.snapshot().await;
    if let Some(submission) = snapshot.document.submission(&id) {
        for (unit, reading) in out_of_range(submission) {
            writeln!(out, "  warning: {} reading {}°F is above standard", unit, reading)?;
        }
    }
    Ok(())
}

async fn activity(
    ctx: &Context<'_>,
    filter: &ActivityFilter,
    limit: Option<usize>,
    json: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let snapshot = ctx.session.snapshot().await;
    let log = ActivityLog::new(&snapshot.document);
    let entries = log.query(filter);
    let shown = limit.unwrap_or(entries.len());

    for entry in entries.iter().take(shown) {
        if json {
            writeln!(out, "{}", serde_json::to_string(entry)?)?;
            continue;
        }
        writeln!(out, "{}  {}", entry.timestamp().format("%Y-%m-%d %H:%M"), entry.summary())?;
        if let ActivityEntry::Submission(s) = entry {
            for (unit, reading) in out_of_range(s) {
                writeln!(out, "    ! {} at {}°F", unit, reading)?;
            }
        }
    }
    if !json && entries.len() > shown {
        writeln!(out, "... {} more", entries.len() - shown)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use checklist_store_core::seed::{initial_document, TEMPERATURE_UNITS};
    use checklist_store_core::{DocumentStore, InMemoryStore, SequentialIds};
    use chrono::TimeZone;
    use clap::Parser;
    use std::sync::Arc;

    #[derive(Parser)]
    struct Cli {
        #[command(subcommand)]
        command: Command,
    }

    fn command(args: &[&str]) -> Command {
        let mut argv = vec!["checklist-sync"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap().command
    }

    async fn setup() -> (Arc<InMemoryStore>, SyncSession) {
        let store = Arc::new(InMemoryStore::new());
        let session = SyncSession::open(store.clone(), initial_document()).await.unwrap();
        (store, session)
    }

    async fn exec(session: &SyncSession, ids: &SequentialIds, args: &[&str]) -> Result<String> {
        let ctx = Context {
            session,
            ids,
            user_id: "user-7".to_string(),
            write_attempts: 3,
            now: Utc.with_ymd_and_hms(2024, 6, 3, 14, 30, 0).unwrap(),
        };
        let mut out = Vec::new();
        run(&ctx, command(args), &mut out).await?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_show_summarizes_seeded_document() {
        let (_store, session) = setup().await;
        let ids = SequentialIds::new("id");
        let out = exec(&session, &ids, &["show"]).await.unwrap();
        assert!(out.contains("Backend:     memory"));
        assert!(out.contains("Submissions: 0"));
    }

    #[tokio::test]
    async fn test_task_edits_are_persisted() {
        let (store, session) = setup().await;
        let ids = SequentialIds::new("id");

        exec(&session, &ids, &["add-task", "--checklist", "foh", "Polish the host stand."])
            .await
            .unwrap();
        let saved = store.load().await.unwrap().unwrap();
        let foh = saved.document.checklist("foh").unwrap();
        assert_eq!(foh.tasks.last().unwrap(), "Polish the host stand.");

        let out = exec(&session, &ids, &["remove-task", "--checklist", "foh", "1"])
            .await
            .unwrap();
        assert!(out.contains("Turn on lights"));
        let saved = store.load().await.unwrap().unwrap();
        assert!(!saved.document.checklist("foh").unwrap().tasks[0].starts_with("Turn on lights"));
    }

    #[tokio::test]
    async fn test_structural_checklist_cannot_be_deleted() {
        let (_store, session) = setup().await;
        let ids = SequentialIds::new("id");
        let err = exec(&session, &ids, &["delete-checklist", "health"]).await.unwrap_err();
        assert!(err.to_string().contains("structural"));
    }

    #[tokio::test]
    async fn test_create_then_delete_checklist() {
        let (store, session) = setup().await;
        let ids = SequentialIds::new("id");
        let out = exec(&session, &ids, &["create-checklist", "Patio Close"]).await.unwrap();
        let id = out.trim().strip_prefix("Created checklist ").unwrap().to_string();
        assert!(id.starts_with("patio_close_"));

        exec(&session, &ids, &["delete-checklist", &id]).await.unwrap();
        let saved = store.load().await.unwrap().unwrap();
        assert!(saved.document.checklist(&id).is_none());
    }

    #[tokio::test]
    async fn test_submit_requires_every_task() {
        let (store, session) = setup().await;
        let ids = SequentialIds::new("sub");

        let err = exec(
            &session,
            &ids,
            &["submit", "--checklist", "foh", "--employee", "Dana", "--task", "1"],
        )
        .await
        .unwrap_err();
        assert!(format!("{:#}", err).contains("every task must be completed"));
        assert!(store.load().await.unwrap().unwrap().document.submissions.is_empty());

        let out = exec(
            &session,
            &ids,
            &["submit", "--checklist", "foh", "--employee", "Dana", "--all-tasks"],
        )
        .await
        .unwrap();
        assert!(out.contains("Submitted foh as sub-1"));

        let saved = store.load().await.unwrap().unwrap();
        let submission = &saved.document.submissions[0];
        assert_eq!(submission.submitter_id, "user-7");
        assert_eq!(submission.location, DEFAULT_LOCATION);
        assert_eq!(submission.completion_date, "2024-06-03");
        assert_eq!(submission.completion_time, "14:30");
        assert_eq!(submission.notification_email.as_deref(), Some(MANAGER_EMAIL));
    }

    #[tokio::test]
    async fn test_health_submission_flags_warm_cooler() {
        let (_store, session) = setup().await;
        let ids = SequentialIds::new("sub");

        let temps: Vec<String> = TEMPERATURE_UNITS
            .iter()
            .map(|u| {
                let reading = if u.key == "Kitchen_Meat_Cooler" { "45" } else { "-5" };
                format!("{}={}", u.key, reading)
            })
            .collect();
        let mut args = vec!["submit", "--checklist", "health", "--employee", "Dana"];
        for t in &temps {
            args.push("--temp");
            args.push(t);
        }
        for n in ["1", "2", "3", "4", "5"] {
            args.push("--task");
            args.push(n);
        }

        let out = exec(&session, &ids, &args).await.unwrap();
        assert!(out.contains("warning: Kitchen_Meat_Cooler reading 45°F"));
    }

    #[tokio::test]
    async fn test_activity_filters_and_limits() {
        let (_store, session) = setup().await;
        let ids = SequentialIds::new("id");

        exec(&session, &ids, &["report", "--kind", "maintenance", "--by", "Sam", "Ice machine leaking"])
            .await
            .unwrap();
        exec(&session, &ids, &["submit", "--checklist", "foh", "--employee", "Dana", "--all-tasks"])
            .await
            .unwrap();

        let all = exec(&session, &ids, &["activity"]).await.unwrap();
        assert_eq!(all.lines().count(), 2);

        let reports = exec(&session, &ids, &["activity", "--kind", "report"]).await.unwrap();
        assert!(reports.contains("Maintenance report by Sam: Ice machine leaking"));
        assert!(!reports.contains("FOH Opening Checklist"));

        let limited = exec(&session, &ids, &["activity", "--limit", "1"]).await.unwrap();
        assert!(limited.contains("... 1 more"));

        let none = exec(&session, &ids, &["activity", "--since", "2024-06-04"]).await.unwrap();
        assert!(none.is_empty());

        let json = exec(&session, &ids, &["activity", "--kind", "submission", "--json"])
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(json.trim()).unwrap();
        assert_eq!(value["kind"], "submission");
        assert_eq!(value["record"]["employeeName"], "Dana");
    }

    #[test]
    fn test_bad_arguments_are_rejected() {
        assert!(parse_key_value("Kitchen_Meat_Cooler").is_err());
        assert!(parse_day("06/03/2024").is_err());
        assert!(task_indices(&[0]).is_err());
        assert_eq!(parse_activity_kind("Reports").unwrap(), ActivityKind::Report);
    }
}
