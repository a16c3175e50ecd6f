use crate::calc;
use crate::export;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::setup::report_settings;
use crate::ipc::helpers;
use crate::ipc::types::{AppState, Request};
use crate::report::{self, ReportDocument};
use chrono::NaiveDate;
use serde_json::json;
use std::path::PathBuf;

/// Builds the report from the subjects as they stand now. A stored SGPA from
/// an earlier `session.sgpa.calculate` may predate later edits.
fn session_report(state: &AppState, date: NaiveDate) -> ReportDocument {
    let session = &state.session;
    let entries = session.entries();
    let result = calc::compute_sgpa(&entries);
    let distribution = result
        .as_ref()
        .map(|r| r.distribution)
        .unwrap_or_default();
    report::render_report(
        &session.student,
        &entries,
        result.map(|r| r.sgpa),
        &distribution,
        date,
        &report_settings(state),
    )
}

fn handle_grade_report_model(state: &mut AppState, req: &Request) -> serde_json::Value {
    let date = match helpers::report_date(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(&req.id, json!(session_report(state, date)))
}

fn handle_grade_report_text(state: &mut AppState, req: &Request) -> serde_json::Value {
    let date = match helpers::report_date(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let doc = session_report(state, date);
    ok(
        &req.id,
        json!({
            "fileName": report::report_file_name(&state.session.student.name, date),
            "text": doc.to_text()
        }),
    )
}

fn handle_export_grade_report(state: &mut AppState, req: &Request) -> serde_json::Value {
    let date = match helpers::report_date(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let out_dir = match helpers::optional_str(req, "outDir") {
        Ok(v) => v.map(PathBuf::from),
        Err(e) => return e,
    };
    let out_dir = match (out_dir, state.workspace.as_ref()) {
        (Some(dir), _) => dir,
        (None, Some(ws)) => ws.join(report_settings(state).reports_dir),
        (None, None) => {
            return err(
                &req.id,
                "no_workspace",
                "select a workspace first or pass outDir",
                None,
            )
        }
    };

    let file_name = report::report_file_name(&state.session.student.name, date);
    let text = session_report(state, date).to_text();
    match export::write_report(&out_dir, &file_name, &text) {
        Ok(summary) => {
            tracing::info!(
                path = %summary.path.to_string_lossy(),
                bytes = summary.bytes,
                "grade report exported"
            );
            ok(
                &req.id,
                json!({
                    "path": summary.path.to_string_lossy(),
                    "fileName": file_name,
                    "bytes": summary.bytes,
                    "sha256": summary.sha256
                }),
            )
        }
        Err(e) => err(&req.id, "io_failed", format!("{e:#}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.gradeReportModel" => Some(handle_grade_report_model(state, req)),
        "reports.gradeReportText" => Some(handle_grade_report_text(state, req)),
        "reports.exportGradeReport" => Some(handle_export_grade_report(state, req)),
        _ => None,
    }
}
