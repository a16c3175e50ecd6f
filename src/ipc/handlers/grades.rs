use crate::calc::{self, SgpaResult, GRADE_SCALE};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{self, MAX_MARKS, MAX_SGPA};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

pub(crate) fn sgpa_json(res: &SgpaResult) -> serde_json::Value {
    json!({
        "sgpa": res.sgpa,
        "label": calc::classify(res.sgpa).label(),
        "letter": calc::sgpa_letter(res.sgpa),
        "tier": calc::performance_tier(res.sgpa).as_str(),
        "progress": calc::progress_percent(res.sgpa),
        "totalCredits": res.total_credits,
        "gradedCount": res.graded_count,
        "distribution": res.distribution,
    })
}

pub(crate) fn cgpa_json(cgpa: f64, semesters_counted: usize) -> serde_json::Value {
    json!({
        "cgpa": cgpa,
        "label": calc::classify(cgpa).label(),
        "tier": calc::performance_tier(cgpa).as_str(),
        "progress": calc::progress_percent(cgpa),
        "semestersCounted": semesters_counted,
    })
}

fn handle_scale(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let bands: Vec<serde_json::Value> = GRADE_SCALE
        .iter()
        .map(|b| {
            let mut v = json!(b);
            v["range"] = json!(b.range());
            v
        })
        .collect();
    ok(&req.id, json!({ "bands": bands }))
}

fn handle_lookup(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("marks") else {
        return err(&req.id, "bad_params", "missing marks", None);
    };
    let marks = match helpers::int_in_range(req, raw, "marks", 0, MAX_MARKS) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let band = calc::grade_for_marks(marks);
    ok(
        &req.id,
        json!({
            "marks": marks,
            "letter": band.letter,
            "points": band.points,
            "description": band.description,
        }),
    )
}

fn handle_sgpa(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let subjects = match helpers::parse_subjects(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match calc::compute_sgpa(&subjects) {
        Some(res) => ok(&req.id, sgpa_json(&res)),
        None => ok(&req.id, json!({ "sgpa": null })),
    }
}

fn handle_cgpa(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let semesters = match helpers::parse_semesters(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let counted = semesters.iter().filter(|s| s.sgpa > 0.0).count();
    match calc::compute_cgpa(&semesters) {
        Some(cgpa) => ok(&req.id, cgpa_json(cgpa, counted)),
        None => ok(&req.id, json!({ "cgpa": null })),
    }
}

fn handle_classify(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(raw) = req.params.get("value") else {
        return err(&req.id, "bad_params", "missing value", None);
    };
    let value = match helpers::number_in_range(req, raw, "value", 0.0, MAX_SGPA) {
        Ok(v) => v,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "value": value,
            "label": calc::classify(value).label(),
            "letter": calc::sgpa_letter(value),
            "tier": calc::performance_tier(value).as_str(),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "grades.scale" => Some(handle_scale(state, req)),
        "grades.lookup" => Some(handle_lookup(state, req)),
        "grades.sgpa" => Some(handle_sgpa(state, req)),
        "grades.cgpa" => Some(handle_cgpa(state, req)),
        "grades.classify" => Some(handle_classify(state, req)),
        _ => None,
    }
}
