use crate::calc::{self, SubjectEntry};
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::grades::{cgpa_json, sgpa_json};
use crate::ipc::handlers::setup::calculator_settings;
use crate::ipc::helpers::{self, MAX_CREDITS, MAX_MARKS, MAX_SGPA};
use crate::ipc::types::{AppState, Request};
use crate::session::{SessionSubject, SubjectPatch, MAX_SEMESTERS};
use serde_json::{json, Value};

fn subject_json(s: &SessionSubject) -> Value {
    let mut v = json!(s);
    v["grade"] = if s.entry.marks > 0 {
        let band = calc::grade_for_marks(s.entry.marks);
        json!({ "letter": band.letter, "points": band.points })
    } else {
        Value::Null
    };
    v
}

fn session_json(state: &AppState) -> Value {
    let session = &state.session;
    let counted = session.semesters().iter().filter(|s| s.sgpa > 0.0).count();
    json!({
        "student": session.student,
        "subjects": session.subjects().iter().map(subject_json).collect::<Vec<_>>(),
        "semesters": session.semesters(),
        "sgpa": session.sgpa().map(sgpa_json),
        "cgpa": session.cgpa().map(|c| cgpa_json(c, counted)),
        "limits": { "maxSemesters": MAX_SEMESTERS, "maxCredits": MAX_CREDITS },
    })
}

fn handle_get(state: &mut AppState, req: &Request) -> Value {
    ok(&req.id, session_json(state))
}

fn handle_student_update(state: &mut AppState, req: &Request) -> Value {
    let name = match helpers::optional_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let usn = match helpers::optional_str(req, "usn") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let student = &mut state.session.student;
    if let Some(name) = name {
        student.name = name.trim().to_string();
    }
    if let Some(usn) = usn {
        student.usn = usn.trim().to_ascii_uppercase();
    }
    ok(&req.id, json!({ "student": student }))
}

fn handle_subject_add(state: &mut AppState, req: &Request) -> Value {
    let default_credits = calculator_settings(state).default_credits;
    let name = match req.params.get("name") {
        Some(v) => match helpers::subject_name(req, v, "name") {
            Ok(v) => v,
            Err(e) => return e,
        },
        None => String::new(),
    };
    let credits = match req.params.get("credits") {
        Some(v) => match helpers::int_in_range(req, v, "credits", 0, MAX_CREDITS) {
            Ok(v) => v,
            Err(e) => return e,
        },
        None => default_credits,
    };
    let marks = match req.params.get("marks") {
        Some(v) => match helpers::int_in_range(req, v, "marks", 0, MAX_MARKS) {
            Ok(v) => v,
            Err(e) => return e,
        },
        None => 0,
    };
    let subject = state.session.add_subject(SubjectEntry {
        name,
        credits,
        marks,
    });
    ok(&req.id, json!({ "subject": subject_json(subject) }))
}

fn handle_subject_update(state: &mut AppState, req: &Request) -> Value {
    let id = match helpers::required_str(req, "id") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let mut patch = SubjectPatch::default();
    if let Some(v) = req.params.get("name") {
        patch.name = match helpers::subject_name(req, v, "name") {
            Ok(v) => Some(v),
            Err(e) => return e,
        };
    }
    if let Some(v) = req.params.get("credits") {
        patch.credits = match helpers::int_in_range(req, v, "credits", 0, MAX_CREDITS) {
            Ok(v) => Some(v),
            Err(e) => return e,
        };
    }
    if let Some(v) = req.params.get("marks") {
        patch.marks = match helpers::int_in_range(req, v, "marks", 0, MAX_MARKS) {
            Ok(v) => Some(v),
            Err(e) => return e,
        };
    }
    match state.session.update_subject(&id, patch) {
        Ok(subject) => ok(&req.id, json!({ "subject": subject_json(subject) })),
        Err(e) => helpers::session_err(req, e),
    }
}

fn handle_subject_remove(state: &mut AppState, req: &Request) -> Value {
    let id = match helpers::required_str(req, "id") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.session.remove_subject(&id) {
        Ok(()) => ok(&req.id, json!({ "removed": id })),
        Err(e) => helpers::session_err(req, e),
    }
}

fn handle_subject_reset(state: &mut AppState, req: &Request) -> Value {
    let default_credits = calculator_settings(state).default_credits;
    state.session.reset_subjects(default_credits);
    ok(&req.id, session_json(state))
}

fn handle_sgpa_calculate(state: &mut AppState, req: &Request) -> Value {
    match state.session.calculate_sgpa() {
        Some(res) => ok(&req.id, sgpa_json(res)),
        None => ok(&req.id, json!({ "sgpa": null })),
    }
}

fn handle_semester_add(state: &mut AppState, req: &Request) -> Value {
    match state.session.add_semester() {
        Ok(semester) => ok(&req.id, json!({ "semester": semester })),
        Err(e) => helpers::session_err(req, e),
    }
}

fn semester_param(req: &Request) -> Result<i64, Value> {
    let Some(raw) = req.params.get("semester") else {
        return Err(err(&req.id, "bad_params", "missing semester", None));
    };
    helpers::int_in_range(req, raw, "semester", 1, MAX_SEMESTERS as i64)
}

fn handle_semester_update(state: &mut AppState, req: &Request) -> Value {
    let semester = match semester_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(raw) = req.params.get("sgpa") else {
        return err(&req.id, "bad_params", "missing sgpa", None);
    };
    let sgpa = match helpers::number_in_range(req, raw, "sgpa", 0.0, MAX_SGPA) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.session.update_semester(semester, sgpa) {
        Ok(()) => ok(&req.id, json!({ "semesters": state.session.semesters() })),
        Err(e) => helpers::session_err(req, e),
    }
}

fn handle_semester_remove(state: &mut AppState, req: &Request) -> Value {
    let semester = match semester_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.session.remove_semester(semester) {
        Ok(()) => ok(&req.id, json!({ "semesters": state.session.semesters() })),
        Err(e) => helpers::session_err(req, e),
    }
}

fn handle_semester_reset(state: &mut AppState, req: &Request) -> Value {
    state.session.reset_semesters();
    ok(&req.id, session_json(state))
}

fn handle_cgpa_calculate(state: &mut AppState, req: &Request) -> Value {
    let counted = state
        .session
        .semesters()
        .iter()
        .filter(|s| s.sgpa > 0.0)
        .count();
    match state.session.calculate_cgpa() {
        Some(cgpa) => ok(&req.id, cgpa_json(cgpa, counted)),
        None => ok(&req.id, json!({ "cgpa": null })),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "session.get" => Some(handle_get(state, req)),
        "session.student.update" => Some(handle_student_update(state, req)),
        "session.subjects.add" => Some(handle_subject_add(state, req)),
        "session.subjects.update" => Some(handle_subject_update(state, req)),
        "session.subjects.remove" => Some(handle_subject_remove(state, req)),
        "session.subjects.reset" => Some(handle_subject_reset(state, req)),
        "session.sgpa.calculate" => Some(handle_sgpa_calculate(state, req)),
        "session.semesters.add" => Some(handle_semester_add(state, req)),
        "session.semesters.update" => Some(handle_semester_update(state, req)),
        "session.semesters.remove" => Some(handle_semester_remove(state, req)),
        "session.semesters.reset" => Some(handle_semester_reset(state, req)),
        "session.cgpa.calculate" => Some(handle_cgpa_calculate(state, req)),
        _ => None,
    }
}
