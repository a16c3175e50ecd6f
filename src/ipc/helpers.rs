use crate::calc::{SemesterEntry, SubjectEntry};
use crate::ipc::error::err;
use crate::ipc::types::Request;
use crate::session::{SessionError, MAX_SEMESTERS};
use chrono::NaiveDate;
use serde_json::{json, Value};

pub const MAX_CREDITS: i64 = 6;
pub const MAX_MARKS: i64 = 100;
pub const MAX_SGPA: f64 = 10.0;
const MAX_SUBJECT_NAME_LEN: usize = 120;

fn bad_field(req: &Request, field: &str, message: String, value: Option<&Value>) -> Value {
    let mut details = json!({ "field": field });
    if let Some(v) = value {
        details["value"] = v.clone();
    }
    err(&req.id, "bad_params", message, Some(details))
}

pub fn required_str(req: &Request, key: &str) -> Result<String, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Result<Option<String>, Value> {
    match req.params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(bad_field(
            req,
            key,
            format!("{} must be a string", key),
            Some(other),
        )),
    }
}

pub fn int_in_range(
    req: &Request,
    v: &Value,
    field: &str,
    min: i64,
    max: i64,
) -> Result<i64, Value> {
    let Some(n) = v.as_i64() else {
        return Err(bad_field(
            req,
            field,
            format!("{} must be an integer", field),
            Some(v),
        ));
    };
    if !(min..=max).contains(&n) {
        return Err(bad_field(
            req,
            field,
            format!("{} must be in {}..={}", field, min, max),
            Some(v),
        ));
    }
    Ok(n)
}

pub fn number_in_range(
    req: &Request,
    v: &Value,
    field: &str,
    min: f64,
    max: f64,
) -> Result<f64, Value> {
    let Some(n) = v.as_f64() else {
        return Err(bad_field(
            req,
            field,
            format!("{} must be a number", field),
            Some(v),
        ));
    };
    if !n.is_finite() || n < min || n > max {
        return Err(bad_field(
            req,
            field,
            format!("{} must be in {}..={}", field, min, max),
            Some(v),
        ));
    }
    Ok(n)
}

pub fn subject_name(req: &Request, v: &Value, field: &str) -> Result<String, Value> {
    if v.is_null() {
        return Ok(String::new());
    }
    let Some(s) = v.as_str() else {
        return Err(bad_field(
            req,
            field,
            format!("{} must be a string", field),
            Some(v),
        ));
    };
    let s = s.trim();
    if s.chars().count() > MAX_SUBJECT_NAME_LEN {
        return Err(bad_field(
            req,
            field,
            format!("{} length must be <= {}", field, MAX_SUBJECT_NAME_LEN),
            None,
        ));
    }
    Ok(s.to_string())
}

/// `{name?, credits, marks}`; credits 0 and marks 0 are allowed and mean
/// "not entered yet".
pub fn parse_subject(req: &Request, v: &Value, field: &str) -> Result<SubjectEntry, Value> {
    let Some(obj) = v.as_object() else {
        return Err(bad_field(
            req,
            field,
            format!("{} must be an object", field),
            Some(v),
        ));
    };
    let name = match obj.get("name") {
        Some(n) => subject_name(req, n, &format!("{}.name", field))?,
        None => String::new(),
    };
    let credits = match obj.get("credits") {
        Some(c) => int_in_range(req, c, &format!("{}.credits", field), 0, MAX_CREDITS)?,
        None => {
            return Err(bad_field(
                req,
                &format!("{}.credits", field),
                format!("missing {}.credits", field),
                None,
            ))
        }
    };
    let marks = match obj.get("marks") {
        Some(m) => int_in_range(req, m, &format!("{}.marks", field), 0, MAX_MARKS)?,
        None => 0,
    };
    Ok(SubjectEntry {
        name,
        credits,
        marks,
    })
}

pub fn parse_subjects(req: &Request) -> Result<Vec<SubjectEntry>, Value> {
    let Some(items) = req.params.get("subjects").and_then(|v| v.as_array()) else {
        return Err(err(
            &req.id,
            "bad_params",
            "subjects must be an array",
            None,
        ));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, v)| parse_subject(req, v, &format!("subjects[{}]", i)))
        .collect()
}

/// Accepts either bare SGPA numbers or `{semester?, sgpa}` objects.
pub fn parse_semesters(req: &Request) -> Result<Vec<SemesterEntry>, Value> {
    let Some(items) = req.params.get("semesters").and_then(|v| v.as_array()) else {
        return Err(err(
            &req.id,
            "bad_params",
            "semesters must be an array",
            None,
        ));
    };
    if items.len() > MAX_SEMESTERS {
        return Err(err(
            &req.id,
            "bad_params",
            format!("at most {} semesters", MAX_SEMESTERS),
            Some(json!({ "count": items.len() })),
        ));
    }

    let mut out = Vec::with_capacity(items.len());
    for (i, v) in items.iter().enumerate() {
        let field = format!("semesters[{}]", i);
        let default_index = i as i64 + 1;
        let entry = if v.is_number() {
            SemesterEntry {
                semester: default_index,
                sgpa: number_in_range(req, v, &field, 0.0, MAX_SGPA)?,
            }
        } else if let Some(obj) = v.as_object() {
            let Some(sgpa) = obj.get("sgpa") else {
                return Err(bad_field(
                    req,
                    &format!("{}.sgpa", field),
                    format!("missing {}.sgpa", field),
                    None,
                ));
            };
            let semester = match obj.get("semester") {
                None | Some(Value::Null) => default_index,
                Some(s) => int_in_range(
                    req,
                    s,
                    &format!("{}.semester", field),
                    1,
                    MAX_SEMESTERS as i64,
                )?,
            };
            SemesterEntry {
                semester,
                sgpa: number_in_range(req, sgpa, &format!("{}.sgpa", field), 0.0, MAX_SGPA)?,
            }
        } else {
            return Err(bad_field(
                req,
                &field,
                format!("{} must be a number or an object", field),
                Some(v),
            ));
        };
        out.push(entry);
    }
    Ok(out)
}

/// `params.date` as `YYYY-MM-DD`, today (local) when absent.
pub fn report_date(req: &Request) -> Result<NaiveDate, Value> {
    match optional_str(req, "date")? {
        None => Ok(chrono::Local::now().date_naive()),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| {
            bad_field(
                req,
                "date",
                format!("date must be YYYY-MM-DD: {}", e),
                Some(&Value::String(s.clone())),
            )
        }),
    }
}

pub fn session_err(req: &Request, e: SessionError) -> Value {
    err(&req.id, &e.code, e.message, None)
}
