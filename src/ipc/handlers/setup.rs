use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::settings::{self, CalculatorSettings, ReportSettings};
use serde_json::{json, Map, Value};
use std::path::Path;

#[derive(Clone, Copy)]
enum SetupSection {
    Reports,
    Calculator,
}

impl SetupSection {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "reports" => Some(Self::Reports),
            "calculator" => Some(Self::Calculator),
            _ => None,
        }
    }

    fn key(self) -> &'static str {
        match self {
            Self::Reports => "setup.reports",
            Self::Calculator => "setup.calculator",
        }
    }
}

fn default_section(section: SetupSection) -> Value {
    match section {
        SetupSection::Reports => json!(ReportSettings::default()),
        SetupSection::Calculator => json!(CalculatorSettings::default()),
    }
}

fn as_object_mut(value: &mut Value) -> Result<&mut Map<String, Value>, String> {
    value
        .as_object_mut()
        .ok_or_else(|| "internal setup object must be a JSON object".to_string())
}

fn parse_i64_range(v: &Value, key: &str, min: i64, max: i64) -> Result<i64, String> {
    let n = v
        .as_i64()
        .ok_or_else(|| format!("{} must be integer", key))?;
    if !(min..=max).contains(&n) {
        return Err(format!("{} must be in {}..={}", key, min, max));
    }
    Ok(n)
}

fn parse_string_max(v: &Value, key: &str, max_len: usize) -> Result<String, String> {
    let s = v.as_str().ok_or_else(|| format!("{} must be string", key))?;
    let s = s.trim();
    if s.len() > max_len {
        return Err(format!("{} length must be <= {}", key, max_len));
    }
    Ok(s.to_string())
}

fn parse_reports_dir(v: &Value, key: &str) -> Result<String, String> {
    let s = parse_string_max(v, key, 64)?;
    if s.is_empty() {
        return Err(format!("{} must not be empty", key));
    }
    let p = Path::new(&s);
    let escapes = p
        .components()
        .any(|c| matches!(c, std::path::Component::ParentDir));
    if p.is_absolute() || escapes {
        return Err(format!("{} must be a relative path inside the workspace", key));
    }
    Ok(s)
}

fn merge_section_patch(
    section: SetupSection,
    current: &mut Value,
    patch: &Map<String, Value>,
) -> Result<(), String> {
    let obj = as_object_mut(current)?;
    for (k, v) in patch {
        match section {
            SetupSection::Reports => match k.as_str() {
                "title" => {
                    let s = parse_string_max(v, k, 80)?;
                    if s.is_empty() {
                        return Err(format!("{} must not be empty", k));
                    }
                    obj.insert(k.clone(), Value::String(s));
                }
                "footerLines" => {
                    let Some(items) = v.as_array() else {
                        return Err(format!("{} must be an array of strings", k));
                    };
                    if items.len() > 4 {
                        return Err(format!("{} must have at most 4 lines", k));
                    }
                    let mut lines = Vec::with_capacity(items.len());
                    for item in items {
                        lines.push(Value::String(parse_string_max(item, k, 120)?));
                    }
                    obj.insert(k.clone(), Value::Array(lines));
                }
                "reportsDir" => {
                    obj.insert(k.clone(), Value::String(parse_reports_dir(v, k)?));
                }
                "subjectNameWidth" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 8, 60)?));
                }
                _ => return Err(format!("unknown reports field: {}", k)),
            },
            SetupSection::Calculator => match k.as_str() {
                "defaultCredits" => {
                    obj.insert(k.clone(), Value::from(parse_i64_range(v, k, 1, 6)?));
                }
                _ => return Err(format!("unknown calculator field: {}", k)),
            },
        }
    }
    Ok(())
}

fn load_section(workspace: &Path, section: SetupSection) -> anyhow::Result<Value> {
    let mut current = default_section(section);
    if let Some(saved) = settings::settings_get_json(workspace, section.key())? {
        if let Some(saved_obj) = saved.as_object() {
            // Best-effort apply: a bad stored value should not block setup.
            if let Err(msg) = merge_section_patch(section, &mut current, saved_obj) {
                tracing::warn!(section = section.key(), %msg, "ignoring stored setting");
            }
        }
    }
    Ok(current)
}

fn typed_section<T>(state: &AppState, section: SetupSection) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    let Some(workspace) = state.workspace.as_deref() else {
        return T::default();
    };
    let value = match load_section(workspace, section) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(
                section = section.key(),
                error = %format!("{e:#}"),
                "using defaults"
            );
            return T::default();
        }
    };
    serde_json::from_value(value).unwrap_or_default()
}

/// Report layout settings for the selected workspace, defaults otherwise.
pub fn report_settings(state: &AppState) -> ReportSettings {
    typed_section(state, SetupSection::Reports)
}

pub fn calculator_settings(state: &AppState) -> CalculatorSettings {
    typed_section(state, SetupSection::Calculator)
}

fn handle_setup_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = state.workspace.as_deref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let reports = match load_section(workspace, SetupSection::Reports) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "io_failed", format!("{e:#}"), None),
    };
    let calculator = match load_section(workspace, SetupSection::Calculator) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "io_failed", format!("{e:#}"), None),
    };

    ok(
        &req.id,
        json!({
            "reports": reports,
            "calculator": calculator
        }),
    )
}

fn handle_setup_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(workspace) = state.workspace.as_deref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let Some(section_raw) = req.params.get("section").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing section", None);
    };
    let Some(section) = SetupSection::parse(section_raw) else {
        return err(&req.id, "bad_params", "unknown section", None);
    };
    let Some(patch_obj) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "patch must be an object", None);
    };

    let mut current = match load_section(workspace, section) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "io_failed", format!("{e:#}"), None),
    };
    if let Err(msg) = merge_section_patch(section, &mut current, patch_obj) {
        return err(&req.id, "bad_params", msg, None);
    }
    if let Err(e) = settings::settings_set_json(workspace, section.key(), &current) {
        return err(&req.id, "io_failed", format!("{e:#}"), None);
    }
    tracing::info!(section = section.key(), "settings updated");
    let mut result = json!({ "ok": true });
    result[section_raw] = current;
    ok(&req.id, result)
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "setup.get" => Some(handle_setup_get(state, req)),
        "setup.update" => Some(handle_setup_update(state, req)),
        _ => None,
    }
}
