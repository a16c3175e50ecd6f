use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

pub const SETTINGS_FILE_NAME: &str = "gradecalcd.json";

pub const DEFAULT_REPORT_TITLE: &str = "VTU GRADE REPORT";
pub const DEFAULT_FOOTER_LINES: [&str; 2] = [
    "Generated by VTU Vault - Your Academic Companion",
    "This is a computer-generated report",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportSettings {
    pub title: String,
    pub footer_lines: Vec<String>,
    pub reports_dir: String,
    pub subject_name_width: usize,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            title: DEFAULT_REPORT_TITLE.to_string(),
            footer_lines: DEFAULT_FOOTER_LINES.iter().map(|s| s.to_string()).collect(),
            reports_dir: "reports".to_string(),
            subject_name_width: 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalculatorSettings {
    pub default_credits: i64,
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        Self { default_credits: 3 }
    }
}

pub fn settings_path(workspace: &Path) -> PathBuf {
    workspace.join(SETTINGS_FILE_NAME)
}

/// Whole settings document; a missing file reads as empty.
pub fn read_settings(workspace: &Path) -> anyhow::Result<Map<String, Value>> {
    let path = settings_path(workspace);
    if !path.is_file() {
        return Ok(Map::new());
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
    if text.trim().is_empty() {
        return Ok(Map::new());
    }
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.to_string_lossy()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(anyhow::anyhow!(
            "{} must contain a JSON object",
            path.to_string_lossy()
        )),
    }
}

pub fn settings_get_json(workspace: &Path, key: &str) -> anyhow::Result<Option<Value>> {
    Ok(read_settings(workspace)?.remove(key))
}

pub fn settings_set_json(workspace: &Path, key: &str, value: &Value) -> anyhow::Result<()> {
    let mut doc = read_settings(workspace)?;
    doc.insert(key.to_string(), value.clone());

    let path = settings_path(workspace);
    let tmp = path.with_extension("json.tmp");
    let text = serde_json::to_string_pretty(&Value::Object(doc))
        .context("failed to serialize settings")?;
    std::fs::write(&tmp, text)
        .with_context(|| format!("failed to write {}", tmp.to_string_lossy()))?;
    std::fs::rename(&tmp, &path)
        .with_context(|| format!("failed to replace {}", path.to_string_lossy()))?;
    Ok(())
}
