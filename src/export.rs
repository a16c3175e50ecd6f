use anyhow::Context;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub bytes: usize,
    pub sha256: String,
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Writes a rendered report to `out_dir/file_name`, replacing any previous
/// file of the same name.
pub fn write_report(out_dir: &Path, file_name: &str, text: &str) -> anyhow::Result<ExportSummary> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create directory {}", out_dir.to_string_lossy()))?;

    let out_path = out_dir.join(file_name);
    let tmp_path = out_dir.join(format!(".{}.partial", file_name));
    std::fs::write(&tmp_path, text.as_bytes())
        .with_context(|| format!("failed to write {}", tmp_path.to_string_lossy()))?;
    std::fs::rename(&tmp_path, &out_path).with_context(|| {
        format!(
            "failed to move report into place at {}",
            out_path.to_string_lossy()
        )
    })?;

    Ok(ExportSummary {
        path: out_path,
        bytes: text.len(),
        sha256: sha256_hex(text.as_bytes()),
    })
}
