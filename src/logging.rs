use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Value as JsonValue, json};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::planner::PlanEntry;

const LOG_FILE: &str = "rename_log.jsonl";
const MAX_ENTRIES: usize = 500;

#[derive(Debug, Serialize)]
pub struct ChangeLogEntry<'a> {
    pub timestamp: &'a str,
    pub action: &'a str,
    pub from: &'a Path,
    pub to: &'a Path,
}

/// Append-only audit trail of renames, kept to the last `MAX_ENTRIES` lines.
#[derive(Debug, Clone)]
pub struct ChangeLog {
    path: PathBuf,
}

impl ChangeLog {
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        Ok(Self {
            path: dir.join(LOG_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn record(&self, action: &str, entry: &PlanEntry) -> Result<()> {
        let timestamp = now_rfc3339();
        let line = ChangeLogEntry {
            timestamp: &timestamp,
            action,
            from: &entry.source,
            to: &entry.destination,
        };
        let json = serde_json::to_string(&line)?;
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)
            .with_context(|| format!("opening {}", self.path.display()))?;
        writeln!(file, "{json}")?;
        truncate_log(&self.path)
    }
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown".into())
}

fn truncate_log(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .read(true)
        .open(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let reader = BufReader::new(file);
    let lines: Vec<_> = reader.lines().collect::<Result<_, _>>()?;
    if lines.len() <= MAX_ENTRIES {
        return Ok(());
    }
    let keep = &lines[lines.len() - MAX_ENTRIES..];
    fs::write(path, keep.join("\n") + "\n")?;
    Ok(())
}

/// One machine-readable line per planned or applied rename.
pub fn json_event(action: &str, entry: &PlanEntry) -> JsonValue {
    json!({
        "action": action,
        "from": entry.source.display().to_string(),
        "to": entry.destination.display().to_string(),
        "old_name": entry.old_name,
        "new_name": entry.new_name,
    })
}
