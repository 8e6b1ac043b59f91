use std::io::BufRead;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use wayfind_core::error::{Result, WayfindError};

/// One document ready for indexing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusDocument {
    pub text: String,
    pub source: String,
}

#[derive(Deserialize)]
struct RawRecord {
    text: String,
    #[serde(default)]
    source: Option<String>,
}

/// Load a JSONL corpus file into documents, capped at `limit` records.
///
/// Each line is a JSON object with a `text` field and an optional `source`
/// field; records without a source get a generated `doc_<line>` id.
/// Blank lines are skipped; malformed lines are skipped with a warning.
pub fn load_jsonl(path: &Path, limit: usize) -> Result<Vec<CorpusDocument>> {
    let file = std::fs::File::open(path)
        .map_err(|e| WayfindError::Config(format!("corpus file {}: {}", path.display(), e)))?;
    let reader = std::io::BufReader::new(file);

    let mut docs = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        if docs.len() >= limit {
            break;
        }
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RawRecord>(&line) {
            Ok(record) => {
                let source = record
                    .source
                    .unwrap_or_else(|| format!("doc_{}", line_no));
                docs.push(CorpusDocument {
                    text: record.text,
                    source,
                });
            }
            Err(e) => {
                warn!(line = line_no + 1, error = %e, "Skipping malformed corpus line");
            }
        }
    }

    debug!(count = docs.len(), path = %path.display(), "Corpus loaded");
    Ok(docs)
}
