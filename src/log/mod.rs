use chrono::Utc;
use fs_err as fs;
use serde_json::{json, to_string_pretty, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use crate::wire::GenerateContentRequest;

pub struct SavedPaths {
    pub dir: PathBuf,
    pub request: Option<PathBuf>,
    pub response: Option<PathBuf>,
}

fn session_dir(root: &Path, session: Uuid) -> PathBuf {
    root.join(".sitegen").join("session").join(session.to_string())
}

/// Writes each exchange's request body and raw response under
/// `<root>/.sitegen/session/<uuid>/`. The API key travels in the URL and is
/// never part of what gets written.
pub struct Transcript {
    dir: PathBuf,
    save_request: bool,
    save_response: bool,
    seq: AtomicUsize,
}

impl Transcript {
    pub fn new(root: &Path, session: Uuid, save_request: bool, save_response: bool) -> Self {
        Self {
            dir: session_dir(root, session),
            save_request,
            save_response,
            seq: AtomicUsize::new(0),
        }
    }

    pub fn enabled(&self) -> bool {
        self.save_request || self.save_response
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn save_stage(
        &self,
        stage: &str,
        req: &GenerateContentRequest,
        status: u16,
        raw_response: &str,
    ) -> anyhow::Result<SavedPaths> {
        let n = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        fs::create_dir_all(&self.dir)?;

        let mut request_path = None;
        let mut response_path = None;

        if self.save_request {
            let p = self.dir.join(format!("{n:03}-{stage}.request.json"));
            fs::write(&p, to_string_pretty(req)?)?;
            request_path = Some(p);
        }

        if self.save_response {
            let p = self.dir.join(format!("{n:03}-{stage}.response.json"));
            let body = serde_json::from_str::<Value>(raw_response)
                .unwrap_or_else(|_| Value::String(raw_response.to_string()));
            let doc = json!({
                "saved_at": Utc::now(),
                "status": status,
                "body": body,
            });
            fs::write(&p, to_string_pretty(&doc)?)?;
            response_path = Some(p);
        }

        Ok(SavedPaths { dir: self.dir.clone(), request: request_path, response: response_path })
    }
}

pub fn log_saved_paths(stage: &str, saved: &SavedPaths) {
    tracing::debug!(stage, dir = %saved.dir.display(), "transcript directory");
    match &saved.request {
        Some(p) => tracing::debug!(stage, path = %p.display(), "request saved"),
        None => tracing::debug!(stage, "request not saved (flag off)"),
    }
    match &saved.response {
        Some(p) => tracing::debug!(stage, path = %p.display(), "response saved"),
        None => tracing::debug!(stage, "response not saved (flag off)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::GenerationRequest;

    #[test]
    fn stages_are_numbered_and_split_by_flag() {
        let dir = tempfile::tempdir().unwrap();
        let session = Uuid::new_v4();
        let t = Transcript::new(dir.path(), session, true, false);
        let req = GenerationRequest::fresh("a cafe").to_wire();

        let first = t.save_stage("generate", &req, 200, "{}").unwrap();
        let second = t.save_stage("refine", &req, 200, "{}").unwrap();

        assert!(first.request.as_ref().unwrap().ends_with("001-generate.request.json"));
        assert!(second.request.as_ref().unwrap().ends_with("002-refine.request.json"));
        assert!(first.response.is_none());
        assert!(t.dir().ends_with(session.to_string()));

        let saved: Value =
            serde_json::from_str(&fs::read_to_string(first.request.unwrap()).unwrap()).unwrap();
        assert_eq!(saved["generationConfig"]["topK"], 32);
    }

    #[test]
    fn non_json_responses_are_kept_as_text() {
        let dir = tempfile::tempdir().unwrap();
        let t = Transcript::new(dir.path(), Uuid::new_v4(), false, true);
        let req = GenerationRequest::fresh("x").to_wire();

        let saved = t.save_stage("generate", &req, 502, "Bad Gateway").unwrap();
        let doc: Value =
            serde_json::from_str(&fs::read_to_string(saved.response.unwrap()).unwrap()).unwrap();
        assert_eq!(doc["status"], 502);
        assert_eq!(doc["body"], "Bad Gateway");
    }
}
