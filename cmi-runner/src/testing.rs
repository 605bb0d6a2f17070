//! In-memory doubles of the remote services, shared by the service tests

use async_trait::async_trait;
use cmi_client::{
    ClientError, ImportJobApi, ImportedModelApi, InferenceApi, ModelHub, ObjectStore, Result,
};
use cmi_core::domain::import_job::{ImportJobSpec, JobHandle, JobSnapshot, JobStatus};
use cmi_core::domain::inference::{InferenceRequest, InferenceResult};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Asserts that paused-clock elapsed time matches the expected total sleep
pub fn assert_slept(elapsed: Duration, expected: Duration) {
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(100),
        "expected {:?} of sleep, got {:?}",
        expected,
        elapsed
    );
}

fn unavailable(message: &str) -> ClientError {
    ClientError::api_error(503, message)
}

type Scripted<T> = std::result::Result<T, String>;

// =============================================================================
// Inference
// =============================================================================

pub struct MockInference {
    script: Mutex<VecDeque<Scripted<JsonValue>>>,
    fallback: Option<Scripted<JsonValue>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, InferenceRequest)>>,
}

impl MockInference {
    pub fn new(script: Vec<Scripted<JsonValue>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn always_failing(message: &str) -> Self {
        Self {
            fallback: Some(Err(message.to_string())),
            ..Self::new(Vec::new())
        }
    }

    pub fn success(body: JsonValue) -> Scripted<JsonValue> {
        Ok(body)
    }

    pub fn failure(message: &str) -> Scripted<JsonValue> {
        Err(message.to_string())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<(String, InferenceRequest)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl InferenceApi for MockInference {
    async fn invoke_model(
        &self,
        model_id: &str,
        request: &InferenceRequest,
    ) -> Result<InferenceResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .unwrap()
            .push((model_id.to_string(), request.clone()));

        let next = self.script.lock().unwrap().pop_front();
        let outcome = next
            .or_else(|| self.fallback.clone())
            .expect("inference called more often than scripted");

        outcome
            .map(|body| InferenceResult::new(body, HashMap::new()))
            .map_err(|message| unavailable(&message))
    }
}

// =============================================================================
// Import jobs
// =============================================================================

pub struct MockJobApi {
    submit: Scripted<JobHandle>,
    statuses: Mutex<VecDeque<Scripted<JobSnapshot>>>,
    submits: AtomicUsize,
    queries: AtomicUsize,
}

impl MockJobApi {
    pub fn new(statuses: Vec<JobStatus>) -> Self {
        Self::with_snapshots(
            statuses
                .into_iter()
                .map(|s| Ok(JobSnapshot::with_status(s)))
                .collect(),
        )
    }

    pub fn with_snapshots(statuses: Vec<Scripted<JobSnapshot>>) -> Self {
        Self {
            submit: Ok(JobHandle::new("arn:aws:bedrock:us-east-1:123456789012:model-import-job/test")),
            statuses: Mutex::new(statuses.into()),
            submits: AtomicUsize::new(0),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn rejecting_submission(message: &str) -> Self {
        Self {
            submit: Err(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImportJobApi for MockJobApi {
    async fn submit(&self, _spec: &ImportJobSpec) -> Result<JobHandle> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        self.submit
            .clone()
            .map_err(|message| ClientError::api_error(400, message))
    }

    async fn status(&self, _handle: &JobHandle) -> Result<JobSnapshot> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .expect("status polled more often than scripted")
            .map_err(|message| unavailable(&message))
    }
}

// =============================================================================
// Imported models
// =============================================================================

#[derive(Default)]
pub struct MockModels {
    fail: bool,
    deleted: Mutex<Vec<String>>,
}

impl MockModels {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImportedModelApi for MockModels {
    async fn delete_imported_model(&self, model_id: &str) -> Result<()> {
        if self.fail {
            return Err(ClientError::NotFound(model_id.to_string()));
        }
        self.deleted.lock().unwrap().push(model_id.to_string());
        Ok(())
    }
}

// =============================================================================
// Object storage
// =============================================================================

#[derive(Default)]
pub struct MockStore {
    existing: Mutex<HashSet<String>>,
    listed: Vec<String>,
    /// Zero-based index of the delete batch that fails
    fail_batch: Option<usize>,
    uploads: Mutex<Vec<(String, String, PathBuf)>>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl MockStore {
    pub fn with_existing(keys: &[&str]) -> Self {
        Self {
            existing: Mutex::new(keys.iter().map(|k| k.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn with_listed(keys: Vec<String>) -> Self {
        Self {
            listed: keys,
            ..Self::default()
        }
    }

    pub fn failing_batch(mut self, index: usize) -> Self {
        self.fail_batch = Some(index);
        self
    }

    pub fn uploads(&self) -> Vec<(String, String, PathBuf)> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn exists(&self, _bucket: &str, key: &str) -> Result<bool> {
        Ok(self.existing.lock().unwrap().contains(key))
    }

    async fn upload_file(&self, bucket: &str, key: &str, path: &Path) -> Result<()> {
        self.uploads
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string(), path.to_path_buf()));
        self.existing.lock().unwrap().insert(key.to_string());
        Ok(())
    }

    async fn list_keys(&self, _bucket: &str, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .listed
            .iter()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete_keys(&self, _bucket: &str, keys: &[String]) -> Result<()> {
        let mut batches = self.batches.lock().unwrap();
        if self.fail_batch == Some(batches.len()) {
            return Err(unavailable("SlowDown"));
        }
        batches.push(keys.to_vec());
        Ok(())
    }
}

// =============================================================================
// Model hub
// =============================================================================

pub struct MockHub {
    files: Vec<(String, Vec<u8>)>,
    downloads: AtomicUsize,
}

impl MockHub {
    pub fn new(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(name, content)| (name.to_string(), content.as_bytes().to_vec()))
                .collect(),
            downloads: AtomicUsize::new(0),
        }
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ModelHub for MockHub {
    async fn list_files(&self, _repo_id: &str) -> Result<Vec<String>> {
        Ok(self.files.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn download_file(&self, _repo_id: &str, filename: &str, dest: &Path) -> Result<u64> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let (_, content) = self
            .files
            .iter()
            .find(|(name, _)| name == filename)
            .ok_or_else(|| ClientError::NotFound(filename.to_string()))?;

        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(dest, content)?;
        Ok(content.len() as u64)
    }
}
