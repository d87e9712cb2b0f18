//! Recording collaborators and a scripted prober for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::time::Instant;

use crate::dispatch::{Notifier, NotifyError, ResultSink, SinkError};
use crate::health::probe::{ProbeError, Prober};
use crate::health::result::ProbeResult;
use crate::health::target::TargetSpec;

/// One scripted probe reply.
#[derive(Debug, Clone)]
pub enum Step {
    Status(u16),
    Fail(&'static str),
    Panic,
}

/// Replays per-URL scripts; answers `200` once a script runs out.
#[derive(Default)]
pub struct ScriptedProber {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<HashMap<String, Vec<Instant>>>,
    delay: Mutex<Duration>,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(self, url: &str, steps: Vec<Step>) -> Self {
        self.scripts.lock().unwrap().insert(url.to_string(), steps.into());
        self
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn call_times(&self, url: &str) -> Vec<Instant> {
        self.calls.lock().unwrap().get(url).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, target: &TargetSpec) -> Result<StatusCode, ProbeError> {
        self.calls
            .lock()
            .unwrap()
            .entry(target.url.clone())
            .or_default()
            .push(Instant::now());
        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&target.url)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Step::Status(200));
        let delay = *self.delay.lock().unwrap();

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match step {
            Step::Status(code) => Ok(StatusCode::from_u16(code).unwrap()),
            Step::Fail(message) => Err(ProbeError::Transport(message.to_string())),
            Step::Panic => panic!("injected probe fault"),
        }
    }
}

pub struct RecordingNotifier {
    name: String,
    seen: Mutex<Vec<ProbeResult>>,
}

impl RecordingNotifier {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn results(&self) -> Vec<ProbeResult> {
        self.seen.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.results().into_iter().map(|r| r.message).collect()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify(&self, result: &ProbeResult) -> Result<(), NotifyError> {
        self.seen.lock().unwrap().push(result.clone());
        Ok(())
    }
}

pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    fn name(&self) -> &str {
        "failing"
    }

    async fn notify(&self, _result: &ProbeResult) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected {
            status: 500,
            body: "boom".into(),
        })
    }
}

pub struct RecordingSink {
    name: String,
    seen: Mutex<Vec<ProbeResult>>,
    closed: AtomicUsize,
}

impl RecordingSink {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            seen: Mutex::new(Vec::new()),
            closed: AtomicUsize::new(0),
        }
    }

    pub fn results(&self) -> Vec<ProbeResult> {
        self.seen.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResultSink for RecordingSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&self, result: &ProbeResult) -> Result<(), SinkError> {
        self.seen.lock().unwrap().push(result.clone());
        Ok(())
    }

    async fn close(&self) -> Result<(), SinkError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FailingSink;

#[async_trait]
impl ResultSink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    async fn write(&self, _result: &ProbeResult) -> Result<(), SinkError> {
        Err(SinkError::Io(std::io::Error::other("disk full")))
    }
}
