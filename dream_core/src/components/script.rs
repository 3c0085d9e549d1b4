use std::sync::Mutex;

use log::error;
use uuid::Uuid;

use crate::entity::event::Event;
use crate::error::Result;

/// Entry points a script unit can expose.
#[derive(Debug)]
pub enum ScriptEntry<'a> {
    /// Runs once per entity, before the first update.
    Init,
    Update { delta_ms: i64 },
    Event { event: &'a Event },
    /// Runs once per frame against the scene's input script.
    Input,
}

impl ScriptEntry<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            ScriptEntry::Init => "on_init",
            ScriptEntry::Update { .. } => "on_update",
            ScriptEntry::Event { .. } => "on_event",
            ScriptEntry::Input => "on_input",
        }
    }
}

/// Seam to the script VM. Dispatch takes `&self` so a single VM guarded
/// by one coarse mutex can be shared across worker threads.
pub trait ScriptBackend: Send + Sync {
    /// Invoke `entry` of `unit` for `target`. Errors are reported to the
    /// caller, which flags the script and suppresses further dispatch.
    fn dispatch(&self, unit: &str, target: Uuid, entry: ScriptEntry) -> Result<()>;
}

/// VM stand-in that accepts every dispatch and does nothing.
#[derive(Default)]
pub struct NullScriptBackend;

impl ScriptBackend for NullScriptBackend {
    fn dispatch(&self, _unit: &str, _target: Uuid, _entry: ScriptEntry) -> Result<()> {
        Ok(())
    }
}

/// One recorded dispatch, for asserting call order in tests and for
/// tracing a scene headlessly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchRecord {
    pub unit: String,
    pub target: Uuid,
    pub entry: String,
    /// Sender of the delivered event, for on-event dispatches.
    pub event_sender: Option<Uuid>,
}

/// Backend that records every dispatch and can be told to fail specific
/// units, exercising the sticky-error path.
#[derive(Default)]
pub struct RecordingScriptBackend {
    calls: Mutex<Vec<DispatchRecord>>,
    failing_units: Mutex<Vec<String>>,
    failing_entries: Mutex<Vec<(String, String)>>,
}

impl RecordingScriptBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_unit(&self, unit: &str) {
        self.failing_units
            .lock()
            .expect("failing units poisoned")
            .push(unit.to_string());
    }

    /// Fail only one entry point of a unit, leaving the others working.
    pub fn fail_entry(&self, unit: &str, entry: &str) {
        self.failing_entries
            .lock()
            .expect("failing entries poisoned")
            .push((unit.to_string(), entry.to_string()));
    }

    /// Forget every configured failure, as a reloaded unit would.
    pub fn clear_failures(&self) {
        self.failing_units
            .lock()
            .expect("failing units poisoned")
            .clear();
        self.failing_entries
            .lock()
            .expect("failing entries poisoned")
            .clear();
    }

    pub fn calls(&self) -> Vec<DispatchRecord> {
        self.calls.lock().expect("call log poisoned").clone()
    }

    pub fn calls_for(&self, target: Uuid) -> Vec<DispatchRecord> {
        self.calls()
            .into_iter()
            .filter(|c| c.target == target)
            .collect()
    }
}

impl ScriptBackend for RecordingScriptBackend {
    fn dispatch(&self, unit: &str, target: Uuid, entry: ScriptEntry) -> Result<()> {
        let failing = self
            .failing_units
            .lock()
            .expect("failing units poisoned")
            .iter()
            .any(|u| u == unit)
            || self
                .failing_entries
                .lock()
                .expect("failing entries poisoned")
                .iter()
                .any(|(u, e)| u == unit && e == entry.name());
        if failing {
            error!("script unit '{}' raised in {}", unit, entry.name());
            return Err(crate::error::DreamError::Script(format!(
                "unit '{}' failed in {}",
                unit,
                entry.name()
            )));
        }
        let event_sender = match &entry {
            ScriptEntry::Event { event } => Some(event.sender),
            _ => None,
        };
        self.calls
            .lock()
            .expect("call log poisoned")
            .push(DispatchRecord {
                unit: unit.to_string(),
                target,
                entry: entry.name().to_string(),
                event_sender,
            });
        Ok(())
    }
}
