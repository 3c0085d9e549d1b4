/// Per-entity state of an attached script. The VM resolves entry points
/// by unit name; dispatch state lives here so each entity initialises
/// independently even when entities share a script asset.
pub struct ScriptRuntime {
    pub unit: String,
    /// on-init has run for this entity.
    pub initialised: bool,
    /// A handler failed; dispatch to this script is suppressed until the
    /// flag is cleared (e.g. by a live-reload).
    pub errored: bool,
}

impl ScriptRuntime {
    pub fn new(unit: String) -> Self {
        ScriptRuntime {
            unit,
            initialised: false,
            errored: false,
        }
    }

    pub fn can_dispatch(&self) -> bool {
        !self.errored
    }

    pub fn clear_error(&mut self) {
        self.errored = false;
    }
}
