use crate::foundation::core::Canvas;

/// One state-change request from the controller.
///
/// All fields are optional; a request only touches the fields it carries.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StateChange {
    /// Toggle play/pause.
    pub playing: Option<bool>,
    /// New speed multiplier.
    pub speed: Option<f64>,
    /// Visibility of the hosting surface.
    pub visible: Option<bool>,
    /// Resize the display surface.
    pub size: Option<Canvas>,
    /// Compile and swap in a new program from this source text.
    pub program: Option<String>,
}

impl StateChange {
    /// A change that only sets the playing flag.
    pub fn playing(playing: bool) -> Self {
        Self {
            playing: Some(playing),
            ..Self::default()
        }
    }

    /// A change that only sets the speed.
    pub fn speed(speed: f64) -> Self {
        Self {
            speed: Some(speed),
            ..Self::default()
        }
    }

    /// A change that only swaps the program.
    pub fn program(source: impl Into<String>) -> Self {
        Self {
            program: Some(source.into()),
            ..Self::default()
        }
    }
}

/// Accumulates state changes between ticks, last-value-wins per field.
///
/// `size` and `program` are one-shot slots: they are remembered until applied
/// exactly once, then cleared. The queue is drained atomically at tick start
/// via [`PendingChanges::take`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PendingChanges {
    merged: StateChange,
    dirty: bool,
}

impl PendingChanges {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any change is waiting to be applied.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Merge one incoming change, field-wise, last value wins.
    pub fn merge(&mut self, change: StateChange) {
        if change.playing.is_some() {
            self.merged.playing = change.playing;
        }
        if change.speed.is_some() {
            self.merged.speed = change.speed;
        }
        if change.visible.is_some() {
            self.merged.visible = change.visible;
        }
        if change.size.is_some() {
            self.merged.size = change.size;
        }
        if change.program.is_some() {
            self.merged.program = change.program;
        }
        self.dirty = true;
    }

    /// Remember a pending resize (used by `register`, outside the protocol).
    pub fn queue_resize(&mut self, size: Canvas) {
        self.merged.size = Some(size);
        self.dirty = true;
    }

    /// Drain the accumulated change, leaving the queue empty.
    pub fn take(&mut self) -> Option<StateChange> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(std::mem::take(&mut self.merged))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playback/pending.rs"]
mod tests;
