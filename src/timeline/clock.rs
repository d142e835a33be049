/// Frame duration assumed before the first measured frame (1/60 s).
pub const DEFAULT_FRAME_DURATION: f64 = 1.0 / 60.0;

/// Frame floor used when reversed playback would drive counters negative.
///
/// The value is recovery policy, not a protocol guarantee; it is configurable
/// through [`Timeline::with_clamp_frames`].
pub const DEFAULT_CLAMP_FRAMES: f64 = 3600.0;

/// The `(duration, frame, time)` triple consumed by a single render call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameVars {
    /// Duration of this frame in seconds.
    pub duration: f64,
    /// Frame counter at the start of this frame.
    pub frame: f64,
    /// Program time at the start of this frame, in seconds.
    pub time: f64,
}

/// Playback timeline: translates scheduling intents into deterministic frame
/// variables without drift across pause/resume cycles.
///
/// Invariant: whenever the timeline is paused, `frame_count` is a whole
/// number. Fractional positions can only accumulate while playing at a
/// fractional speed; every speed/pause/step transition snaps back to the
/// nearest frame boundary first.
#[derive(Clone, Debug)]
pub struct Timeline {
    playing: bool,
    speed: f64,
    frame_count: f64,
    play_time: f64,
    last_duration: f64,
    last_render_wall_time: f64,
    clamp_frames: f64,
}

impl Timeline {
    /// Create a paused timeline anchored at wall time `now` (seconds).
    pub fn new(now: f64) -> Self {
        Self {
            playing: false,
            speed: 1.0,
            frame_count: 0.0,
            play_time: 0.0,
            last_duration: DEFAULT_FRAME_DURATION,
            last_render_wall_time: now - DEFAULT_FRAME_DURATION,
            clamp_frames: DEFAULT_CLAMP_FRAMES,
        }
    }

    /// Override the negative-playback clamp floor.
    pub fn with_clamp_frames(mut self, clamp_frames: f64) -> Self {
        self.clamp_frames = clamp_frames.max(0.0);
        self
    }

    /// Whether the timeline is currently advancing.
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Current speed multiplier (0, negative and fractional are all legal).
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Current frame counter.
    pub fn frame_count(&self) -> f64 {
        self.frame_count
    }

    /// Current program time in seconds.
    pub fn play_time(&self) -> f64 {
        self.play_time
    }

    /// Duration of the most recent frame in seconds.
    pub fn last_duration(&self) -> f64 {
        self.last_duration
    }

    /// Toggle play/pause at wall time `at`.
    ///
    /// Resuming anchors the wall-time reference to `at - last_duration`, so a
    /// tick landing right after the resume sees an elapsed time equal to the
    /// last known frame duration instead of the full pause gap.
    pub fn set_playing(&mut self, playing: bool, at: f64) {
        if playing == self.playing {
            return;
        }
        if playing {
            self.last_render_wall_time = at - self.last_duration;
        } else {
            self.snap_to_frame();
        }
        self.playing = playing;
    }

    /// Change the speed multiplier.
    ///
    /// Whole-number speeds first snap any fractional frame position to the
    /// nearest boundary, so they never leave playback mid-frame.
    pub fn set_speed(&mut self, speed: f64) {
        if speed.fract() == 0.0 {
            self.snap_to_frame();
        }
        self.speed = speed;
    }

    /// Rewind to frame zero. Legal at any time, including while playing.
    pub fn reset(&mut self, now: f64) {
        self.frame_count = 0.0;
        self.play_time = 0.0;
        self.last_duration = DEFAULT_FRAME_DURATION;
        self.last_render_wall_time = now - DEFAULT_FRAME_DURATION;
    }

    /// Advance exactly one frame. Stepping is a paused-only operation; this
    /// is a no-op while playing.
    pub fn step_next(&mut self) {
        self.step(1.0);
    }

    /// Retreat exactly one frame. No-op while playing.
    pub fn step_previous(&mut self) {
        self.step(-1.0);
    }

    fn step(&mut self, delta: f64) {
        if self.playing {
            return;
        }
        self.snap_to_frame();
        self.frame_count += delta;
        self.play_time += delta * self.last_duration;
        self.clamp_negative();
    }

    /// Compute the frame variables for the next render.
    ///
    /// Paused timelines are idempotent: repeated calls return identical
    /// triples, which lets the draw loop redraw without advancing. Playing
    /// timelines measure the elapsed wall time since the previous call,
    /// quantize it to suppress host scheduler jitter, advance the counters by
    /// `speed`, and return the pre-advance values paired with the
    /// just-computed duration.
    pub fn next_frame_vars(&mut self, at: f64) -> FrameVars {
        if !self.playing {
            return FrameVars {
                duration: self.last_duration,
                frame: self.frame_count,
                time: self.play_time,
            };
        }

        let mut elapsed = at - self.last_render_wall_time;
        if !(elapsed > 0.0) {
            // Host clock went backwards or the tick re-fired at the same
            // timestamp; fall back to the previous duration.
            elapsed = self.last_duration;
        }
        self.last_render_wall_time = at;
        self.last_duration = quantize_duration(elapsed);

        let vars = FrameVars {
            duration: self.last_duration,
            frame: self.frame_count,
            time: self.play_time,
        };

        self.frame_count += self.speed;
        self.play_time += elapsed * self.speed;
        self.clamp_negative();

        vars
    }

    fn snap_to_frame(&mut self) {
        let rounded = self.frame_count.round();
        self.play_time += (rounded - self.frame_count) * self.last_duration;
        self.frame_count = rounded;
    }

    // Saturating floor, not a wraparound: reversing past the origin jumps to
    // a fixed large frame at the current duration.
    fn clamp_negative(&mut self) {
        if self.frame_count < 0.0 || self.play_time < 0.0 {
            self.frame_count = self.clamp_frames;
            self.play_time = self.clamp_frames * self.last_duration;
        }
    }
}

/// Quantize a measured elapsed time to the nearest 1/10 of a 1-second
/// frame rate: `1 / (10 * round(1 / (elapsed * 10)))`.
///
/// A 16.9 ms tick and a 16.5 ms tick both map to 1/60 s, suppressing jitter
/// noise from the host's own scheduler. The lower bound keeps a long stall
/// from collapsing the implied rate to zero.
fn quantize_duration(elapsed: f64) -> f64 {
    let steps = (1.0 / (elapsed * 10.0)).round().max(1.0);
    1.0 / (10.0 * steps)
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/clock.rs"]
mod tests;
