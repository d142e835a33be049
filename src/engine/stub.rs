use crate::engine::backend::{FrameRegion, MemoryStats, ProgramId, RenderEngine, RunVars};
use crate::foundation::error::{PlaycastError, PlaycastResult};
use std::collections::{HashMap, HashSet};

/// In-memory engine for tests and debugging.
///
/// Pixels are a pure function of `(frame, width, height)`, so two stubs fed
/// the same inputs produce byte-identical frames. Failure paths are
/// scriptable: sources containing [`StubEngine::COMPILE_ERROR_MARKER`] fail
/// to compile, and frame indices listed in `fail_frames` make `run` return
/// `Ok(None)`.
#[derive(Debug, Default)]
pub struct StubEngine {
    programs: HashSet<ProgramId>,
    regions: HashMap<u64, Vec<u8>>,
    next_region: u64,
    runs: u64,
    logs: Vec<String>,
    /// Whole frame indices for which `run` reports a transient failure.
    pub fail_frames: HashSet<u64>,
}

impl StubEngine {
    /// Sources containing this marker are rejected by `compile`.
    pub const COMPILE_ERROR_MARKER: &'static str = "#error";

    /// Create an empty stub engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of regions issued by `run` and not yet consumed.
    pub fn outstanding_regions(&self) -> u64 {
        self.regions.len() as u64
    }

    /// Number of compiled programs not yet released.
    pub fn outstanding_programs(&self) -> u64 {
        self.programs.len() as u64
    }

    /// Total `run` calls served, successful or not.
    pub fn run_calls(&self) -> u64 {
        self.runs
    }

    fn fill(vars: RunVars) -> Vec<u8> {
        let len = (vars.width as usize) * (vars.height as usize) * 4;
        let mut data = vec![0u8; len];
        let f = vars.frame.floor().rem_euclid(256.0) as u8;
        for (i, px) in data.chunks_exact_mut(4).enumerate() {
            px[0] = f;
            px[1] = (i % 256) as u8;
            px[2] = ((i / 256) % 256) as u8;
            px[3] = 255;
        }
        data
    }
}

impl RenderEngine for StubEngine {
    fn compile(&mut self, id: ProgramId, source: &str) -> PlaycastResult<ProgramId> {
        if source.contains(Self::COMPILE_ERROR_MARKER) {
            self.logs.push(format!("compile error in program {}", id.0));
            return Err(PlaycastError::compile(format!(
                "program {} contains '{}'",
                id.0,
                Self::COMPILE_ERROR_MARKER
            )));
        }
        self.programs.insert(id);
        self.logs.push(format!("compiled program {}", id.0));
        Ok(id)
    }

    fn run(&mut self, program: ProgramId, vars: RunVars) -> PlaycastResult<Option<FrameRegion>> {
        if !self.programs.contains(&program) {
            return Err(PlaycastError::protocol(format!(
                "run on unknown program {}",
                program.0
            )));
        }
        self.runs += 1;
        if self.fail_frames.contains(&(vars.frame.floor() as u64)) {
            return Ok(None);
        }

        let data = Self::fill(vars);
        let id = self.next_region;
        self.next_region += 1;
        let byte_len = data.len();
        self.regions.insert(id, data);
        Ok(Some(FrameRegion { id, byte_len }))
    }

    fn copy_out(&mut self, region: FrameRegion) -> PlaycastResult<Vec<u8>> {
        self.regions.remove(&region.id).ok_or_else(|| {
            PlaycastError::protocol(format!(
                "region {} released twice or never issued",
                region.id
            ))
        })
    }

    fn release(&mut self, region: FrameRegion) -> PlaycastResult<()> {
        self.copy_out(region).map(|_| ())
    }

    fn release_program(&mut self, program: ProgramId) -> PlaycastResult<()> {
        if !self.programs.remove(&program) {
            return Err(PlaycastError::protocol(format!(
                "program {} released twice or never compiled",
                program.0
            )));
        }
        Ok(())
    }

    fn flush_logs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.logs)
    }

    fn memory_stats(&self) -> MemoryStats {
        MemoryStats {
            live_programs: self.programs.len() as u64,
            live_regions: self.regions.len() as u64,
            runs: self.runs,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/stub.rs"]
mod tests;
