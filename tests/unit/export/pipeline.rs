use super::*;
use crate::engine::stub::StubEngine;
use crate::export::encoder::{BitrateMode, ChromaSubsampling, MemoryEncoder, VideoCodec};
use crate::export::ffmpeg::{FfmpegEncoder, FfmpegEncoderOpts};

fn params(frame_count: u64) -> ExportParams {
    ExportParams {
        source: "pixels".to_owned(),
        program_id: ProgramId(7),
        frame_count,
        config: VideoEncoderConfig {
            width: 64,
            height: 64,
            fps: 60,
            bitrate: 1_000_000,
            bitrate_mode: BitrateMode::Variable,
            codec: VideoCodec::Vp9,
            subsampling: ChromaSubsampling::S420,
        },
    }
}

#[test]
fn rejects_zero_frame_count() {
    assert!(ExportJob::new(params(0)).is_err());
}

#[test]
fn rejects_invalid_config() {
    let mut p = params(10);
    p.config.fps = 0;
    assert!(ExportJob::new(p).is_err());
}

#[test]
fn full_export_hits_keyframe_and_flush_cadence() {
    let mut engine = StubEngine::new();
    let mut encoder = MemoryEncoder::new();
    let mut job = ExportJob::new(params(300)).unwrap();
    assert_eq!(job.phase(), ExportPhase::Compiling);

    let mut reported = Vec::new();
    let outcome = job.run(&mut engine, &mut encoder, &CancelToken::new(), |done| {
        reported.push(done);
    });

    let ExportOutcome::Finished(bytes) = outcome else {
        panic!("expected Finished, got {outcome:?}");
    };
    assert_eq!(job.phase(), ExportPhase::Finished);
    assert_eq!(&bytes[..4], b"PCV0");

    assert_eq!(encoder.frames, 300);
    assert_eq!(encoder.keyframes, vec![0, 64, 128, 192, 256]);
    // One in-flight flush at frame 256 plus the finalizing flush.
    assert_eq!(encoder.flushes, 2);

    // Progress is strictly increasing and always ends on the total.
    assert!(reported.windows(2).all(|w| w[0] < w[1]), "{reported:?}");
    assert_eq!(reported.last(), Some(&300));

    // Every region was consumed and the program was released.
    let stats = engine.memory_stats();
    assert_eq!(stats.runs, 300);
    assert_eq!(stats.live_regions, 0);
    assert_eq!(stats.live_programs, 0);
}

#[test]
fn render_failure_aborts_without_leaking() {
    let mut engine = StubEngine::new();
    engine.fail_frames.insert(150);
    let mut encoder = MemoryEncoder::new();
    let mut job = ExportJob::new(params(300)).unwrap();

    let outcome = job.run(&mut engine, &mut encoder, &CancelToken::new(), |_| {});

    assert_eq!(
        outcome,
        ExportOutcome::Failed("render failed at frame 150".to_owned())
    );
    assert_eq!(job.phase(), ExportPhase::Failed);
    assert_eq!(encoder.frames, 150);

    let stats = engine.memory_stats();
    assert_eq!(stats.live_regions, 0);
    assert_eq!(stats.live_programs, 0, "program released on the failure path");
}

#[test]
fn compile_failure_fails_before_any_frame() {
    let mut engine = StubEngine::new();
    let mut encoder = MemoryEncoder::new();
    let mut p = params(10);
    p.source = "broken #error".to_owned();
    let mut job = ExportJob::new(p).unwrap();

    let outcome = job.run(&mut engine, &mut encoder, &CancelToken::new(), |_| {});

    let ExportOutcome::Failed(message) = outcome else {
        panic!("expected Failed, got {outcome:?}");
    };
    assert!(message.starts_with("compilation failed"), "{message}");
    assert_eq!(engine.run_calls(), 0);
    assert_eq!(encoder.frames, 0);
}

#[test]
fn pre_cancelled_token_stops_before_the_first_frame() {
    let mut engine = StubEngine::new();
    let mut encoder = MemoryEncoder::new();
    let mut job = ExportJob::new(params(300)).unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let outcome = job.run(&mut engine, &mut encoder, &cancel, |_| {});

    assert_eq!(outcome, ExportOutcome::Cancelled);
    assert_eq!(job.phase(), ExportPhase::Cancelled);
    assert_eq!(engine.run_calls(), 0);
    assert_eq!(engine.memory_stats().live_programs, 0);
}

#[test]
fn cancel_is_idempotent() {
    let cancel = CancelToken::new();
    assert!(!cancel.is_cancelled());
    cancel.cancel();
    cancel.cancel();
    assert!(cancel.is_cancelled());

    // Clones observe the same flag.
    let other = cancel.clone();
    assert!(other.is_cancelled());
}

#[test]
fn service_hook_runs_at_every_frame_boundary() {
    let mut engine = StubEngine::new();
    let mut encoder = MemoryEncoder::new();
    let mut job = ExportJob::new(params(25)).unwrap();

    let mut services = 0u64;
    let outcome = job.run_serviced(
        &mut engine,
        &mut encoder,
        &CancelToken::new(),
        |_| {},
        || services += 1,
    );

    assert!(matches!(outcome, ExportOutcome::Finished(_)));
    assert_eq!(services, 25, "one service call per frame boundary");
}

#[test]
fn cancellation_from_the_service_hook_takes_effect_next_frame() {
    let mut engine = StubEngine::new();
    let mut encoder = MemoryEncoder::new();
    let mut job = ExportJob::new(params(300)).unwrap();

    let cancel = CancelToken::new();
    let hook_cancel = cancel.clone();
    let mut boundaries = 0u64;
    let outcome = job.run_serviced(&mut engine, &mut encoder, &cancel, |_| {}, || {
        boundaries += 1;
        if boundaries == 10 {
            hook_cancel.cancel();
        }
    });

    assert_eq!(outcome, ExportOutcome::Cancelled);
    assert_eq!(job.phase(), ExportPhase::Cancelled);
    // The hook runs before the cancellation check, so frame 10 never renders.
    assert_eq!(engine.run_calls(), 9);
    assert_eq!(engine.memory_stats().live_programs, 0);
}

#[test]
fn frame_times_follow_the_configured_fps() {
    struct TimestampProbe {
        inner: MemoryEncoder,
        timestamps: Vec<f64>,
    }
    impl VideoEncoder for TimestampProbe {
        fn supports(&self, cfg: &VideoEncoderConfig) -> bool {
            self.inner.supports(cfg)
        }
        fn begin(&mut self, cfg: &VideoEncoderConfig) -> crate::foundation::error::PlaycastResult<()> {
            self.inner.begin(cfg)
        }
        fn encode(
            &mut self,
            frame: &PixelFrame,
            timestamp: f64,
            keyframe: bool,
        ) -> crate::foundation::error::PlaycastResult<()> {
            self.timestamps.push(timestamp);
            self.inner.encode(frame, timestamp, keyframe)
        }
        fn flush(&mut self) -> crate::foundation::error::PlaycastResult<()> {
            self.inner.flush()
        }
        fn finish(&mut self) -> crate::foundation::error::PlaycastResult<Vec<u8>> {
            self.inner.finish()
        }
    }

    let mut engine = StubEngine::new();
    let mut encoder = TimestampProbe {
        inner: MemoryEncoder::new(),
        timestamps: Vec::new(),
    };
    let mut p = params(4);
    p.config.fps = 30;
    let mut job = ExportJob::new(p).unwrap();

    let outcome = job.run(&mut engine, &mut encoder, &CancelToken::new(), |_| {});
    assert!(matches!(outcome, ExportOutcome::Finished(_)));

    let expected: Vec<f64> = (0..4).map(|n| n as f64 / 30.0).collect();
    assert_eq!(encoder.timestamps, expected);
}

#[test]
fn unsupported_encoder_config_fails_up_front() {
    let mut engine = StubEngine::new();
    // libvpx VP8 cannot produce 4:4:4 output.
    let mut encoder = FfmpegEncoder::new(FfmpegEncoderOpts::default());
    let mut p = params(10);
    p.config.codec = VideoCodec::Vp8;
    p.config.subsampling = ChromaSubsampling::S444;
    let mut job = ExportJob::new(p).unwrap();

    let outcome = job.run(&mut engine, &mut encoder, &CancelToken::new(), |_| {});
    assert_eq!(
        outcome,
        ExportOutcome::Failed("unsupported encoder configuration".to_owned())
    );
    assert_eq!(engine.run_calls(), 0);
}
