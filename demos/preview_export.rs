use std::time::Duration;

use playcast::{
    ActionKind, ActionPayload, BitrateMode, CancelToken, Canvas, ChromaSubsampling, EngineHandle,
    ExportParams, MemoryEncoder, MemorySurface, ProgramId, Request, Response, StateChange,
    StubEngine, Surface, VideoCodec, VideoEncoderConfig,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let handle = EngineHandle::spawn(StubEngine::new());
    handle.send(Request::Init)?;
    let response = handle.recv_timeout(Duration::from_secs(5))?;
    println!("init: {response:?}");

    let size = Canvas {
        width: 320,
        height: 180,
    };
    let surface: Box<dyn Surface> = Box::new(MemorySurface::new(size));
    handle.send(Request::Register { surface, size })?;
    handle.send(Request::State(StateChange::program("demo")))?;
    handle.send(Request::State(StateChange::playing(true)))?;

    // Let the preview run for half a second, then query telemetry.
    std::thread::sleep(Duration::from_millis(500));
    handle.send(Request::Action {
        request_id: 1,
        kind: ActionKind::FetchResourceUsage,
    })?;
    if let Response::ActionResult {
        result: Ok(ActionPayload::ResourceUsage { batch, samples }),
        ..
    } = handle.recv_timeout(Duration::from_secs(5))?
    {
        println!("telemetry batch {batch}: {} samples", samples.len());
    }

    handle.send(Request::VideoExport {
        params: ExportParams {
            source: "demo".to_owned(),
            program_id: ProgramId(100),
            frame_count: 600,
            config: VideoEncoderConfig {
                width: 320,
                height: 180,
                fps: 60,
                bitrate: 2_000_000,
                bitrate_mode: BitrateMode::Variable,
                codec: VideoCodec::Vp9,
                subsampling: ChromaSubsampling::S420,
            },
        },
        encoder: Box::new(MemoryEncoder::new()),
        cancel: CancelToken::new(),
    })?;

    loop {
        match handle.recv_timeout(Duration::from_secs(30))? {
            Response::VideoProgress { frames } => println!("export progress: {frames}/600"),
            Response::VideoFinished { data } => {
                println!("export finished: {} bytes", data.len());
                break;
            }
            Response::VideoError { message } => {
                anyhow::bail!("export failed: {message}");
            }
            other => println!("response: {other:?}"),
        }
    }

    handle.shutdown()?;
    Ok(())
}
