use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn fps_frame_duration_matches_rate() {
    let fps = Fps::whole(60).unwrap();
    assert_eq!(fps.frame_duration_secs(), 1.0 / 60.0);
    assert_eq!(fps.frames_to_secs(120), 2.0);

    let ntsc = Fps::new(30000, 1001).unwrap();
    assert!((ntsc.as_f64() - 29.97).abs() < 0.01);
}

#[test]
fn canvas_rejects_zero_dimensions() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(10, 0).is_err());
    let c = Canvas::new(64, 48).unwrap();
    assert_eq!(c.byte_len_rgba(), 64 * 48 * 4);
}
