use super::*;
use approx::assert_relative_eq;

const D: f64 = DEFAULT_FRAME_DURATION;

// Resuming anchors the wall-time reference one frame back, so the first tick
// lands at the resume timestamp and sees exactly one frame of elapsed time.
fn playing_timeline(at: f64) -> Timeline {
    let mut tl = Timeline::new(at);
    tl.set_playing(true, at);
    tl
}

#[test]
fn starts_paused_at_origin() {
    let tl = Timeline::new(10.0);
    assert!(!tl.is_playing());
    assert_eq!(tl.frame_count(), 0.0);
    assert_eq!(tl.play_time(), 0.0);
    assert_eq!(tl.last_duration(), D);
}

#[test]
fn paused_vars_are_idempotent() {
    let mut tl = Timeline::new(0.0);
    let a = tl.next_frame_vars(1.0);
    let b = tl.next_frame_vars(2.0);
    let c = tl.next_frame_vars(55.0);
    assert_eq!(a, b);
    assert_eq!(b, c);
}

#[test]
fn playing_returns_pre_advance_values() {
    let mut tl = playing_timeline(0.0);
    let first = tl.next_frame_vars(0.0);
    assert_eq!(first.frame, 0.0);
    assert_eq!(first.time, 0.0);
    assert_relative_eq!(first.duration, D);

    let second = tl.next_frame_vars(D);
    assert_eq!(second.frame, 1.0);
    assert_relative_eq!(second.time, D);
}

#[test]
fn resume_does_not_jump_after_pause_gap() {
    let mut tl = playing_timeline(0.0);
    tl.next_frame_vars(0.0);
    tl.set_playing(false, D);
    let frozen = tl.frame_count();
    assert_eq!(frozen, 1.0);

    // A long pause, then resume: the next tick sees one frame of elapsed
    // time, not the whole gap.
    tl.set_playing(true, 100.0);
    let vars = tl.next_frame_vars(100.0);
    assert_relative_eq!(vars.duration, D);
    assert_eq!(vars.frame, frozen);
    assert_eq!(tl.frame_count(), frozen + 1.0);
}

#[test]
fn set_playing_same_state_is_noop() {
    let mut tl = Timeline::new(0.0);
    let before = tl.clone();
    tl.set_playing(false, 42.0);
    assert_eq!(tl.frame_count(), before.frame_count());
    assert_eq!(tl.play_time(), before.play_time());
}

#[test]
fn paused_frame_count_is_integral_after_fractional_speed() {
    let mut tl = playing_timeline(0.0);
    tl.set_speed(0.25);
    for i in 0..5 {
        tl.next_frame_vars(i as f64 * D);
    }
    assert_eq!(tl.frame_count(), 1.25);

    tl.set_playing(false, 6.0 * D);
    assert_eq!(tl.frame_count(), tl.frame_count().round());
}

#[test]
fn whole_speed_snaps_fractional_position() {
    let mut tl = playing_timeline(0.0);
    tl.set_speed(0.5);
    tl.next_frame_vars(0.0);
    tl.next_frame_vars(D);
    assert_eq!(tl.frame_count(), 1.0);
    tl.next_frame_vars(2.0 * D);
    assert_eq!(tl.frame_count(), 1.5);

    tl.set_speed(2.0);
    assert_eq!(tl.frame_count(), 2.0);
    assert_relative_eq!(tl.play_time(), tl.frame_count() * D, max_relative = 1e-9);
}

#[test]
fn fractional_speed_change_does_not_snap() {
    let mut tl = playing_timeline(0.0);
    tl.set_speed(0.5);
    tl.next_frame_vars(0.0);
    tl.next_frame_vars(D);
    tl.next_frame_vars(2.0 * D);
    assert_eq!(tl.frame_count(), 1.5);

    tl.set_speed(0.75);
    assert_eq!(tl.frame_count(), 1.5);
}

#[test]
fn reset_rewinds_even_while_playing() {
    let mut tl = playing_timeline(0.0);
    for i in 0..10 {
        tl.next_frame_vars(i as f64 * D);
    }
    assert!(tl.frame_count() > 0.0);

    tl.reset(10.0 * D);
    assert_eq!(tl.frame_count(), 0.0);
    assert_eq!(tl.play_time(), 0.0);
    assert_eq!(tl.last_duration(), D);
    assert!(tl.is_playing());
}

#[test]
fn stepping_is_paused_only() {
    let mut tl = playing_timeline(0.0);
    tl.next_frame_vars(0.0);
    let frame = tl.frame_count();
    tl.step_next();
    tl.step_previous();
    assert_eq!(tl.frame_count(), frame);
}

#[test]
fn step_moves_exactly_one_frame() {
    let mut tl = Timeline::new(0.0);
    tl.step_next();
    tl.step_next();
    assert_eq!(tl.frame_count(), 2.0);
    assert_relative_eq!(tl.play_time(), 2.0 * D);

    tl.step_previous();
    assert_eq!(tl.frame_count(), 1.0);
    assert_relative_eq!(tl.play_time(), D);
}

#[test]
fn step_before_origin_clamps_to_floor() {
    let mut tl = Timeline::new(0.0);
    tl.step_previous();
    assert_eq!(tl.frame_count(), DEFAULT_CLAMP_FRAMES);
    assert_relative_eq!(tl.play_time(), DEFAULT_CLAMP_FRAMES * D);
}

#[test]
fn reverse_past_origin_clamps_to_floor() {
    let mut tl = playing_timeline(0.0);
    tl.set_speed(-1.0);
    tl.next_frame_vars(0.0);
    assert_eq!(tl.frame_count(), DEFAULT_CLAMP_FRAMES);

    // And never goes negative afterwards either.
    for i in 1..50 {
        tl.next_frame_vars(i as f64 * D);
        assert!(tl.frame_count() >= 0.0);
        assert!(tl.play_time() >= 0.0);
    }
}

#[test]
fn clamp_floor_is_configurable() {
    let mut tl = Timeline::new(0.0).with_clamp_frames(120.0);
    tl.step_previous();
    assert_eq!(tl.frame_count(), 120.0);
}

#[test]
fn frame_count_never_negative_under_random_ops() {
    // Pseudo-random walk over the transition space; the invariants must hold
    // at every step.
    let mut tl = Timeline::new(0.0);
    let mut seed = 0x2545_f491_4f6c_dd1du64;
    let mut now = 0.0;
    for _ in 0..500 {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        now += D;
        match seed % 6 {
            0 => tl.set_playing(seed & 1 == 0, now),
            1 => tl.set_speed(((seed % 9) as f64) - 4.0),
            2 => tl.set_speed((((seed % 9) as f64) - 4.0) / 2.0),
            3 => tl.step_previous(),
            4 => tl.step_next(),
            _ => {
                tl.next_frame_vars(now);
            }
        }
        assert!(tl.frame_count() >= 0.0, "frame_count went negative");
        if !tl.is_playing() {
            assert_eq!(
                tl.frame_count(),
                tl.frame_count().round(),
                "paused with fractional frame_count"
            );
        }
    }
}

#[test]
fn duration_quantizes_to_tenth_of_rate() {
    let mut tl = playing_timeline(0.0);
    tl.next_frame_vars(0.0);

    // 16.9 ms and 16.5 ms both quantize to 1/60.
    let v = tl.next_frame_vars(0.0169);
    assert_relative_eq!(v.duration, 1.0 / 60.0);
    let v = tl.next_frame_vars(0.0169 + 0.0165);
    assert_relative_eq!(v.duration, 1.0 / 60.0);

    // ~33 ms quantizes to 1/30.
    let mut tl = playing_timeline(0.0);
    tl.next_frame_vars(0.0);
    let v = tl.next_frame_vars(0.033);
    assert_relative_eq!(v.duration, 1.0 / 30.0);
}

#[test]
fn long_stall_quantizes_to_floor_rate() {
    let mut tl = playing_timeline(0.0);
    tl.next_frame_vars(0.0);
    // A 2 s stall cannot round the implied rate down to zero.
    let v = tl.next_frame_vars(2.0);
    assert_relative_eq!(v.duration, 1.0 / 10.0);
}
