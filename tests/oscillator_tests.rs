use rustfmseq::synth::oscillator::{FmPair, Lfo, Modulated, Phasor};
use rustfmseq::synth::params::{LfoTarget, VoiceParameters};
use std::f64::consts::TAU;

fn params(target: LfoTarget, depth: f32) -> VoiceParameters {
    VoiceParameters {
        carrier_hz: 220.0,
        mod_ratio: 2.0,
        fm_index: 60.0,
        lfo_depth: depth,
        lfo_target: target,
        ..VoiceParameters::default()
    }
}

fn assert_close(actual: f32, expected: f64, tolerance: f64) {
    assert!(
        (actual as f64 - expected).abs() < tolerance,
        "{} != {}",
        actual,
        expected
    );
}

#[test]
fn test_pitch_target_bends_carrier_half_a_semitone() {
    let m = Modulated::new(&params(LfoTarget::Pitch, 1.0), 1.0);
    assert_close(m.carrier_hz, 220.0 * 2f64.powf(0.5 / 12.0), 1e-4);
    assert_eq!(m.mod_ratio, 2.0);
    assert_eq!(m.fm_index, 60.0);
    assert_eq!(m.amplitude, 1.0);

    let m = Modulated::new(&params(LfoTarget::Pitch, 0.5), -1.0);
    assert_close(m.carrier_hz, 220.0 * 2f64.powf(-0.25 / 12.0), 1e-4);
}

#[test]
fn test_amplitude_target_scales_output() {
    let m = Modulated::new(&params(LfoTarget::Amplitude, 0.5), -1.0);
    assert_close(m.amplitude, 0.85, 1e-6);
    assert_eq!(m.carrier_hz, 220.0);

    let m = Modulated::new(&params(LfoTarget::Amplitude, 1.0), 1.0);
    assert_close(m.amplitude, 1.3, 1e-6);
}

#[test]
fn test_fm_index_target_never_goes_negative() {
    let m = Modulated::new(&params(LfoTarget::FmIndex, 1.0), 0.5);
    assert_close(m.fm_index, 96.0, 1e-4);

    // 1 + (-1)(1)(1.2) is below zero, so the index collapses to zero.
    let m = Modulated::new(&params(LfoTarget::FmIndex, 1.0), -1.0);
    assert_eq!(m.fm_index, 0.0);
    assert_eq!(m.amplitude, 1.0);
}

#[test]
fn test_mod_ratio_target_has_a_floor() {
    let m = Modulated::new(&params(LfoTarget::ModRatio, 0.5), 1.0);
    assert_close(m.mod_ratio, 2.4, 1e-6);

    let mut p = params(LfoTarget::ModRatio, 1.0);
    p.mod_ratio = 0.3;
    let m = Modulated::new(&p, -1.0);
    assert_eq!(m.mod_ratio, 0.25);
}

#[test]
fn test_delay_time_target_leaves_voice_alone() {
    let m = Modulated::new(&params(LfoTarget::DelayTime, 1.0), 1.0);
    assert_eq!(m.carrier_hz, 220.0);
    assert_eq!(m.mod_ratio, 2.0);
    assert_eq!(m.fm_index, 60.0);
    assert_eq!(m.amplitude, 1.0);
}

#[test]
fn test_depth_is_clamped() {
    let full = Modulated::new(&params(LfoTarget::Amplitude, 1.0), 1.0);
    let over = Modulated::new(&params(LfoTarget::Amplitude, 5.0), 1.0);
    assert_eq!(full, over);

    let none = Modulated::new(&params(LfoTarget::Amplitude, -2.0), 1.0);
    assert_eq!(none.amplitude, 1.0);
}

#[test]
fn test_fm_pair_follows_closed_form() {
    let sr = 1000.0;
    let (carrier, ratio, index) = (100.0, 1.5, 3.0);
    let mut fm = FmPair::new();

    for n in 0..64 {
        let t = n as f64 / sr as f64;
        let expected = (TAU * carrier as f64 * t
            + index as f64 * (TAU * (carrier * ratio) as f64 * t).sin())
        .sin();
        let out = fm.next(carrier, ratio, index, sr);
        assert_close(out, expected, 1e-3);
    }
}

#[test]
fn test_lfo_reads_before_advancing() {
    let sr = 1000.0;
    let rate = 5.0;
    let mut lfo = Lfo::new();

    assert_eq!(lfo.next(rate, sr), 0.0);
    for n in 1..200 {
        let expected = (TAU * rate as f64 * n as f64 / sr as f64).sin();
        assert_close(lfo.next(rate, sr), expected, 1e-4);
    }
}

#[test]
fn test_phasor_wraps_into_unit_interval() {
    let mut phasor = Phasor::default();
    for expected in [0.75, 0.5, 0.25, 0.0] {
        phasor.step(750.0, 1000.0);
        assert_eq!(phasor.phase(), expected);
    }

    phasor.step(-250.0, 1000.0);
    assert_eq!(phasor.phase(), 0.75);

    // A tiny negative step from zero must not land on exactly 1.0.
    let mut phasor = Phasor::default();
    phasor.step(-1e-10, 1.0);
    assert!((0.0..1.0).contains(&phasor.phase()));

    phasor.step(f32::NAN, 1000.0);
    assert_eq!(phasor.phase(), 0.0);
}
