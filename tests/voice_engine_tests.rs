use proptest::prelude::*;
use rustfmseq::synth::envelope::EnvelopeStage;
use rustfmseq::synth::params::{ParamKey, ParamValue, VoiceParameters};
use rustfmseq::synth::VoiceEngine;

// A power-of-two rate keeps frame positions exact in f64 seconds.
const SR: u32 = 1024;
const BLOCK: usize = 64;

fn frame(n: u64) -> f64 {
    n as f64 / SR as f64
}

/// Voice with a gate-shaped envelope: full level while held, silent after.
fn gated_voice() -> VoiceEngine {
    let mut voice = VoiceEngine::new(SR);
    voice.set_parameter(ParamKey::AttackTime, ParamValue::Number(0.0));
    voice.set_parameter(ParamKey::DecayTime, ParamValue::Number(0.0));
    voice.set_parameter(ParamKey::SustainLevel, ParamValue::Number(1.0));
    voice.set_parameter(ParamKey::ReleaseTime, ParamValue::Number(0.0));
    voice
}

fn render(voice: &mut VoiceEngine, frames: usize) -> Vec<f32> {
    let mut out = vec![0.0; frames];
    voice.render_block(&mut out);
    out
}

#[test]
fn test_first_sample_after_trigger_is_silent() {
    let mut voice = gated_voice();
    voice.set_parameter(ParamKey::CarrierHz, ParamValue::Number(220.0));
    voice.set_parameter(ParamKey::ModRatio, ParamValue::Number(2.0));
    voice.set_parameter(ParamKey::FmIndex, ParamValue::Number(60.0));

    voice.trigger_note(220.0, 1.0);
    let out = render(&mut voice, BLOCK);

    assert_eq!(out[0], 0.0);
    assert!(out[1..].iter().any(|&x| x != 0.0));
    assert!(out.iter().all(|x| x.abs() <= 0.3 * 1.3));
}

#[test]
fn test_idle_voice_renders_silence_and_advances_clock() {
    let mut voice = VoiceEngine::new(SR);
    let out = render(&mut voice, BLOCK);
    assert!(out.iter().all(|&x| x == 0.0));
    assert_eq!(voice.clock().frames(), BLOCK as u64);
    assert_eq!(voice.clock().now(), frame(BLOCK as u64));
}

#[test]
fn test_scheduled_note_starts_at_its_sample() {
    let mut voice = gated_voice();
    voice.schedule_note_at(440.0, 1.0, frame(20), 1.0);

    let out = render(&mut voice, BLOCK);
    assert!(out[..20].iter().all(|&x| x == 0.0));
    assert!(out[20..].iter().any(|&x| x != 0.0));
    assert!(voice.envelope().is_held());
}

#[test]
fn test_future_note_waits_for_its_block() {
    let mut voice = gated_voice();
    voice.schedule_note_at(440.0, 1.0, frame(200), 1.0);

    for _ in 0..3 {
        let out = render(&mut voice, BLOCK);
        assert!(out.iter().all(|&x| x == 0.0));
        assert_eq!(voice.pending_events(), 1);
    }

    // Block 3 covers frames 192..256, so the note lands at offset 8.
    let out = render(&mut voice, BLOCK);
    assert!(out[..8].iter().all(|&x| x == 0.0));
    assert!(out[8..].iter().any(|&x| x != 0.0));
    // Only the note-off is left.
    assert_eq!(voice.pending_events(), 1);
}

#[test]
fn test_note_off_is_carried_into_a_later_block() {
    let mut voice = gated_voice();
    voice.schedule_note_at(330.0, 1.0, frame(8), frame(100));

    render(&mut voice, BLOCK);
    assert!(voice.envelope().is_held());
    assert_eq!(voice.pending_events(), 1);

    // Note-off at frame 108 is offset 44 of the second block.
    let out = render(&mut voice, BLOCK);
    assert!(out[..44].iter().any(|&x| x != 0.0));
    assert!(out[44..].iter().all(|&x| x == 0.0));
    assert!(voice.envelope().is_idle());
    assert_eq!(voice.pending_events(), 0);
}

#[test]
fn test_late_event_plays_at_block_start() {
    let mut late = gated_voice();
    let mut immediate = gated_voice();
    render(&mut late, BLOCK);
    render(&mut immediate, BLOCK);

    late.schedule_note_at(440.0, 0.8, 0.0, 1.0);
    immediate.trigger_note(440.0, 0.8);

    assert_eq!(render(&mut late, BLOCK), render(&mut immediate, BLOCK));
}

#[test]
fn test_event_on_block_boundary_goes_to_next_block() {
    let mut voice = gated_voice();
    voice.schedule_note_at(440.0, 1.0, frame(BLOCK as u64), 1.0);

    let out = render(&mut voice, BLOCK);
    assert!(out.iter().all(|&x| x == 0.0));
    assert_eq!(voice.envelope().stage(), EnvelopeStage::Idle);

    render(&mut voice, BLOCK);
    assert!(voice.envelope().is_held());
}

#[test]
fn test_parameter_change_applies_at_its_sample() {
    let mut scheduled = gated_voice();
    scheduled.trigger_note(220.0, 1.0);
    scheduled.schedule_parameter_at(ParamKey::FmIndex, ParamValue::Number(3.0), frame(32));
    let whole = render(&mut scheduled, BLOCK);

    let mut manual = gated_voice();
    manual.trigger_note(220.0, 1.0);
    let mut split = render(&mut manual, 32);
    manual.set_parameter(ParamKey::FmIndex, ParamValue::Number(3.0));
    split.extend(render(&mut manual, 32));

    assert_eq!(whole, split);
    assert_eq!(scheduled.params().fm_index, 3.0);
}

#[test]
fn test_same_time_events_apply_in_arrival_order() {
    let mut voice = gated_voice();
    voice.schedule_parameter_at(ParamKey::CarrierHz, ParamValue::Number(300.0), frame(10));
    voice.schedule_parameter_at(ParamKey::CarrierHz, ParamValue::Number(500.0), frame(10));
    voice.schedule_parameter_at(ParamKey::CarrierHz, ParamValue::Number(400.0), frame(5));

    render(&mut voice, BLOCK);
    assert_eq!(voice.params().carrier_hz, 500.0);
}

#[test]
fn test_non_finite_event_time_is_dropped() {
    let mut voice = gated_voice();
    voice.schedule_note_at(440.0, 1.0, f64::NAN, 1.0);
    voice.schedule_parameter_at(ParamKey::FmIndex, ParamValue::Number(1.0), f64::INFINITY);
    assert_eq!(voice.pending_events(), 0);
}

#[test]
fn test_bad_parameter_values_are_ignored() {
    let mut params = VoiceParameters::default();
    let before = params.clone();

    assert!(!params.set_named("wobble", ParamValue::Number(1.0)));
    assert!(!params.set(ParamKey::FmIndex, ParamValue::Number(f32::NAN)));
    assert!(!params.set(ParamKey::CarrierHz, ParamValue::Number(f32::INFINITY)));
    assert_eq!(params, before);

    assert!(params.set_named("fmIndex", ParamValue::Number(12.0)));
    assert_eq!(params.fm_index, 12.0);
}

#[test]
fn test_velocity_is_clamped() {
    let mut voice = VoiceEngine::new(SR);
    voice.trigger_note(440.0, 3.0);
    assert_eq!(voice.velocity(), 1.0);
    voice.trigger_note(440.0, -1.0);
    assert_eq!(voice.velocity(), 0.0);
}

#[test]
fn test_stereo_render_duplicates_the_voice() {
    let mut voice = gated_voice();
    voice.trigger_note(440.0, 1.0);
    let mut left = vec![0.0; BLOCK];
    let mut right = vec![1.0; BLOCK];
    voice.render_stereo(&mut left, &mut right);
    assert_eq!(left, right);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The rendered signal does not depend on how the host slices it into
    /// blocks.
    #[test]
    fn output_is_independent_of_block_size(
        block in 1usize..100,
        note_at in 0u64..400,
        length in 0u64..200,
        param_at in 0u64..500,
        index in 0.0f32..20.0,
    ) {
        let total = 512;
        let schedule = |voice: &mut VoiceEngine| {
            voice.schedule_note_at(330.0, 0.9, frame(note_at), frame(length));
            voice.schedule_parameter_at(ParamKey::FmIndex, index.into(), frame(param_at));
        };

        let mut reference = gated_voice();
        schedule(&mut reference);
        let expected = render(&mut reference, total);

        let mut chunked = gated_voice();
        schedule(&mut chunked);
        let mut actual = Vec::with_capacity(total);
        while actual.len() < total {
            let n = block.min(total - actual.len());
            actual.extend(render(&mut chunked, n));
        }

        prop_assert_eq!(expected, actual);
    }
}
