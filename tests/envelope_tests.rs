use proptest::prelude::*;
use rustfmseq::synth::envelope::{Adsr, Envelope, EnvelopeStage};

const DT: f32 = 1.0 / 1000.0;

fn run(envelope: &mut Envelope, adsr: &Adsr, samples: usize, stages: &mut Vec<EnvelopeStage>) {
    for _ in 0..samples {
        envelope.next(DT, adsr);
        if stages.last() != Some(&envelope.stage()) {
            stages.push(envelope.stage());
        }
    }
}

#[test]
fn test_zero_attack_and_decay_start_at_sustain() {
    let adsr = Adsr::new(0.0, 0.0, 0.7, 0.1);
    let mut envelope = Envelope::new();
    envelope.trigger();

    let first = envelope.next(DT, &adsr);
    assert_eq!(first, 0.7);
    assert_eq!(envelope.stage(), EnvelopeStage::Sustain);
}

#[test]
fn test_zero_release_goes_silent_on_next_sample() {
    let adsr = Adsr::new(0.0, 0.0, 1.0, 0.0);
    let mut envelope = Envelope::new();
    envelope.trigger();
    assert_eq!(envelope.next(DT, &adsr), 1.0);

    assert!(envelope.release());
    assert_eq!(envelope.next(DT, &adsr), 0.0);
    assert!(envelope.is_idle());
}

#[test]
fn test_stages_run_in_order() {
    let adsr = Adsr::new(0.01, 0.01, 0.5, 0.01);
    let mut envelope = Envelope::new();
    let mut stages = vec![envelope.stage()];

    envelope.trigger();
    run(&mut envelope, &adsr, 100, &mut stages);
    assert_eq!(envelope.level(), 0.5);

    envelope.release();
    run(&mut envelope, &adsr, 100, &mut stages);

    assert_eq!(
        stages,
        vec![
            EnvelopeStage::Idle,
            EnvelopeStage::Attack,
            EnvelopeStage::Decay,
            EnvelopeStage::Sustain,
            EnvelopeStage::Release,
            EnvelopeStage::Idle,
        ]
    );
}

#[test]
fn test_release_ramps_from_current_level() {
    // Release during the attack ramp starts from where the ramp got to.
    let adsr = Adsr::new(0.1, 0.1, 1.0, 0.1);
    let mut envelope = Envelope::new();
    envelope.trigger();
    for _ in 0..50 {
        envelope.next(DT, &adsr);
    }
    let held = envelope.level();
    assert!(held > 0.45 && held < 0.55, "level after half the attack: {}", held);

    envelope.release();
    let first = envelope.next(DT, &adsr);
    assert!(first < held);
    assert!(first > held * 0.95);
}

#[test]
fn test_release_is_idempotent() {
    let adsr = Adsr::new(0.0, 0.0, 0.8, 0.05);
    let mut envelope = Envelope::new();
    envelope.trigger();
    envelope.next(DT, &adsr);

    assert!(envelope.release());
    let mut previous = envelope.next(DT, &adsr);
    for _ in 0..10 {
        // A second request must not restart the ramp.
        assert!(!envelope.release());
        let level = envelope.next(DT, &adsr);
        assert!(level < previous);
        previous = level;
    }
}

#[test]
fn test_release_while_idle_does_nothing() {
    let adsr = Adsr::new(0.01, 0.01, 0.5, 0.01);
    let mut envelope = Envelope::new();
    assert!(!envelope.release());
    assert_eq!(envelope.next(DT, &adsr), 0.0);
    assert!(envelope.is_idle());
}

#[test]
fn test_retrigger_restarts_attack() {
    let adsr = Adsr::new(0.01, 0.01, 0.5, 0.2);
    let mut envelope = Envelope::new();
    envelope.trigger();
    for _ in 0..40 {
        envelope.next(DT, &adsr);
    }
    envelope.release();
    envelope.next(DT, &adsr);

    envelope.trigger();
    assert_eq!(envelope.stage(), EnvelopeStage::Attack);
    assert!(envelope.is_held());
}

proptest! {
    /// The level stays inside [0, 1] for any timings and any release point.
    #[test]
    fn envelope_level_is_bounded(
        attack in 0.0f32..0.05,
        decay in 0.0f32..0.05,
        sustain in -0.5f32..1.5,
        release in 0.0f32..0.05,
        release_after in 0usize..200,
    ) {
        let adsr = Adsr::new(attack, decay, sustain, release);
        let mut envelope = Envelope::new();
        envelope.trigger();

        for i in 0..400 {
            if i == release_after {
                envelope.release();
            }
            let level = envelope.next(DT, &adsr);
            prop_assert!((0.0..=1.0).contains(&level), "level {} at sample {}", level, i);
        }
    }
}
