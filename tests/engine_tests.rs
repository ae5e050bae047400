use rand::rngs::SmallRng;
use rand::SeedableRng;
use rustfmseq::sequencer::scheduler::{LookaheadScheduler, SchedulerConfig};
use rustfmseq::sequencer::step::SequencerStep;
use rustfmseq::synth::params::{LfoTarget, ParamKey};
use rustfmseq::synth::{build_engine, EngineHandle, Renderer};
use rustfmseq::EngineConfig;

const SR: u32 = 1024;

fn engine() -> (EngineHandle, Renderer) {
    let (handle, renderer, _analyser) = build_engine(&EngineConfig::default(), SR);
    (handle, renderer)
}

fn render(renderer: &mut Renderer, frames: usize) -> (Vec<f32>, Vec<f32>) {
    let mut left = vec![0.0; frames];
    let mut right = vec![0.0; frames];
    renderer.render(&mut left, &mut right);
    (left, right)
}

#[test]
fn test_messages_apply_at_next_block() {
    let (handle, mut renderer) = engine();
    handle.trigger_note(330.0, 0.5);
    handle.set_parameter(ParamKey::FmIndex, 4.0f32);
    handle.set_named_parameter("lfoTarget", LfoTarget::FmIndex);
    handle.set_named_parameter("notAParameter", 1.0f32);
    assert!(!renderer.voice().envelope().is_held());

    render(&mut renderer, 64);
    let voice = renderer.voice();
    assert!(voice.envelope().is_held());
    assert_eq!(voice.params().carrier_hz, 330.0);
    assert_eq!(voice.params().fm_index, 4.0);
    assert_eq!(voice.params().lfo_target, LfoTarget::FmIndex);
    assert_eq!(voice.velocity(), 0.5);
}

#[test]
fn test_handle_clock_follows_renderer() {
    let (handle, mut renderer) = engine();
    assert_eq!(handle.now(), 0.0);
    render(&mut renderer, 256);
    assert_eq!(handle.now(), 0.25);
    assert_eq!(handle.clock().frames(), 256);
}

#[test]
fn test_release_silences_the_voice() {
    let (handle, mut renderer) = engine();
    handle.trigger_note(440.0, 1.0);
    let (left, _) = render(&mut renderer, 256);
    assert!(left.iter().any(|&x| x != 0.0));

    handle.release_note();
    render(&mut renderer, 64);
    assert!(!renderer.voice().envelope().is_held());
}

#[test]
fn test_delay_and_gain_messages_reach_the_chain() {
    let (handle, mut renderer) = engine();
    handle.set_delay(100.0, 0.99, 1.0);
    handle.set_master_gain(0.1);
    render(&mut renderer, 8);

    let settings = renderer.chain().settings();
    assert_eq!(settings.feedback, 0.7);
    assert_eq!(settings.wet, 1.0);
    assert_eq!(renderer.chain().master_gain(), 0.1);
}

#[test]
fn test_interleaved_output_layout() {
    let (handle, mut renderer) = engine();
    handle.trigger_note(440.0, 1.0);

    let mut data = vec![0.0; 64 * 3];
    renderer.render_interleaved(&mut data, 3);
    for frame in data.chunks(3) {
        assert_eq!(frame[2], (frame[0] + frame[1]) * 0.5);
    }
    assert!(data.iter().any(|&x| x != 0.0));
    assert_eq!(handle.clock().frames(), 64);
}

#[test]
fn test_scheduler_plays_through_the_handle() {
    let (mut handle, mut renderer) = engine();
    let mut scheduler = LookaheadScheduler::with_rng(SchedulerConfig::default(), SmallRng::seed_from_u64(3));
    scheduler.set_steps(vec![SequencerStep {
        on: true,
        ..SequencerStep::default()
    }]);
    scheduler.set_loop_length(1);

    scheduler.start(handle.now());
    scheduler.poll(handle.now(), &mut handle);

    // The note is due at 0.08 s, inside the second 64-frame block.
    render(&mut renderer, 64);
    assert!(!renderer.voice().envelope().is_held());
    assert_eq!(renderer.voice().pending_events(), 1);
    render(&mut renderer, 64);
    assert!(renderer.voice().envelope().is_held());
}

#[test]
fn test_load_parameters_overwrites_every_field() {
    let (handle, mut renderer) = engine();
    let mut params = renderer.voice().params().clone();
    params.carrier_hz = 110.0;
    params.release_time = 1.5;
    params.lfo_target = LfoTarget::ModRatio;

    handle.load_parameters(&params);
    render(&mut renderer, 1);
    assert_eq!(renderer.voice().params(), &params);
}
