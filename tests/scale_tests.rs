use rustfmseq::sequencer::scale::{
    freq_to_midi, midi_to_freq, midi_to_note_name, quantize_pitch, scale_intervals, MAJOR, SCALES,
};

#[test]
fn test_major_tie_resolves_to_lower_interval() {
    assert_eq!(quantize_pitch(60, 1, MAJOR), 60);
    assert_eq!(quantize_pitch(60, 3, MAJOR), 62);
    assert_eq!(quantize_pitch(60, 6, MAJOR), 65);
}

#[test]
fn test_quantize_keeps_the_octave() {
    assert_eq!(quantize_pitch(60, 12, MAJOR), 72);
    assert_eq!(quantize_pitch(60, 13, MAJOR), 72);
    assert_eq!(quantize_pitch(60, -1, MAJOR), 59);
    assert_eq!(quantize_pitch(60, -12, MAJOR), 48);
}

#[test]
fn test_scale_members_are_unchanged() {
    for &interval in MAJOR {
        assert_eq!(quantize_pitch(60, interval, MAJOR), 60 + interval);
    }
}

#[test]
fn test_empty_scale_leaves_pitch_alone() {
    assert_eq!(quantize_pitch(60, 5, &[]), 65);
}

#[test]
fn test_scale_lookup() {
    assert_eq!(scale_intervals("major"), Some(MAJOR));
    assert_eq!(scale_intervals("hirajoshi"), Some(&[0, 2, 3, 7, 8][..]));
    assert_eq!(scale_intervals("nope"), None);

    for (name, intervals) in SCALES {
        assert!(intervals.windows(2).all(|w| w[0] < w[1]), "{} not ascending", name);
        assert!(intervals.iter().all(|&i| (0..12).contains(&i)), "{} out of octave", name);
    }
}

#[test]
fn test_midi_frequency_conversions() {
    assert_eq!(midi_to_freq(69), 440.0);
    assert_eq!(midi_to_freq(57), 220.0);
    assert_eq!(midi_to_freq(81), 880.0);
    assert!((midi_to_freq(60) - 261.6256).abs() < 1e-3);

    assert_eq!(freq_to_midi(440.0), 69);
    assert_eq!(freq_to_midi(261.63), 60);
    assert_eq!(freq_to_midi(0.0), 0);
    assert_eq!(freq_to_midi(-5.0), 0);
    assert_eq!(freq_to_midi(f32::NAN), 0);
    for note in 0..128 {
        assert_eq!(freq_to_midi(midi_to_freq(note)), note);
    }
}

#[test]
fn test_note_names() {
    assert_eq!(midi_to_note_name(60), "C4");
    assert_eq!(midi_to_note_name(61), "C#4");
    assert_eq!(midi_to_note_name(69), "A4");
    assert_eq!(midi_to_note_name(0), "C-1");
}
