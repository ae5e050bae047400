use crate::synth::prelude::{HashMap, OnceLock};

/// C4 in MIDI numbering.
pub const DEFAULT_ROOT: i32 = 60;

pub const MAJOR: &[i32] = &[0, 2, 4, 5, 7, 9, 11];

/// Named scales as semitone intervals from the root, in ascending order.
pub const SCALES: &[(&str, &[i32])] = &[
    // western
    ("major", MAJOR),
    ("minor", &[0, 2, 3, 5, 7, 8, 10]),
    ("harmonicMinor", &[0, 2, 3, 5, 7, 8, 11]),
    ("melodicMinor", &[0, 2, 3, 5, 7, 9, 11]),
    ("dorian", &[0, 2, 3, 5, 7, 9, 10]),
    ("phrygian", &[0, 1, 3, 5, 7, 8, 10]),
    ("lydian", &[0, 2, 4, 6, 7, 9, 11]),
    ("mixolydian", &[0, 2, 4, 5, 7, 9, 10]),
    // pentatonic
    ("pentatonic", &[0, 2, 4, 7, 9]),
    ("pentatonicMinor", &[0, 3, 5, 7, 10]),
    // world
    ("japanese", &[0, 1, 5, 7, 8]),
    ("chinesePenta", &[0, 2, 4, 7, 9]),
    ("hirajoshi", &[0, 2, 3, 7, 8]),
    ("inSen", &[0, 1, 5, 7, 10]),
    ("arabic", &[0, 1, 4, 5, 7, 8, 11]),
    ("gypsy", &[0, 2, 3, 6, 7, 8, 11]),
    ("spanish", &[0, 1, 4, 5, 7, 8, 10]),
    ("jewish", &[0, 1, 4, 5, 7, 8, 10]),
    ("persian", &[0, 1, 4, 5, 6, 8, 11]),
    // synthetic
    ("blues", &[0, 3, 5, 6, 7, 10]),
    ("wholeTone", &[0, 2, 4, 6, 8, 10]),
    ("chromatic", &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]),
    ("diminished", &[0, 2, 3, 5, 6, 8, 9, 11]),
    ("augmented", &[0, 3, 4, 7, 8, 11]),
    ("prometheus", &[0, 2, 4, 6, 9, 10]),
    ("tritone", &[0, 1, 4, 6, 7, 10]),
    ("octatonic", &[0, 1, 3, 4, 6, 7, 9, 10]),
    ("bebop", &[0, 2, 4, 5, 7, 9, 10, 11]),
    ("enigmatic", &[0, 1, 4, 6, 8, 10, 11]),
];

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

fn scale_table() -> &'static HashMap<&'static str, &'static [i32]> {
    static TABLE: OnceLock<HashMap<&'static str, &'static [i32]>> = OnceLock::new();
    TABLE.get_or_init(|| SCALES.iter().copied().collect())
}

/// Look up a scale by name.
pub fn scale_intervals(name: &str) -> Option<&'static [i32]> {
    scale_table().get(name).copied()
}

/// Snap `root + offset` to the nearest scale degree within its own octave.
///
/// Ties go to the interval listed first. An empty scale leaves the note
/// unquantized.
pub fn quantize_pitch(root: i32, offset: i32, scale: &[i32]) -> i32 {
    let midi = root + offset;
    let octave_base = midi.div_euclid(12) * 12;
    let degree = midi - octave_base;

    let mut best: Option<(i32, i32)> = None;
    for &interval in scale {
        let diff = (interval - degree).abs();
        if best.map_or(true, |(_, min)| diff < min) {
            best = Some((interval, diff));
        }
    }

    match best {
        Some((interval, _)) => octave_base + interval,
        None => midi,
    }
}

/// Equal-tempered frequency, A4 (69) = 440 Hz.
pub fn midi_to_freq(note: i32) -> f32 {
    440.0 * ((note - 69) as f32 / 12.0).exp2()
}

/// Nearest MIDI note for a frequency; 0 for non-positive input.
pub fn freq_to_midi(freq: f32) -> i32 {
    if !freq.is_finite() || freq <= 0.0 {
        return 0;
    }
    (69.0 + 12.0 * (freq / 440.0).log2()).round() as i32
}

/// Note name with octave, e.g. 60 -> "C4".
pub fn midi_to_note_name(note: i32) -> String {
    let name = NOTE_NAMES[note.rem_euclid(12) as usize];
    let octave = note.div_euclid(12) - 1;
    format!("{}{}", name, octave)
}
