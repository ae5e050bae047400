//! Read-only analysis tap for visualizers.
//!
//! The render side pushes finished samples into a lock-free ring buffer and
//! never waits; when the reader falls behind, samples are dropped. The reader
//! keeps a sliding window and derives waveform, spectrum and level from it.

use super::prelude::TAU;
use ringbuf::{HeapConsumer, HeapProducer, HeapRb};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Spectrum smoothing between successive snapshots (0 = none).
pub const SPECTRUM_SMOOTHING: f32 = 0.6;

/// Create a connected writer/reader pair with an FFT window of `size`
/// samples (rounded up to a power of two, minimum 32).
pub fn analysis_tap(size: usize) -> (TapWriter, Analyser) {
    let size = size.max(32).next_power_of_two();
    let (producer, consumer) = HeapRb::<f32>::new(size * 4).split();
    (TapWriter { producer }, Analyser::new(consumer, size))
}

/// Render-side half of the tap.
pub struct TapWriter {
    producer: HeapProducer<f32>,
}

impl TapWriter {
    /// Push a mono downmix of a stereo block. Returns how many samples fit.
    pub fn push_stereo(&mut self, left: &[f32], right: &[f32]) -> usize {
        let mut pushed = 0;
        for (l, r) in left.iter().zip(right.iter()) {
            if self.producer.push((l + r) * 0.5).is_err() {
                break;
            }
            pushed += 1;
        }
        pushed
    }

    pub fn push(&mut self, samples: &[f32]) -> usize {
        self.producer.push_slice(samples)
    }
}

/// RMS and peak of the current window.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Level {
    pub rms: f32,
    pub peak: f32,
}

/// Reader half of the tap, owned by the control/visual side.
pub struct Analyser {
    consumer: HeapConsumer<f32>,
    window: Vec<f32>,
    incoming: Vec<f32>,
    hann: Vec<f32>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    spectrum: Vec<f32>,
}

impl Analyser {
    fn new(consumer: HeapConsumer<f32>, size: usize) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(size);
        let hann = (0..size)
            .map(|i| 0.5 * (1.0 - (TAU * i as f32 / size as f32).cos()))
            .collect();
        Self {
            consumer,
            window: vec![0.0; size],
            incoming: vec![0.0; size],
            hann,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); size],
            spectrum: vec![0.0; size / 2],
        }
    }

    pub fn size(&self) -> usize {
        self.window.len()
    }

    /// Pull whatever the render side has produced into the window.
    /// Returns the number of new samples.
    pub fn update(&mut self) -> usize {
        let mut total = 0;
        loop {
            let n = self.consumer.pop_slice(&mut self.incoming);
            if n == 0 {
                break;
            }
            let size = self.window.len();
            self.window.rotate_left(n);
            self.window[size - n..].copy_from_slice(&self.incoming[..n]);
            total += n;
        }
        total
    }

    /// Most recent window of time-domain samples, oldest first.
    pub fn time_domain(&self) -> &[f32] {
        &self.window
    }

    /// Smoothed magnitude spectrum of the current window, `size / 2` bins
    /// from DC up to just below Nyquist.
    pub fn frequency_data(&mut self) -> &[f32] {
        for ((slot, &x), &w) in self.scratch.iter_mut().zip(&self.window).zip(&self.hann) {
            *slot = Complex::new(x * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        let norm = 2.0 / self.window.len() as f32;
        for (bin, c) in self.spectrum.iter_mut().zip(&self.scratch) {
            let magnitude = c.norm() * norm;
            *bin = SPECTRUM_SMOOTHING * *bin + (1.0 - SPECTRUM_SMOOTHING) * magnitude;
        }
        &self.spectrum
    }

    pub fn level(&self) -> Level {
        let (sum, peak) = self
            .window
            .iter()
            .fold((0.0f32, 0.0f32), |(sum, peak), &x| (sum + x * x, peak.max(x.abs())));
        Level {
            rms: (sum / self.window.len() as f32).sqrt(),
            peak,
        }
    }
}
