use crate::audio::AudioBackend;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::synth::Renderer;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream};
use tracing::{error, info, warn};

pub struct CpalBackend {
    device: cpal::Device,
    stream_config: cpal::StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
}

impl CpalBackend {
    /// Pick an output device and stream configuration. No stream is built
    /// until a renderer is attached.
    pub fn new(config: &EngineConfig) -> Result<Self, EngineError> {
        let host = cpal::default_host();
        let device = Self::select_output_device(&host, config.output_device.as_deref())?;
        info!("selected device: {}", device.name().unwrap_or_default());

        let supported_config = device.default_output_config()?;
        let sample_format = supported_config.sample_format();
        let mut stream_config: cpal::StreamConfig = supported_config.into();
        if let Some(frames) = config.block_size {
            stream_config.buffer_size = cpal::BufferSize::Fixed(frames);
        }

        Ok(Self {
            device,
            stream_config,
            sample_format,
            stream: None,
        })
    }

    fn select_output_device(
        host: &cpal::Host,
        preferred: Option<&str>,
    ) -> Result<cpal::Device, EngineError> {
        if let Some(wanted) = preferred {
            let wanted_lower = wanted.to_lowercase();
            return host
                .output_devices()?
                .find(|d| {
                    d.name()
                        .map(|n| n.to_lowercase().contains(&wanted_lower))
                        .unwrap_or(false)
                })
                .ok_or_else(|| EngineError::DeviceNotFound(wanted.to_string()));
        }

        if cfg!(target_os = "linux") {
            // Prefer the sound server over raw ALSA hardware devices.
            for device in host.output_devices()? {
                let name = device.name().unwrap_or_default().to_lowercase();
                if name.starts_with("default") || name.contains("pipewire") {
                    return Ok(device);
                }
            }
        }

        host.default_output_device()
            .ok_or(EngineError::NoOutputDevice)
    }

    pub fn sample_rate(&self) -> u32 {
        self.stream_config.sample_rate.0
    }

    pub fn channels(&self) -> usize {
        self.stream_config.channels as usize
    }

    /// Build the output stream around `renderer`. The renderer moves into the
    /// audio callback and is owned by it from then on.
    pub fn attach(&mut self, mut renderer: Renderer) -> Result<(), EngineError> {
        let channels = self.channels();
        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream(move |data: &mut [f32]| {
                renderer.render_interleaved(data, channels)
            })?,
            other => return Err(EngineError::UnsupportedSampleFormat(format!("{:?}", other))),
        };
        self.stream = Some(stream);
        Ok(())
    }

    fn build_stream<F>(&self, mut render: F) -> Result<Stream, EngineError>
    where
        F: FnMut(&mut [f32]) + Send + 'static,
    {
        self.device
            .build_output_stream(
                &self.stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| render(data),
                |err| error!("stream error: {}", err),
                None,
            )
            .map_err(|e| {
                warn!(
                    "could not open stream with {:?}: {}",
                    self.stream_config.buffer_size, e
                );
                EngineError::from(e)
            })
    }
}

impl AudioBackend for CpalBackend {
    fn start(&mut self) -> Result<(), EngineError> {
        if let Some(stream) = &self.stream {
            stream.play()?;
            info!(
                sample_rate = self.sample_rate(),
                channels = self.channels(),
                "audio stream started"
            );
        }
        Ok(())
    }

    fn stop(&mut self) -> Result<(), EngineError> {
        if let Some(stream) = &self.stream {
            stream.pause()?;
            info!("audio stream paused");
        }
        Ok(())
    }
}
