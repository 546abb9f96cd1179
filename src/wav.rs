use std::io::Read;
use std::path::Path;

use crate::{Error, Result};

/// Interleaved 16-bit PCM, mono or stereo.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmAudio {
    samples: Vec<i16>,
    channels: u16,
    sample_rate: u32,
}

impl PcmAudio {
    /// Wrap interleaved samples. `channels` must be 1 or 2.
    pub fn new(samples: Vec<i16>, channels: u16, sample_rate: u32) -> Result<Self> {
        check_channels(channels)?;
        Ok(Self {
            samples,
            channels,
            sample_rate,
        })
    }

    /// Decode a WAV file, converting any integer or float sample format to i16.
    pub fn read(path: &Path) -> Result<Self> {
        let reader = hound::WavReader::open(path)?;
        Self::from_reader(reader)
    }

    fn from_reader<R: Read>(reader: hound::WavReader<R>) -> Result<Self> {
        let spec = reader.spec();
        check_channels(spec.channels)?;

        let samples = match (spec.sample_format, spec.bits_per_sample) {
            (hound::SampleFormat::Int, 16) => reader
                .into_samples::<i16>()
                .collect::<std::result::Result<Vec<_>, _>>()?,
            (hound::SampleFormat::Int, bits @ 1..=32) => {
                let shift = bits as i32 - 16;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|s| rescale_int(s, shift)))
                    .collect::<std::result::Result<Vec<_>, _>>()?
            }
            (hound::SampleFormat::Float, 32) => reader
                .into_samples::<f32>()
                .map(|s| s.map(float_to_i16))
                .collect::<std::result::Result<Vec<_>, _>>()?,
            (format, bits) => {
                return Err(Error::UnsupportedWaveform(format!(
                    "{bits}-bit {format:?} samples"
                )))
            }
        };

        Ok(Self {
            samples,
            channels: spec.channels,
            sample_rate: spec.sample_rate,
        })
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Samples as f32 in `[-1.0, 1.0]`, downmixed to mono.
    pub fn to_mono_f32(&self) -> Vec<f32> {
        self.samples
            .chunks(self.channels as usize)
            .map(|frame| {
                let sum: f32 = frame.iter().map(|&s| s as f32 / 32768.0).sum();
                sum / frame.len() as f32
            })
            .collect()
    }
}

fn check_channels(channels: u16) -> Result<()> {
    if channels == 0 || channels > 2 {
        return Err(Error::UnsupportedWaveform(format!(
            "{channels} channels (expected mono or stereo)"
        )));
    }
    Ok(())
}

fn rescale_int(sample: i32, shift: i32) -> i16 {
    if shift >= 0 {
        (sample >> shift) as i16
    } else {
        (sample << -shift) as i16
    }
}

fn float_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}
