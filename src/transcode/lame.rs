use std::path::Path;

use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, InterleavedPcm, MonoPcm, Quality};

use super::Transcoder;
use crate::wav::PcmAudio;
use crate::{Error, Result};

/// Default constant bitrate, matching what ffmpeg picks for MP3.
pub const DEFAULT_BITRATE_KBPS: u32 = 128;

/// Bitrates LAME accepts for constant-bitrate encoding.
pub const SUPPORTED_BITRATES_KBPS: &[u32] = &[
    8, 16, 24, 32, 40, 48, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320,
];

/// Samples per channel in one MPEG-1 Layer III frame.
const SAMPLES_PER_FRAME: usize = 1152;

/// Worst-case size of the final flush, per the LAME documentation.
const FLUSH_BUFFER_SIZE: usize = 7200;

/// Constant-bitrate MP3 transcoder backed by LAME.
#[derive(Debug, Clone)]
pub struct LameTranscoder {
    bitrate_kbps: u32,
}

impl Default for LameTranscoder {
    fn default() -> Self {
        Self {
            bitrate_kbps: DEFAULT_BITRATE_KBPS,
        }
    }
}

impl LameTranscoder {
    pub fn new(bitrate_kbps: u32) -> Result<Self> {
        if !SUPPORTED_BITRATES_KBPS.contains(&bitrate_kbps) {
            return Err(Error::InvalidOptions(format!(
                "unsupported bitrate {bitrate_kbps} kbps (supported: {SUPPORTED_BITRATES_KBPS:?})"
            )));
        }
        Ok(Self { bitrate_kbps })
    }

    pub fn bitrate_kbps(&self) -> u32 {
        self.bitrate_kbps
    }

    /// Encode PCM audio into a complete MP3 byte stream.
    ///
    /// The bitrate must be valid for the MPEG version LAME picks for the
    /// sample rate: 8-160 kbps below 32 kHz, 32-320 kbps from 32 kHz up.
    pub fn encode(&self, pcm: &PcmAudio) -> Result<Vec<u8>> {
        check_bitrate_for_rate(self.bitrate_kbps, pcm.sample_rate())?;

        let mut builder =
            Builder::new().ok_or_else(|| Error::Encode("cannot allocate LAME encoder".into()))?;
        builder
            .set_num_channels(pcm.channels() as u8)
            .map_err(|e| Error::Encode(format!("channels {}: {e:?}", pcm.channels())))?;
        builder
            .set_sample_rate(pcm.sample_rate())
            .map_err(|e| Error::Encode(format!("sample rate {}: {e:?}", pcm.sample_rate())))?;
        builder
            .set_brate(bitrate(self.bitrate_kbps))
            .map_err(|e| Error::Encode(format!("bitrate {}: {e:?}", self.bitrate_kbps)))?;
        builder
            .set_quality(Quality::Good)
            .map_err(|e| Error::Encode(format!("quality: {e:?}")))?;
        let mut encoder = builder
            .build()
            .map_err(|e| Error::Encode(format!("encoder init: {e:?}")))?;

        // LAME cannot flush an encoder that never saw a sample.
        let silence;
        let samples = if pcm.samples().is_empty() {
            silence = vec![0i16; SAMPLES_PER_FRAME * pcm.channels() as usize];
            silence.as_slice()
        } else {
            pcm.samples()
        };
        let frames = samples.len() / pcm.channels() as usize;

        let mut mp3 = Vec::with_capacity(mp3lame_encoder::max_required_buffer_size(frames));
        let encoded = if pcm.channels() == 1 {
            encoder.encode_to_vec(MonoPcm(samples), &mut mp3)
        } else {
            encoder.encode_to_vec(InterleavedPcm(samples), &mut mp3)
        };
        encoded.map_err(|e| Error::Encode(format!("{e:?}")))?;

        mp3.reserve(FLUSH_BUFFER_SIZE);
        encoder
            .flush_to_vec::<FlushNoGap>(&mut mp3)
            .map_err(|e| Error::Encode(format!("flush: {e:?}")))?;

        log::debug!(
            "Encoded {} frames at {} Hz into {} bytes",
            frames,
            pcm.sample_rate(),
            mp3.len()
        );
        Ok(mp3)
    }
}

impl Transcoder for LameTranscoder {
    fn extension(&self) -> &str {
        "mp3"
    }

    fn transcode(&mut self, wav_path: &Path, out_path: &Path) -> Result<()> {
        let pcm = PcmAudio::read(wav_path)?;
        let mp3 = self.encode(&pcm)?;
        std::fs::write(out_path, mp3)?;
        Ok(())
    }
}

fn check_bitrate_for_rate(kbps: u32, sample_rate: u32) -> Result<()> {
    let (min, max) = if sample_rate < 32_000 { (8, 160) } else { (32, 320) };
    if kbps < min || kbps > max {
        return Err(Error::InvalidOptions(format!(
            "{kbps} kbps is not available at {sample_rate} Hz (use {min}-{max} kbps)"
        )));
    }
    Ok(())
}

fn bitrate(kbps: u32) -> Bitrate {
    match kbps {
        8 => Bitrate::Kbps8,
        16 => Bitrate::Kbps16,
        24 => Bitrate::Kbps24,
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        _ => Bitrate::Kbps128,
    }
}
