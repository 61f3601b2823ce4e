//! Decoded sample buffers.

use std::io::Cursor;

use hound::{SampleFormat, WavReader};

use crate::error::DecodeError;

/// A mono sample buffer ready for playback.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioBuffer {
    pub samples:     Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        AudioBuffer { samples, sample_rate }
    }

    /// Decode WAV bytes.  Multi-channel audio is mixed down to mono.
    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let reader   = WavReader::new(Cursor::new(bytes))?;
        let spec     = reader.spec();
        let channels = spec.channels.max(1) as usize;

        let samples: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .into_samples::<f32>()
                .collect::<Result<Vec<_>, _>>()?,
            SampleFormat::Int => {
                let max_val = (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
                reader
                    .into_samples::<i32>()
                    .map(|s| s.map(|v| v as f32 / max_val))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        if samples.len() < channels {
            return Err(DecodeError::Empty);
        }

        let mono = if channels > 1 {
            samples
                .chunks_exact(channels)
                .map(|frame| frame.iter().sum::<f32>() / channels as f32)
                .collect()
        } else {
            samples
        };

        Ok(AudioBuffer::new(mono, spec.sample_rate))
    }

    pub fn len(&self) -> usize { self.samples.len() }
    pub fn is_empty(&self) -> bool { self.samples.is_empty() }

    /// Linearly interpolated read; positions outside the buffer read silence.
    pub fn read(&self, position: f32) -> f32 {
        if position < 0.0 { return 0.0; }
        let i = position as usize;
        let frac = position - i as f32;
        match (self.samples.get(i), self.samples.get(i + 1)) {
            (Some(&a), Some(&b)) => a + (b - a) * frac,
            (Some(&a), None)     => a * (1.0 - frac),
            _                    => 0.0,
        }
    }
}

/// Encode a mono 16-bit WAV in memory.  Used by tests across the workspace.
#[doc(hidden)]
pub fn encode_wav(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format:   SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = match hound::WavWriter::new(&mut cursor, spec) {
            Ok(w)  => w,
            Err(_) => return Vec::new(),
        };
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            if writer.write_sample(v).is_err() { return Vec::new(); }
        }
        if writer.finalize().is_err() { return Vec::new(); }
    }
    cursor.into_inner()
}
