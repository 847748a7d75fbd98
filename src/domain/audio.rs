use serde::{Deserialize, Serialize};

/// Raw PCM layout reported by the TTS service via the MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcmFormat {
    pub bits_per_sample: u16,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            bits_per_sample: 16,
            sample_rate: 24000,
            channels: 1,
        }
    }
}

impl PcmFormat {
    /// Parse a MIME type such as `audio/L16;codec=pcm;rate=24000`.
    /// Unknown or malformed parameters keep their defaults.
    pub fn from_mime(mime_type: &str) -> Self {
        let mut format = Self::default();

        for param in mime_type.split(';').map(str::trim) {
            if let Some((key, value)) = param.split_once('=') {
                if key.trim().eq_ignore_ascii_case("rate") {
                    if let Ok(rate) = value.trim().parse() {
                        format.sample_rate = rate;
                    }
                }
            } else if let Some(bits) = param.strip_prefix("audio/L") {
                if let Ok(bits) = bits.parse() {
                    format.bits_per_sample = bits;
                }
            }
        }

        // The byte rate must fit the 32-bit header field.
        let fits = format
            .sample_rate
            .checked_mul(u32::from(format.block_align()))
            .is_some();
        if format.sample_rate == 0 || !fits {
            format.sample_rate = Self::default().sample_rate;
        }

        format
    }

    #[must_use]
    pub fn block_align(&self) -> u16 {
        self.channels.saturating_mul(self.bits_per_sample / 8)
    }

    #[must_use]
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate.saturating_mul(u32::from(self.block_align()))
    }
}

/// Audio returned by one synthesis call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl AudioClip {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the payload already carries a RIFF container.
    #[must_use]
    pub fn is_wav(&self) -> bool {
        let mime = self.mime_type.to_ascii_lowercase();
        mime.contains("wav") || self.data.starts_with(b"RIFF")
    }

    /// WAV bytes for this clip. Raw PCM gets a RIFF header prepended.
    pub fn into_wav(self) -> Vec<u8> {
        if self.is_wav() {
            return self.data;
        }

        let format = PcmFormat::from_mime(&self.mime_type);
        let data_size = u32::try_from(self.data.len()).unwrap_or(u32::MAX);
        let mut wav = wav_header(&format, data_size);
        wav.extend_from_slice(&self.data);
        wav
    }
}

/// 44-byte canonical PCM WAV header.
fn wav_header(format: &PcmFormat, data_size: u32) -> Vec<u8> {
    let mut header = Vec::with_capacity(44);
    header.extend_from_slice(b"RIFF");
    header.extend_from_slice(&data_size.saturating_add(36).to_le_bytes());
    header.extend_from_slice(b"WAVE");
    header.extend_from_slice(b"fmt ");
    header.extend_from_slice(&16u32.to_le_bytes());
    header.extend_from_slice(&1u16.to_le_bytes()); // PCM
    header.extend_from_slice(&format.channels.to_le_bytes());
    header.extend_from_slice(&format.sample_rate.to_le_bytes());
    header.extend_from_slice(&format.byte_rate().to_le_bytes());
    header.extend_from_slice(&format.block_align().to_le_bytes());
    header.extend_from_slice(&format.bits_per_sample.to_le_bytes());
    header.extend_from_slice(b"data");
    header.extend_from_slice(&data_size.to_le_bytes());
    header
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm_format_from_mime() {
        let f = PcmFormat::from_mime("audio/L16;codec=pcm;rate=24000");
        assert_eq!(f.bits_per_sample, 16);
        assert_eq!(f.sample_rate, 24000);

        let f = PcmFormat::from_mime("audio/L24; rate=48000");
        assert_eq!(f.bits_per_sample, 24);
        assert_eq!(f.sample_rate, 48000);
    }

    #[test]
    fn test_pcm_format_defaults_on_garbage() {
        let f = PcmFormat::from_mime("audio/Lxx;rate=fast");
        assert_eq!(f, PcmFormat::default());
    }

    #[test]
    fn test_into_wav_prepends_header() {
        let pcm = vec![0u8, 1, 2, 3];
        let wav = AudioClip::new(pcm.clone(), "audio/L16;codec=pcm;rate=24000").into_wav();

        assert_eq!(wav.len(), 44 + pcm.len());
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]), 36 + 4);
        assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), 24000);
        // byte rate = 24000 * 1 channel * 2 bytes
        assert_eq!(u32::from_le_bytes([wav[28], wav[29], wav[30], wav[31]]), 48000);
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 4);
        assert_eq!(&wav[44..], &pcm[..]);
    }

    #[test]
    fn test_into_wav_survives_absurd_rate() {
        let f = PcmFormat::from_mime("audio/L16;codec=pcm;rate=4000000000");
        assert_eq!(f.sample_rate, 24000);
        assert_eq!(PcmFormat::from_mime("audio/L16;rate=0").sample_rate, 24000);

        let wav = AudioClip::new(vec![0; 4], "audio/L16;codec=pcm;rate=4000000000").into_wav();
        assert_eq!(wav.len(), 48);
        assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), 24000);
        assert_eq!(u32::from_le_bytes([wav[28], wav[29], wav[30], wav[31]]), 48000);
    }

    #[test]
    fn test_byte_rate_saturates() {
        let f = PcmFormat {
            bits_per_sample: 16,
            sample_rate: u32::MAX,
            channels: 2,
        };
        assert_eq!(f.byte_rate(), u32::MAX);
    }

    #[test]
    fn test_into_wav_passes_wav_through() {
        let data = b"RIFF....WAVEfmt ".to_vec();
        let clip = AudioClip::new(data.clone(), "audio/wav");
        assert_eq!(clip.into_wav(), data);
    }
}
