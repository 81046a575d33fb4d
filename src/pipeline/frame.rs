/// 16-bit PCM audio carried between the transport and the speech stages
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
}

impl AudioChunk {
    pub fn mono_16k(samples: Vec<i16>) -> Self {
        Self {
            samples,
            sample_rate: 16000,
            channels: 1,
        }
    }

    /// Little-endian PCM bytes, as sent over the socket transport
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    pub fn from_le_bytes(bytes: &[u8], sample_rate: u32, channels: u16) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self {
            samples,
            sample_rate,
            channels,
        }
    }
}

/// Metered usage a provider stage reports downstream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub chars: u64,
}

/// One unit of data flowing through a session chain
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Caller audio from the transport
    Audio(AudioChunk),
    /// Recognized caller speech
    Transcription { text: String, is_final: bool },
    /// A chunk of the dialogue model's reply
    Text(String),
    /// The dialogue model finished one reply
    ResponseEnd,
    /// Synthesized audio for the caller
    Speech(AudioChunk),
    /// Provider usage report
    Usage(Usage),
    /// Caller barged in; the far end should drop buffered speech
    Interrupt,
}

impl Frame {
    pub fn kind(&self) -> &'static str {
        match self {
            Frame::Audio(_) => "audio",
            Frame::Transcription { .. } => "transcription",
            Frame::Text(_) => "text",
            Frame::ResponseEnd => "response_end",
            Frame::Speech(_) => "speech",
            Frame::Usage(_) => "usage",
            Frame::Interrupt => "interrupt",
        }
    }
}
