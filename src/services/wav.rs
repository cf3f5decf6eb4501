//! Minimal WAV container assembly for raw linear PCM.
//!
//! Gemini's TTS modality returns raw 16-bit mono 24 kHz PCM unless it
//! happens to hand back a full WAV file, so the client wraps the bytes
//! itself before serving them as `audio/wav`.

pub const WAV_HEADER_SIZE: usize = 44;

/// Wrap raw PCM bytes in a 44-byte RIFF/WAVE header.
pub fn pcm_to_wav(pcm: &[u8], channels: u16, sample_rate: u32, bits_per_sample: u16) -> Vec<u8> {
    let byte_rate = sample_rate * u32::from(channels) * u32::from(bits_per_sample / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = pcm.len() as u32;
    let file_size = WAV_HEADER_SIZE as u32 + data_size;

    let mut out = Vec::with_capacity(WAV_HEADER_SIZE + pcm.len());

    // RIFF chunk descriptor
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(file_size - 8).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt sub-chunk (16 bytes, PCM format tag = 1)
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data sub-chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_size.to_le_bytes());
    out.extend_from_slice(pcm);

    out
}
