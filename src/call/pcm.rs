//! f32 ⇄ 16-bit little-endian PCM conversion.

use bytes::Bytes;

/// Encodes float samples into 16-bit LE PCM, clamping to the sample range.
pub fn encode_frame(samples: &[f32]) -> Bytes {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for sample in samples {
        let clamped = (sample * 32768.0).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        out.extend_from_slice(&clamped.to_le_bytes());
    }
    Bytes::from(out)
}

/// Decodes 16-bit LE PCM into float samples. A trailing odd byte is ignored.
pub fn decode_chunk(data: &[u8]) -> Vec<f32> {
    data.chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]) as f32 / 32768.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trips() {
        let samples = vec![0.0, 0.5, -0.5, 0.25];
        let decoded = decode_chunk(&encode_frame(&samples));
        assert_eq!(decoded.len(), samples.len());
        for (original, decoded) in samples.iter().zip(&decoded) {
            assert!((original - decoded).abs() < 1.0 / 32768.0 * 2.0);
        }
    }

    #[test]
    fn out_of_range_samples_clamp() {
        let encoded = encode_frame(&[2.0, -2.0]);
        let decoded = decode_chunk(&encoded);
        assert!((decoded[0] - (i16::MAX as f32 / 32768.0)).abs() < f32::EPSILON);
        assert!((decoded[1] - (-1.0)).abs() < f32::EPSILON);
    }

    #[test]
    fn trailing_odd_byte_is_ignored() {
        let decoded = decode_chunk(&[0x00, 0x40, 0x7f]);
        assert_eq!(decoded.len(), 1);
    }
}
