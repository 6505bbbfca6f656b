//! Property-based tests for the PCM16/base64 wire codec.

use agentchat_realtime::audio::{
    decode_base64, decode_pcm16, encode_base64, float_to_pcm16, pcm16_to_float,
};
use agentchat_realtime::{OUTPUT_SAMPLE_RATE, SampleOverflow};
use proptest::prelude::*;

fn arb_overflow() -> impl Strategy<Value = SampleOverflow> {
    prop_oneof![Just(SampleOverflow::Wrap), Just(SampleOverflow::Clamp)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any byte string survives base64 encoding.
    #[test]
    fn prop_base64_round_trip(bytes in prop::collection::vec(any::<u8>(), 0..512)) {
        let encoded = encode_base64(&bytes);
        prop_assert_eq!(decode_base64(&encoded).unwrap(), bytes);
    }

    /// In-range samples come back within one quantization step.
    #[test]
    fn prop_pcm_round_trip_within_one_step(
        samples in prop::collection::vec(-1.0f32..0.9999, 0..256),
        overflow in arb_overflow(),
    ) {
        let decoded = pcm16_to_float(&float_to_pcm16(&samples, overflow)).unwrap();
        prop_assert_eq!(decoded.len(), samples.len());
        for (original, restored) in samples.iter().zip(&decoded) {
            prop_assert!((original - restored).abs() <= 1.0 / 32768.0 + f32::EPSILON);
        }
    }

    /// Two bytes per sample, little-endian.
    #[test]
    fn prop_pcm_is_two_bytes_per_sample(samples in prop::collection::vec(-1.0f32..1.0, 0..256)) {
        let pcm = float_to_pcm16(&samples, SampleOverflow::Wrap);
        prop_assert_eq!(pcm.len(), samples.len() * 2);
        for (sample, pair) in samples.iter().zip(pcm.chunks_exact(2)) {
            let value = i16::from_le_bytes([pair[0], pair[1]]);
            prop_assert_eq!(value, SampleOverflow::Wrap.convert(*sample));
        }
    }

    /// Clamping never changes sign.
    #[test]
    fn prop_clamp_preserves_sign(sample in -4.0f32..4.0) {
        let value = SampleOverflow::Clamp.convert(sample);
        if sample >= 1.0 / 32768.0 {
            prop_assert!(value > 0);
        }
        if sample <= -1.0 / 32768.0 {
            prop_assert!(value < 0);
        }
    }
}

#[test]
fn full_scale_wraps_or_clamps() {
    let wrapped = pcm16_to_float(&float_to_pcm16(&[1.0], SampleOverflow::Wrap)).unwrap();
    let clamped = pcm16_to_float(&float_to_pcm16(&[1.0], SampleOverflow::Clamp)).unwrap();

    assert_eq!(wrapped, vec![-1.0]);
    assert!((clamped[0] - 32767.0 / 32768.0).abs() < f32::EPSILON);
}

#[test]
fn stereo_frames_decode_per_channel() {
    let pcm = float_to_pcm16(&[0.5, -0.5, 0.25, -0.25, 0.0, 0.125], SampleOverflow::Wrap);
    let buffer = decode_pcm16(&pcm, OUTPUT_SAMPLE_RATE, 2).unwrap();

    assert_eq!(buffer.frame_count(), 3);
    assert_eq!(buffer.channel(1).unwrap(), &[-0.5, -0.25, 0.125]);
    assert!((buffer.duration() - 3.0 / 24_000.0).abs() < 1e-12);
}

#[test]
fn misaligned_channel_data_is_rejected() {
    let pcm = float_to_pcm16(&[0.5, -0.5, 0.25], SampleOverflow::Wrap);
    assert!(decode_pcm16(&pcm, OUTPUT_SAMPLE_RATE, 2).is_err());
    assert!(decode_pcm16(&pcm, OUTPUT_SAMPLE_RATE, 0).is_err());
}

#[test]
fn invalid_base64_is_an_error() {
    assert!(decode_base64("@@@").is_err());
}
