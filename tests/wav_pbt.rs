//! Property-Based Tests for the WAV container and export sanitization
//!
//! Invariants covered:
//! - Header layout: every encoded buffer is a valid 44-byte RIFF/WAVE
//!   header followed by the unmodified PCM payload
//! - Size bookkeeping: RIFF and data chunk sizes agree with the payload
//! - Marker stripping: idempotent, and never produces a string that
//!   still starts with the marker
//! - Export: field sanitization keeps the tab/newline grid intact for
//!   arbitrary card text

use proptest::prelude::*;

use deckgen_backend::services::deck::{strip_image_marker, Card};
use deckgen_backend::services::export::export_deck;
use deckgen_backend::services::wav::{pcm_to_wav, WAV_HEADER_SIZE};

fn arb_pcm() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 0..4096)
}

fn arb_card_text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 äöüß\t\n\r,.-]{0,64}"
}

fn arb_card(text: String, example: String) -> Card {
    Card {
        id: "pbt".to_string(),
        word: text,
        meaning: "meaning".to_string(),
        example,
        part_of_speech: "noun".to_string(),
        image_description: None,
        image_url: None,
        front_audio_url: None,
        example_audio_url: None,
        loading: false,
    }
}

proptest! {
    #[test]
    fn wav_payload_survives_encoding(pcm in arb_pcm()) {
        let wav = pcm_to_wav(&pcm, 1, 24_000, 16);

        prop_assert_eq!(wav.len(), WAV_HEADER_SIZE + pcm.len());
        prop_assert_eq!(&wav[0..4], b"RIFF");
        prop_assert_eq!(&wav[8..12], b"WAVE");
        prop_assert_eq!(&wav[36..40], b"data");
        prop_assert_eq!(&wav[WAV_HEADER_SIZE..], &pcm[..]);
    }

    #[test]
    fn wav_header_fields_round_trip(
        pcm in arb_pcm(),
        channels in 1u16..=2,
        sample_rate in prop_oneof![Just(8_000u32), Just(16_000), Just(24_000), Just(44_100), Just(48_000)],
        bits in prop_oneof![Just(8u16), Just(16), Just(32)],
    ) {
        let wav = pcm_to_wav(&pcm, channels, sample_rate, bits);

        let riff_size = u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]);
        let read_channels = u16::from_le_bytes([wav[22], wav[23]]);
        let read_rate = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
        let read_bits = u16::from_le_bytes([wav[34], wav[35]]);
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);

        prop_assert_eq!(read_channels, channels);
        prop_assert_eq!(read_rate, sample_rate);
        prop_assert_eq!(read_bits, bits);
        prop_assert_eq!(data_size as usize, pcm.len());
        prop_assert_eq!(riff_size as usize, pcm.len() + WAV_HEADER_SIZE - 8);
    }

    #[test]
    fn marker_stripping_is_idempotent(text in "(#IMAGE# ?-? ?){0,3}[a-zA-Z ]{0,32}") {
        let once = strip_image_marker(&text);
        let twice = strip_image_marker(&once);

        prop_assert_eq!(&once, &twice);
        prop_assert!(!once.to_uppercase().starts_with("#IMAGE#"));
    }

    #[test]
    fn export_grid_is_stable_under_arbitrary_text(
        word in arb_card_text(),
        example in arb_card_text(),
    ) {
        let cards = vec![
            arb_card(word, example),
            arb_card("zweite".to_string(), "Zweiter Satz.".to_string()),
        ];

        let output = export_deck(&cards);
        let lines: Vec<&str> = output.split('\n').collect();

        prop_assert_eq!(lines.len(), 2);
        for line in lines {
            prop_assert_eq!(line.split('\t').count(), 5);
            prop_assert!(!line.contains('\r'));
        }
    }
}
