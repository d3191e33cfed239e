use std::io::Cursor;

use lz77::matcher::{find_longest_match, MatchLimits};
use lz77::token::TOKEN_SIZE;
use lz77::{decode, encode, Config, Decoder, Encoder, WindowBuffer};
use proptest::prelude::*;

fn compress(input: &[u8], config: &Config) -> Vec<u8> {
    let mut out = Vec::new();
    encode(&mut Cursor::new(input), &mut out, config).unwrap();
    out
}

fn config_strategy() -> impl Strategy<Value = Config> {
    (1usize..=255, 1usize..=255, 1usize..=4).prop_map(|(search, lookahead, min_match)| {
        Config::default()
            .with_search_capacity(search)
            .with_lookahead_capacity(lookahead)
            .with_min_match_length(min_match)
    })
}

proptest! {
    #[test]
    fn prop_encode_decode_roundtrip(
        input in proptest::collection::vec(any::<u8>(), 0..2048),
        config in config_strategy()
    ) {
        let compressed = compress(&input, &config);
        let mut restored = Vec::new();
        decode(&mut Cursor::new(compressed), &mut restored).unwrap();
        prop_assert_eq!(restored, input);
    }

    #[test]
    fn prop_low_entropy_roundtrip(
        input in proptest::collection::vec(0u8..3, 0..4096),
    ) {
        let compressed = compress(&input, &Config::default());
        prop_assert_eq!(Decoder::decode_slice(&compressed).unwrap(), input);
    }

    #[test]
    fn prop_tokens_fit_windows(
        input in proptest::collection::vec(0u8..4, 0..1024),
        config in config_strategy()
    ) {
        let encoder = Encoder::new(config).unwrap();
        for token in encoder.session(&input) {
            let token = token.unwrap();
            prop_assert!(token.offset as usize <= config.search_capacity);
            prop_assert!((token.length as usize) < config.lookahead_capacity);
            prop_assert!(token.length == 0 || token.offset > 0);
        }
    }

    #[test]
    fn prop_stream_is_whole_tokens(
        input in proptest::collection::vec(any::<u8>(), 0..512)
    ) {
        let compressed = compress(&input, &Config::default());
        prop_assert_eq!(compressed.len() % TOKEN_SIZE, 0);
        prop_assert!(compressed.len() <= input.len() * TOKEN_SIZE);
    }

    #[test]
    fn prop_window_keeps_last_pushed(
        capacity in 1usize..64,
        pushed in proptest::collection::vec(any::<u8>(), 0..256),
        pops in 0usize..8
    ) {
        let mut window = WindowBuffer::new(capacity);
        window.extend(pushed.iter().copied());
        let keep = pushed.len().min(capacity);
        prop_assert_eq!(window.len(), keep);
        prop_assert_eq!(window.to_vec(), pushed[pushed.len() - keep..].to_vec());

        for _ in 0..pops {
            window.pop_front();
        }
        let live = keep.saturating_sub(pops);
        prop_assert_eq!(window.iter().count(), live);
        prop_assert_eq!(window.to_vec(), pushed[pushed.len() - live..].to_vec());
    }

    #[test]
    fn prop_match_is_longest_and_nearest(
        search in proptest::collection::vec(0u8..3, 0..64),
        lookahead in proptest::collection::vec(0u8..3, 1..16)
    ) {
        let found = find_longest_match(&search[..], &lookahead[..], MatchLimits::new(1, 255));
        let prefix = |offset: usize| {
            search[search.len() - offset..]
                .iter()
                .zip(&lookahead)
                .take_while(|(a, b)| a == b)
                .count()
        };
        let best = (1..=search.len()).map(prefix).max().unwrap_or(0);
        prop_assert_eq!(found.length, best);
        if best > 0 {
            let nearest = (1..=search.len()).find(|&o| prefix(o) == best).unwrap();
            prop_assert_eq!(found.offset, nearest);
        }
    }
}
