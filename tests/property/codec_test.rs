// tests/property/codec_test.rs

//! Property-based tests for the query codec: decoding must be insensitive to
//! how the bytes are chunked by the transport.

use bytes::BytesMut;
use helloprint::core::protocol::{QueryCodec, Request};
use proptest::prelude::*;
use tokio_util::codec::Decoder;

/// Feeds `wire` into the decoder in chunks of the given sizes (cycled) and
/// collects every decoded request.
fn decode_chunked(wire: &[u8], chunk_sizes: &[usize]) -> Vec<Request> {
    let mut codec = QueryCodec;
    let mut buf = BytesMut::new();
    let mut out = Vec::new();
    let mut offset = 0;
    let mut sizes = chunk_sizes.iter().copied().cycle();

    while offset < wire.len() {
        let take = sizes.next().unwrap().max(1).min(wire.len() - offset);
        buf.extend_from_slice(&wire[offset..offset + take]);
        offset += take;
        while let Some(request) = codec.decode(&mut buf).expect("decode failed") {
            out.push(request);
        }
    }
    out
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_decoding_is_chunking_invariant(
        lines in prop::collection::vec(
            prop::collection::vec("[a-zA-Z0-9._-]{1,12}", 1..=5),
            1..=6
        ),
        chunk_sizes in prop::collection::vec(1usize..32, 1..=8)
    ) {
        let mut wire = Vec::new();
        for words in &lines {
            wire.extend_from_slice(words.join(" ").as_bytes());
            wire.extend_from_slice(b"\r\n");
        }

        let whole = decode_chunked(&wire, &[wire.len().max(1)]);
        let chunked = decode_chunked(&wire, &chunk_sizes);

        prop_assert_eq!(&whole, &chunked);
        prop_assert_eq!(whole.len(), lines.len());
        for (request, words) in whole.iter().zip(&lines) {
            prop_assert_eq!(&request.parts, words);
        }
    }

    #[test]
    fn test_interleaved_blank_lines_never_produce_requests(
        words in prop::collection::vec("[a-zA-Z0-9]{1,10}", 1..=4),
        blanks_before in 0usize..4,
        blanks_after in 0usize..4
    ) {
        let mut wire = Vec::new();
        for _ in 0..blanks_before {
            wire.extend_from_slice(b"  \r\n");
        }
        wire.extend_from_slice(words.join(" ").as_bytes());
        wire.extend_from_slice(b"\r\n");
        for _ in 0..blanks_after {
            wire.extend_from_slice(b"\r\n");
        }

        let requests = decode_chunked(&wire, &[3]);
        prop_assert_eq!(requests.len(), 1);
        prop_assert_eq!(&requests[0].parts, &words);
    }

    #[test]
    fn test_bytes_without_terminator_never_yield_a_request(
        body in prop::collection::vec(any::<u8>(), 0..512)
    ) {
        // Strip anything that could form a CRLF.
        let body: Vec<u8> = body.into_iter().filter(|b| *b != b'\r' && *b != b'\n').collect();
        let mut codec = QueryCodec;
        let mut buf = BytesMut::from(&body[..]);
        prop_assert_eq!(codec.decode(&mut buf).expect("under-limit bytes must not error"), None);
    }
}
