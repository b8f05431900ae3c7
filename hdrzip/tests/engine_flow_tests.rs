//! End-to-end flows through the compression engine with every built-in codec.

mod common;

use common::{create_engine, create_request, create_response, stripped};
use hdrzip::codecs::delta::constants::DELTA_REF_HEADER;
use hdrzip::serialization::{LineFormat, parse_block};
use hdrzip::{CodecError, Direction, HdrzipError, compare_headers};

const ALL_CODECS: [&str; 3] = ["http1", "http1_gzip", "delta"];

#[test]
fn page_load_round_trips_for_every_decompressing_codec() {
    let mut engine = create_engine(&ALL_CODECS, true);
    let paths = ["/", "/style.css", "/app.js", "/logo.png", "/"];

    for (index, path) in paths.iter().enumerate() {
        for (direction, message) in [
            (Direction::Request, stripped(&create_request("www.example.com", path))),
            (Direction::Response, stripped(&create_response(100 * index))),
        ] {
            let result = engine
                .compress(direction, "www.example.com", &message)
                .unwrap();
            for (codec, output) in &result.outputs {
                let bytes = output.as_ref().unwrap();
                match engine.decompress(direction, &result.connection, codec, bytes) {
                    Ok(reconstructed) => {
                        let diffs = compare_headers(&message, &reconstructed);
                        assert!(diffs.is_empty(), "{codec} {direction}: {diffs:?}");
                    }
                    Err(HdrzipError::Codec(CodecError::DecompressionUnsupported { .. })) => {
                        assert_eq!(codec, "http1_gzip");
                    }
                    Err(other) => panic!("{codec}: {other}"),
                }
            }
        }
    }
}

#[test]
fn delta_beats_the_baseline_on_repeated_requests() {
    let mut engine = create_engine(&["http1", "delta"], true);
    let message = stripped(&create_request("www.example.com", "/"));

    let first = engine
        .compress(Direction::Request, "www.example.com", &message)
        .unwrap();
    let second = engine
        .compress(Direction::Request, "www.example.com", &message)
        .unwrap();

    let baseline = second.size_of("http1").unwrap();
    let delta = second.size_of("delta").unwrap();
    assert_eq!(first.size_of("http1"), Some(baseline));
    assert!(delta * 2 < baseline, "delta {delta} vs http1 {baseline}");
}

#[test]
fn second_identical_message_references_every_regular_header() {
    let mut engine = create_engine(&["delta"], true);
    let message = stripped(&create_request("www.example.com", "/"));
    engine
        .compress(Direction::Request, "www.example.com", &message)
        .unwrap();
    let second = engine
        .compress(Direction::Request, "www.example.com", &message)
        .unwrap();

    let (_, output) = &second.outputs[0];
    let block = parse_block(output.as_ref().unwrap(), LineFormat::COMPACT).unwrap();
    let references = block.get(DELTA_REF_HEADER).unwrap();
    assert_eq!(
        references.split(',').count(),
        message.regular_headers().count()
    );
    assert!(block.regular_headers().all(|(name, _)| name == DELTA_REF_HEADER));
}

#[test]
fn multiplexed_hosts_share_one_connection() {
    let mut engine = create_engine(&["delta"], true);
    engine.declare_connection("*.example.com").unwrap();
    engine.declare_connection("example.org").unwrap();

    let routed = |engine: &mut hdrzip::CompressionEngine, host: &str| {
        engine
            .compress(Direction::Request, host, &stripped(&create_request(host, "/")))
            .unwrap()
            .connection
    };
    assert_eq!(routed(&mut engine, "a.example.com"), "*.example.com");
    assert_eq!(routed(&mut engine, "b.example.com"), "*.example.com");
    assert_eq!(routed(&mut engine, "example.org"), "example.org");
    assert_eq!(routed(&mut engine, "unrelated.net"), "unrelated.net");
    assert_eq!(engine.connections().len(), 3);
}

#[test]
fn responses_do_not_reference_requests() {
    let mut engine = create_engine(&["delta"], true);
    let request = stripped(&create_request("www.example.com", "/"));
    let mut response = stripped(&create_response(10));
    response.insert("user-agent", request.get("user-agent").unwrap());

    engine
        .compress(Direction::Request, "www.example.com", &request)
        .unwrap();
    let result = engine
        .compress(Direction::Response, "www.example.com", &response)
        .unwrap();
    let (_, output) = &result.outputs[0];
    let block = parse_block(output.as_ref().unwrap(), LineFormat::COMPACT).unwrap();
    assert!(!block.contains(DELTA_REF_HEADER));
}
