/// Integration tests: whole archives through every pipeline and back.
///
/// Covers the metadata-preservation guarantee shared by all pipelines, the
/// accuracy contract of each method, the on-disk layouts, and rejection of
/// damaged inputs.
use tensorpack_codecs::{
    compress, decompress, FrameConfig, HalfWidthCodec, LosslessCodec, QuantizedCodec,
};
use tensorpack_core::format::{LOSSLESS_HEADER_SIZE, LOSSY_HEADER_SIZE};
use tensorpack_core::{Error, Family, Header, Method, Reader, Writer};

/// Build a tensor archive with the given metadata blob and f32 values.
fn archive(metadata: &[u8], values: &[f32]) -> Vec<u8> {
    let mut out = (metadata.len() as u64).to_le_bytes().to_vec();
    out.extend_from_slice(metadata);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

fn tensor_of(file: &[u8], metadata_len: usize) -> Vec<f32> {
    file[8 + metadata_len..]
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Deterministic weight-like values in roughly [-0.5, 0.5] using a simple LCG.
fn pseudo_random_weights(len: usize, seed: u64) -> Vec<f32> {
    let mut rng = seed;
    (0..len)
        .map(|_| {
            rng = rng
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((rng >> 40) as f32 / (1u64 << 24) as f32) - 0.5
        })
        .collect()
}

/// Slowly varying values, so adjacent quantization codes stay close.
fn smooth_weights(len: usize) -> Vec<f32> {
    (0..len).map(|i| (i as f32 * 0.01).sin() * 0.8).collect()
}

const METADATA: &[u8] = br#"{"weight":{"dtype":"F32","shape":[64,64],"data_offsets":[0,16384]}}"#;

fn small_lossless() -> LosslessCodec {
    LosslessCodec::new(FrameConfig {
        level: 3,
        workers: 2,
        ..FrameConfig::default()
    })
}

// ── tests ──────────────────────────────────────────────────────────────────

#[test]
fn test_minimal_archive_quantizes_to_one_run() {
    let file = archive(b"{}", &[1.0; 4]);
    assert_eq!(file.len(), 26);

    let writer = Writer::new(Box::new(QuantizedCodec));
    let packed = writer.compress(&file).unwrap();

    let codec = QuantizedCodec;
    let reader = Reader::open(&packed, &codec).unwrap();
    assert_eq!(reader.payload(), &[0xFF, 4, 0], "four equal codes become one run record");
    assert_eq!(reader.metadata(), &file[..10]);

    let restored = reader.decompress().unwrap();
    assert_eq!(restored, file);
    assert_eq!(restored.len() - 8, 18, "2 metadata bytes plus 16 tensor bytes");
}

#[test]
fn test_quantized_round_trip_within_half_step() {
    let values = smooth_weights(5000);
    let file = archive(METADATA, &values);

    let packed = compress(&file, Method::Quantized).unwrap();
    assert!(packed.len() < file.len() / 3, "8-bit codes should at least quarter the tensor");

    let restored = decompress(&packed, Family::Lossy).unwrap();
    assert_eq!(restored.len(), file.len());
    assert_eq!(&restored[..8 + METADATA.len()], &file[..8 + METADATA.len()]);

    let (min, max) = values
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let bound = (max - min) / 510.0 + 1e-6;
    for (v, r) in values.iter().zip(tensor_of(&restored, METADATA.len())) {
        assert!((v - r).abs() <= bound, "{v} restored as {r}, bound {bound}");
    }
}

#[test]
fn test_quantized_large_jump_is_not_recovered() {
    // codes 0 and 255 differ by more than the 7-bit delta field can hold
    let file = archive(b"{}", &[0.0, 1.0]);
    let restored = decompress(&compress(&file, Method::Quantized).unwrap(), Family::Lossy).unwrap();
    let values = tensor_of(&restored, 2);
    assert_eq!(values[0], 0.0);
    assert!((values[1] - 127.0 / 255.0).abs() < 1e-6, "got {}", values[1]);
}

#[test]
fn test_half_width_round_trip() {
    let exact = [0.5f32, 2.0, -1.0, 0.0, 0.25, -8.0, 1024.0, 0.5];
    let file = archive(METADATA, &exact);
    let restored = decompress(&compress(&file, Method::HalfWidth).unwrap(), Family::Lossy).unwrap();
    assert_eq!(restored, file, "half-representable values survive unchanged");

    let values = pseudo_random_weights(2000, 7);
    let file = archive(METADATA, &values);
    let restored = decompress(&compress(&file, Method::HalfWidth).unwrap(), Family::Lossy).unwrap();
    for (v, r) in values.iter().zip(tensor_of(&restored, METADATA.len())) {
        // values below the half normal range flush to zero
        let tolerance = (v.abs() * 2f32.powi(-10)).max(6.2e-5);
        assert!((v - r).abs() <= tolerance, "{v} restored as {r}");
    }
}

#[test]
fn test_lossless_round_trip_is_bit_exact() {
    let values = pseudo_random_weights(20_000, 0xDEAD_BEEF);
    let mut file = archive(METADATA, &values);
    // odd bit patterns must survive too
    file.extend_from_slice(&f32::NAN.to_le_bytes());
    file.extend_from_slice(&(-0.0f32).to_le_bytes());
    file.extend_from_slice(&f32::from_bits(1).to_le_bytes());

    let packed = Writer::new(Box::new(small_lossless())).compress(&file).unwrap();
    let codec = small_lossless();
    let reader = Reader::open(&packed, &codec).unwrap();
    assert_eq!(reader.decompress().unwrap(), file);
}

#[test]
fn test_lossless_compresses_repetitive_tensors() {
    let pattern = pseudo_random_weights(256, 42);
    let values: Vec<f32> = pattern.iter().cycle().take(64 * 1024).copied().collect();
    let file = archive(METADATA, &values);

    let packed = compress(&file, Method::Lossless).unwrap();
    let codec = LosslessCodec::default();
    let reader = Reader::open(&packed, &codec).unwrap();
    assert!(reader.ratio() > 10.0, "ratio was {:.2}", reader.ratio());
    assert_eq!(decompress(&packed, Family::Lossless).unwrap(), file);
}

#[test]
fn test_empty_tensor_region() {
    let file = archive(METADATA, &[]);
    for method in [Method::Quantized, Method::HalfWidth, Method::Lossless] {
        let packed = compress(&file, method).unwrap();
        assert_eq!(decompress(&packed, method.family()).unwrap(), file, "{method}");
    }
}

#[test]
fn test_lossy_header_layout() {
    let values = smooth_weights(100);
    let file = archive(METADATA, &values);
    let packed = compress(&file, Method::Quantized).unwrap();

    let codec = QuantizedCodec;
    let reader = Reader::open(&packed, &codec).unwrap();
    let Header::Lossy(header) = &reader.header else {
        panic!("expected a lossy header");
    };
    assert_eq!(header.original_size, file.len() as u64);
    assert_eq!(header.metadata_len, METADATA.len() as u64);
    assert_eq!(header.element_count, 100);
    assert_eq!(header.method, Method::Quantized);
    assert!(header.range.min < header.range.max);

    let payload_len_at = LOSSY_HEADER_SIZE + 8 + METADATA.len();
    let mut len = [0u8; 8];
    len.copy_from_slice(&packed[payload_len_at..payload_len_at + 8]);
    assert_eq!(u64::from_le_bytes(len) as usize, reader.payload().len());
    assert_eq!(packed.len(), payload_len_at + 8 + reader.payload().len());
}

#[test]
fn test_half_width_header_has_zero_range() {
    let file = archive(b"{}", &[3.0, -3.0]);
    let packed = compress(&file, Method::HalfWidth).unwrap();
    assert_eq!(&packed[20..24], &0u32.to_le_bytes(), "half-width method tag");
    assert_eq!(&packed[24..32], &[0u8; 8], "no range stored");
}

#[test]
fn test_lossless_header_layout() {
    let file = archive(METADATA, &smooth_weights(300));
    let packed = Writer::new(Box::new(small_lossless())).compress(&file).unwrap();

    let codec = small_lossless();
    let reader = Reader::open(&packed, &codec).unwrap();
    let Header::Lossless(header) = &reader.header else {
        panic!("expected a lossless header");
    };
    assert_eq!(header.original_size, file.len() as u64);
    assert_eq!(header.metadata_len, 8 + METADATA.len() as u64);
    assert_eq!(header.element_count, 300);
    assert_eq!(header.block_count, 1);
    assert_eq!(header.payload_size, 16 + reader.payload().len() as u64);
    assert_eq!(
        packed.len(),
        LOSSLESS_HEADER_SIZE + 8 + METADATA.len() + 16 + reader.payload().len()
    );
}

#[test]
fn test_codec_mismatch_error() {
    let file = archive(b"{}", &[1.0, 2.0]);
    let packed = compress(&file, Method::Quantized).unwrap();

    let wrong = HalfWidthCodec;
    let err = Reader::open(&packed, &wrong).err().unwrap();
    assert!(
        matches!(err, Error::CodecMismatch { file: Method::Quantized, codec: Method::HalfWidth }),
        "got {err}"
    );
    assert!(err.to_string().contains("codec mismatch"));
}

#[test]
fn test_unknown_method_tag_is_rejected() {
    let file = archive(b"{}", &[1.0]);
    let mut packed = compress(&file, Method::Quantized).unwrap();
    packed[20..24].copy_from_slice(&9u32.to_le_bytes());
    assert!(matches!(decompress(&packed, Family::Lossy), Err(Error::UnknownMethod(9))));
}

#[test]
fn test_malformed_archives_are_rejected() {
    for method in [Method::Quantized, Method::HalfWidth, Method::Lossless] {
        assert!(matches!(compress(&[1, 2, 3], method), Err(Error::MalformedContainer(_))));

        let mut oversized = 1000u64.to_le_bytes().to_vec();
        oversized.extend_from_slice(&[0u8; 12]);
        assert!(matches!(compress(&oversized, method), Err(Error::MalformedContainer(_))));

        let mut ragged = archive(b"{}", &[1.0]);
        ragged.push(7);
        assert!(matches!(compress(&ragged, method), Err(Error::MalformedContainer(_))));
    }
}

#[test]
fn test_truncated_files_are_rejected() {
    let file = archive(METADATA, &smooth_weights(400));
    for method in [Method::Quantized, Method::HalfWidth, Method::Lossless] {
        let packed = compress(&file, method).unwrap();
        for cut in [0, 10, LOSSY_HEADER_SIZE + 4, packed.len() / 2, packed.len() - 1] {
            let result = decompress(&packed[..cut], method.family());
            assert!(
                matches!(result, Err(Error::TruncatedRecord(_))),
                "{method} cut at {cut}: {result:?}"
            );
        }
    }
}

#[test]
fn test_corrupt_frame_is_rejected() {
    let file = archive(METADATA, &pseudo_random_weights(1000, 3));
    let mut packed = compress(&file, Method::Lossless).unwrap();
    let frame_start = LOSSLESS_HEADER_SIZE + 8 + METADATA.len() + 16;
    for b in &mut packed[frame_start..frame_start + 8] {
        *b ^= 0xA5;
    }
    assert!(matches!(decompress(&packed, Family::Lossless), Err(Error::FrameCodec(_))));
}

#[test]
fn test_writer_reports_codec() {
    let writer = Writer::new(Box::new(HalfWidthCodec));
    assert_eq!(writer.codec().method(), Method::HalfWidth);
    assert_eq!(writer.codec().name(), "half-width");
}

fn patch(packed: &mut [u8], at: usize, bytes: &[u8]) {
    packed[at..at + bytes.len()].copy_from_slice(bytes);
}

/// Offset of the lossless block record for an archive carrying `METADATA`.
const RECORD_AT: usize = LOSSLESS_HEADER_SIZE + 8 + METADATA.len();

#[test]
fn test_oversized_lossless_element_count_is_a_frame_error() {
    let file = archive(METADATA, &[1.0, 2.0, 3.0, 4.0]);
    let mut packed = compress(&file, Method::Lossless).unwrap();
    // header and block record agree with each other, but not with the frame
    patch(&mut packed, 16, &u32::MAX.to_le_bytes());
    patch(&mut packed, RECORD_AT + 8, &(u32::MAX as u64 * 4).to_le_bytes());

    let result = decompress(&packed, Family::Lossless);
    assert!(matches!(result, Err(Error::FrameCodec(_))), "{result:?}");
}

#[test]
fn test_lossless_block_count_must_be_one() {
    let file = archive(METADATA, &smooth_weights(64));
    for count in [0u32, 2, u32::MAX] {
        let mut packed = compress(&file, Method::Lossless).unwrap();
        patch(&mut packed, 20, &count.to_le_bytes());
        let result = decompress(&packed, Family::Lossless);
        assert!(matches!(result, Err(Error::MalformedContainer(_))), "{count}: {result:?}");
    }
}

#[test]
fn test_block_record_must_match_element_count() {
    let file = archive(METADATA, &smooth_weights(64));
    let mut packed = compress(&file, Method::Lossless).unwrap();
    patch(&mut packed, RECORD_AT + 8, &(64u64 * 4 + 4).to_le_bytes());
    let result = decompress(&packed, Family::Lossless);
    assert!(matches!(result, Err(Error::MalformedContainer(_))), "{result:?}");
}

#[test]
fn test_lossless_metadata_len_below_prefix_is_rejected() {
    let file = archive(METADATA, &smooth_weights(64));
    for len in [0u64, 4, 7] {
        let mut packed = compress(&file, Method::Lossless).unwrap();
        patch(&mut packed, 8, &len.to_le_bytes());
        let result = decompress(&packed, Family::Lossless);
        assert!(matches!(result, Err(Error::MalformedContainer(_))), "{len}: {result:?}");
    }
}

#[test]
fn test_embedded_metadata_prefix_must_match_header() {
    let file = archive(METADATA, &smooth_weights(64));
    let wrong = (METADATA.len() as u64 + 1).to_le_bytes();

    let mut lossless = compress(&file, Method::Lossless).unwrap();
    patch(&mut lossless, LOSSLESS_HEADER_SIZE, &wrong);
    let result = decompress(&lossless, Family::Lossless);
    assert!(matches!(result, Err(Error::MalformedContainer(_))), "{result:?}");

    for method in [Method::Quantized, Method::HalfWidth] {
        let mut lossy = compress(&file, method).unwrap();
        patch(&mut lossy, LOSSY_HEADER_SIZE, &wrong);
        let result = decompress(&lossy, Family::Lossy);
        assert!(matches!(result, Err(Error::MalformedContainer(_))), "{method}: {result:?}");
    }
}

#[test]
fn test_overflowing_lossy_metadata_len_is_rejected() {
    let file = archive(b"{}", &[1.0, 2.0]);
    let mut packed = compress(&file, Method::Quantized).unwrap();
    patch(&mut packed, 8, &u64::MAX.to_le_bytes());
    let result = decompress(&packed, Family::Lossy);
    assert!(matches!(result, Err(Error::MalformedContainer(_))), "{result:?}");
}
