use tensorpack_core::QuantizationRange;

/// Map each value onto 256 evenly spaced codes between the tensor's min and max.
///
/// Per-element reconstruction error is at most half a step, `(max - min) / 510`.
/// Empty input yields no codes and a zeroed range.
pub fn quantize(values: &[f32]) -> (Vec<u8>, QuantizationRange) {
    if values.is_empty() {
        return (Vec::new(), QuantizationRange::default());
    }

    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let range = QuantizationRange { min, max };
    let span = range.span();

    let codes = values
        .iter()
        .map(|&v| ((v - min) / span * 255.0).round().clamp(0.0, 255.0) as u8)
        .collect();
    (codes, range)
}

pub fn dequantize(codes: &[u8], range: &QuantizationRange) -> Vec<f32> {
    let span = range.span();
    codes
        .iter()
        .map(|&c| range.min + (c as f32 / 255.0) * span)
        .collect()
}
