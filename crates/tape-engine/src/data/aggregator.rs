use crate::scene::Candle6;

/// Output of one aggregation pass, packed in Candle6 layout.
#[derive(Debug, Clone, Default)]
pub struct AggregateResult {
    pub data: Vec<u8>,
    pub candle_count: u32,
}

/// Downsample a packed Candle6 sequence by an integer factor.
///
/// Each output group spans `factor` consecutive raw candles (the tail group
/// may be shorter): x and open come from the group's first candle, close from
/// its last, high/low are the extrema, and the half-width is the first
/// candle's half-width scaled by the actual member count, so a ragged
/// tail yields a narrower final candle.
///
/// Returns an empty result when `factor < 2` or there are fewer raw candles
/// than `factor`. All arithmetic is single precision.
pub fn aggregate_candles(raw: &[u8], factor: u32) -> AggregateResult {
    let mut result = AggregateResult::default();
    if factor < 2 {
        return result;
    }

    let stride = Candle6::STRIDE_BYTES;
    let raw_count = (raw.len() / stride) as u32;
    if raw_count < factor {
        return result;
    }

    let group_count = raw_count.div_ceil(factor);
    result.data.reserve(group_count as usize * stride);
    result.candle_count = group_count;

    for g in 0..group_count {
        let start = g * factor;
        let end = (start + factor).min(raw_count);

        let first: Candle6 =
            bytemuck::pod_read_unaligned(&raw[start as usize * stride..][..stride]);
        let last: Candle6 =
            bytemuck::pod_read_unaligned(&raw[(end - 1) as usize * stride..][..stride]);

        let mut high = first.high;
        let mut low = first.low;
        for i in start + 1..end {
            let c: Candle6 = bytemuck::pod_read_unaligned(&raw[i as usize * stride..][..stride]);
            if c.high > high {
                high = c.high;
            }
            if c.low < low {
                low = c.low;
            }
        }

        let merged = Candle6 {
            x: first.x,
            open: first.open,
            high,
            low,
            close: last.close,
            half_width: first.half_width * (end - start) as f32,
        };
        result.data.extend_from_slice(bytemuck::bytes_of(&merged));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack(candles: &[Candle6]) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(candles.len() * Candle6::STRIDE_BYTES);
        for c in candles {
            bytes.extend_from_slice(bytemuck::bytes_of(c));
        }
        bytes
    }

    fn ramp(count: u32) -> Vec<Candle6> {
        (0..count)
            .map(|i| Candle6 {
                x: i as f32,
                open: 100.0 + i as f32,
                high: 105.0 + i as f32,
                low: 95.0 + i as f32,
                close: 102.0 + i as f32,
                half_width: 0.4,
            })
            .collect()
    }

    fn unpack(result: &AggregateResult) -> Vec<Candle6> {
        result
            .data
            .chunks_exact(Candle6::STRIDE_BYTES)
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    #[test]
    fn factor_below_two_yields_empty() {
        let raw = pack(&ramp(8));
        assert_eq!(aggregate_candles(&raw, 0).candle_count, 0);
        assert_eq!(aggregate_candles(&raw, 1).candle_count, 0);
    }

    #[test]
    fn fewer_candles_than_factor_yields_empty() {
        let raw = pack(&ramp(3));
        let result = aggregate_candles(&raw, 4);
        assert_eq!(result.candle_count, 0);
        assert!(result.data.is_empty());
    }

    #[test]
    fn merges_twelve_candles_by_three() {
        let raw = pack(&ramp(12));
        let result = aggregate_candles(&raw, 3);
        assert_eq!(result.candle_count, 4);

        let out = unpack(&result);
        // Group 0 spans raw candles 0..3.
        assert_eq!(out[0].x, 0.0);
        assert_eq!(out[0].open, 100.0);
        assert_eq!(out[0].high, 107.0);
        assert_eq!(out[0].low, 95.0);
        assert_eq!(out[0].close, 104.0);
        assert!((out[0].half_width - 1.2).abs() < 1e-6);
        // Group 3 spans raw candles 9..12.
        assert_eq!(out[3].x, 9.0);
        assert_eq!(out[3].open, 109.0);
        assert_eq!(out[3].high, 116.0);
        assert_eq!(out[3].low, 104.0);
        assert_eq!(out[3].close, 113.0);
        assert!((out[3].half_width - 1.2).abs() < 1e-6);
    }

    #[test]
    fn ragged_tail_gets_narrower_half_width() {
        // 7 = 2 full groups of 3 + a tail of 1.
        let raw = pack(&ramp(7));
        let result = aggregate_candles(&raw, 3);
        assert_eq!(result.candle_count, 3);

        let out = unpack(&result);
        assert!((out[0].half_width - 1.2).abs() < 1e-6);
        assert!((out[2].half_width - 0.4).abs() < 1e-6);
        // Tail group of one candle keeps its own open/close.
        assert_eq!(out[2].open, 106.0);
        assert_eq!(out[2].close, 108.0);
    }

    #[test]
    fn high_low_are_extrema_not_endpoints() {
        let candles = [
            Candle6 { x: 0.0, open: 10.0, high: 11.0, low: 9.0, close: 10.5, half_width: 0.4 },
            Candle6 { x: 1.0, open: 10.5, high: 20.0, low: 2.0, close: 10.0, half_width: 0.4 },
        ];
        let result = aggregate_candles(&pack(&candles), 2);
        let out = unpack(&result);
        assert_eq!(out[0].high, 20.0);
        assert_eq!(out[0].low, 2.0);
    }
}
