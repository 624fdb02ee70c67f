//! RMS loudness estimation

/// Root-mean-square of a channel's samples
///
/// Samples are widened to `f64` before squaring so a full-scale frame cannot
/// overflow the accumulator. An empty or silent channel measures 0.
pub fn rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_sq: f64 = samples
        .iter()
        .map(|&s| {
            let s = s as f64;
            s * s
        })
        .sum();

    (sum_sq / samples.len() as f64).sqrt() as f32
}

/// Loudness of every channel, in channel order
pub fn channel_loudness(channels: &[Vec<i16>]) -> Vec<f32> {
    channels.iter().map(|c| rms(c)).collect()
}
