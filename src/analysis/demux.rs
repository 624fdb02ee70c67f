//! Interleaved channel splitting

/// Split interleaved samples into one sequence per channel
///
/// Channel `i` receives every `channels`-th sample starting at offset `i`.
///
/// # Panics
///
/// Panics if `channels` is zero or `samples.len()` is not a multiple of
/// `channels`. Either means the stream and its configuration disagree.
pub fn demux(samples: &[i16], channels: usize) -> Vec<Vec<i16>> {
    assert!(channels > 0, "channel count must be non-zero");
    assert!(
        samples.len() % channels == 0,
        "{} samples do not divide into {} channels",
        samples.len(),
        channels
    );

    let per_channel = samples.len() / channels;
    let mut out: Vec<Vec<i16>> = (0..channels)
        .map(|_| Vec::with_capacity(per_channel))
        .collect();

    for chunk in samples.chunks_exact(channels) {
        for (channel, &sample) in out.iter_mut().zip(chunk) {
            channel.push(sample);
        }
    }

    out
}

/// Interleave per-channel sequences back into a single buffer
///
/// # Panics
///
/// Panics if the channels differ in length.
pub fn interleave(channels: &[Vec<i16>]) -> Vec<i16> {
    let per_channel = channels.first().map_or(0, Vec::len);
    assert!(
        channels.iter().all(|c| c.len() == per_channel),
        "channels must have equal length"
    );

    let mut out = Vec::with_capacity(per_channel * channels.len());
    for i in 0..per_channel {
        out.extend(channels.iter().map(|c| c[i]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_demux_stereo() {
        let channels = demux(&[1, 10, 2, 20, 3, 30], 2);
        assert_eq!(channels, vec![vec![1, 2, 3], vec![10, 20, 30]]);
    }

    #[test]
    fn test_demux_surround() {
        let samples: Vec<i16> = (0..12).collect();
        let channels = demux(&samples, 6);
        assert_eq!(channels.len(), 6);
        assert_eq!(channels[0], vec![0, 6]);
        assert_eq!(channels[3], vec![3, 9]);
        assert_eq!(channels[5], vec![5, 11]);
    }

    #[test]
    fn test_demux_empty_frame() {
        let channels = demux(&[], 8);
        assert_eq!(channels.len(), 8);
        assert!(channels.iter().all(Vec::is_empty));
    }

    #[test]
    #[should_panic(expected = "do not divide")]
    fn test_demux_misaligned_panics() {
        demux(&[1, 2, 3], 2);
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn test_demux_zero_channels_panics() {
        demux(&[1, 2], 0);
    }

    fn frame_strategy() -> impl Strategy<Value = (usize, Vec<i16>)> {
        (prop::sample::select(vec![2usize, 6, 8]), 0usize..64).prop_flat_map(
            |(channels, per_channel)| {
                (
                    Just(channels),
                    prop::collection::vec(any::<i16>(), channels * per_channel),
                )
            },
        )
    }

    proptest! {
        #[test]
        fn prop_demux_interleave_restores_frame((channels, samples) in frame_strategy()) {
            let split = demux(&samples, channels);
            prop_assert_eq!(split.len(), channels);
            prop_assert_eq!(interleave(&split), samples);
        }
    }
}
