use crate::models::{Keypoint, RegionOfInterest};

/// Keep the keypoints whose position lies inside `roi`, in their original order
pub fn filter_keypoints(keypoints: &[Keypoint], roi: &RegionOfInterest) -> Vec<Keypoint> {
    keypoints
        .iter()
        .filter(|kp| roi.contains(kp.x, kp.y))
        .copied()
        .collect()
}

/// Keep at most `max` keypoints.
///
/// With `sorted_by_quality` the input is assumed to be in descending quality
/// order already and the first `max` are kept. Otherwise the `max` highest
/// responses survive; ties go to the earlier keypoint and the survivors keep
/// their relative order.
pub fn limit_keypoints(keypoints: &[Keypoint], max: usize, sorted_by_quality: bool) -> Vec<Keypoint> {
    if keypoints.len() <= max {
        return keypoints.to_vec();
    }
    if sorted_by_quality {
        return keypoints[..max].to_vec();
    }

    let mut ranked: Vec<usize> = (0..keypoints.len()).collect();
    ranked.sort_by(|&a, &b| {
        keypoints[b]
            .response
            .total_cmp(&keypoints[a].response)
            .then(a.cmp(&b))
    });
    let mut kept = ranked[..max].to_vec();
    kept.sort_unstable();
    kept.into_iter().map(|i| keypoints[i]).collect()
}
