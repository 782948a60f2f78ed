//! Brute-force Hamming matching with a min-distance ratio filter.

use super::orb::Descriptor;
use serde::Serialize;

/// Nearest scene descriptor for one template descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureMatch {
    pub template_idx: usize,
    pub scene_idx: usize,
    pub distance: u32,
}

#[inline]
pub fn hamming(a: &Descriptor, b: &Descriptor) -> u32 {
    a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// One match per template descriptor; ties go to the lowest scene index.
pub fn match_brute_force(template: &[Descriptor], scene: &[Descriptor]) -> Vec<FeatureMatch> {
    if scene.is_empty() {
        return Vec::new();
    }
    template
        .iter()
        .enumerate()
        .map(|(template_idx, t)| {
            let mut best = FeatureMatch {
                template_idx,
                scene_idx: 0,
                distance: u32::MAX,
            };
            for (scene_idx, s) in scene.iter().enumerate() {
                let distance = hamming(t, s);
                if distance < best.distance {
                    best.scene_idx = scene_idx;
                    best.distance = distance;
                }
            }
            best
        })
        .collect()
}

pub fn min_distance(matches: &[FeatureMatch]) -> Option<u32> {
    matches.iter().map(|m| m.distance).min()
}

/// Keeps matches with `distance < ratio * max(min_distance, floor)`.
pub fn filter_by_min_distance(matches: &[FeatureMatch], ratio: f32, floor: f32) -> Vec<FeatureMatch> {
    let Some(min) = min_distance(matches) else {
        return Vec::new();
    };
    let limit = ratio * (min as f32).max(floor);
    matches
        .iter()
        .copied()
        .filter(|m| (m.distance as f32) < limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_distances(distances: &[u32]) -> Vec<FeatureMatch> {
        distances
            .iter()
            .enumerate()
            .map(|(i, &distance)| FeatureMatch {
                template_idx: i,
                scene_idx: i,
                distance,
            })
            .collect()
    }

    #[test]
    fn hamming_counts_differing_bits() {
        let a = [0u8; 32];
        let mut b = [0u8; 32];
        b[0] = 0b1011;
        b[31] = 0xff;
        assert_eq!(hamming(&a, &b), 11);
        assert_eq!(hamming(&b, &b), 0);
    }

    #[test]
    fn nearest_neighbour_prefers_lowest_index_on_ties() {
        let mut t = [0u8; 32];
        t[0] = 0b1;
        let s0 = [0u8; 32];
        let mut s1 = [0u8; 32];
        s1[0] = 0b11;
        let s2 = t;
        let matches = match_brute_force(&[t, s0], &[s0, s1, s2, t]);
        assert_eq!(matches[0].scene_idx, 2);
        assert_eq!(matches[0].distance, 0);
        assert_eq!(matches[1].scene_idx, 0);
        assert!(match_brute_force(&[t], &[]).is_empty());
    }

    #[test]
    fn ratio_filter_is_relative_to_best_match() {
        let kept = filter_by_min_distance(&with_distances(&[2, 4, 8, 20]), 4.0, 1.0);
        let distances: Vec<u32> = kept.iter().map(|m| m.distance).collect();
        assert_eq!(distances, vec![2, 4]);
    }

    #[test]
    fn zero_minimum_without_floor_keeps_nothing() {
        assert!(filter_by_min_distance(&with_distances(&[0, 0, 3, 9]), 4.0, 0.0).is_empty());
    }

    #[test]
    fn floor_keeps_exact_matches() {
        let kept = filter_by_min_distance(&with_distances(&[0, 0, 3, 9]), 4.0, 1.0);
        assert_eq!(kept.len(), 3);
        assert!(filter_by_min_distance(&[], 4.0, 1.0).is_empty());
    }
}
