use image::{GrayImage, Luma};
use imageproc::region_labelling::{Connectivity, connected_components};
use std::collections::HashMap;

use crate::models::Region;

/// Find bright regions in a binarized image using connected components.
pub fn find_regions(binary: &GrayImage, min_area: u32) -> Vec<Region> {
    // Label connected components (white pixels = bright candidates)
    let labeled = connected_components(binary, Connectivity::Eight, Luma([0]));

    let mut bounds: HashMap<u32, (u32, u32, u32, u32, u32)> = HashMap::new();

    for (x, y, label) in labeled.enumerate_pixels() {
        let label_val = label[0];
        if label_val == 0 {
            continue; // Skip background
        }

        bounds
            .entry(label_val)
            .and_modify(|(min_x, min_y, max_x, max_y, count)| {
                *min_x = (*min_x).min(x);
                *min_y = (*min_y).min(y);
                *max_x = (*max_x).max(x);
                *max_y = (*max_y).max(y);
                *count += 1;
            })
            .or_insert((x, y, x, y, 1));
    }

    let mut regions: Vec<Region> = bounds
        .into_iter()
        .map(|(label, (min_x, min_y, max_x, max_y, count))| Region {
            label,
            min_x,
            min_y,
            max_x,
            max_y,
            pixel_count: count,
        })
        .filter(|r| r.pixel_count >= min_area)
        .collect();

    // HashMap iteration order is arbitrary; keep the output deterministic.
    regions.sort_by_key(|r| (r.min_y, r.min_x, r.label));
    regions
}
