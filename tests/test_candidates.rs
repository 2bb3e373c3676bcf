use image::{DynamicImage, GrayImage, Luma};

use bibscore::build_candidate_pipeline;
use bibscore::config::CandidateConfig;
use bibscore::detection::candidates::search_candidates;
use bibscore::models::RejectReason;

fn dark_frame(w: u32, h: u32) -> GrayImage {
    GrayImage::from_pixel(w, h, Luma([40u8]))
}

fn fill(img: &mut GrayImage, x0: u32, y0: u32, w: u32, h: u32, value: u8) {
    for y in y0..y0 + h {
        for x in x0..x0 + w {
            img.put_pixel(x, y, Luma([value]));
        }
    }
}

#[test]
fn bright_plate_passes_all_filters() {
    let mut img = dark_frame(640, 480);
    fill(&mut img, 120, 200, 90, 60, 230);

    let found = search_candidates(&img, &CandidateConfig::default());
    let passing: Vec<_> = found.iter().filter(|c| c.passed()).collect();
    assert_eq!(passing.len(), 1);

    let c = passing[0];
    // Blur smears the edges a little; bounds stay close to the plate.
    assert!(c.region.min_x >= 115 && c.region.min_x <= 125);
    assert!(c.region.min_y >= 195 && c.region.min_y <= 205);
    assert!(c.median_brightness > 200.0);
    assert!(c.mean_brightness > 180.0);
    assert!(c.aspect_ratio > 1.0 && c.aspect_ratio < 2.0);
}

#[test]
fn thin_streak_is_rejected_for_aspect() {
    let mut img = dark_frame(640, 480);
    fill(&mut img, 100, 200, 200, 8, 230);

    let cfg = CandidateConfig {
        // Keep the streak from being blurred below the binarize floor.
        blur_sigma: 0.5,
        ..CandidateConfig::default()
    };
    let found = search_candidates(&img, &cfg);
    assert!(
        found
            .iter()
            .any(|c| c.reject == Some(RejectReason::AspectOutOfBand))
    );
    assert!(found.iter().all(|c| !c.passed()));
}

#[test]
fn oversized_region_is_rejected_for_relative_size() {
    let mut img = dark_frame(640, 480);
    // 39% of the frame, over the 30% ceiling.
    fill(&mut img, 100, 80, 400, 300, 230);

    let found = search_candidates(&img, &CandidateConfig::default());
    assert!(
        found
            .iter()
            .any(|c| c.reject == Some(RejectReason::RelativeSizeOutOfBand))
    );
}

#[test]
fn hollow_bright_ring_fails_brightness_floors() {
    // A bright outline around a dark interior: the component is bright
    // but the region's interior drags the median down. This is the dark
    // text on dark background false positive the floors exist for.
    let mut img = dark_frame(640, 480);
    fill(&mut img, 200, 200, 80, 60, 230);
    fill(&mut img, 210, 210, 60, 40, 40);

    let cfg = CandidateConfig {
        blur_sigma: 0.5,
        ..CandidateConfig::default()
    };
    let found = search_candidates(&img, &cfg);
    assert!(found.iter().any(|c| matches!(
        c.reject,
        Some(RejectReason::LowMedianBrightness) | Some(RejectReason::LowMeanBrightness)
    )));
}

#[test]
fn dim_regions_never_become_candidates() {
    let mut img = dark_frame(640, 480);
    // Below the binarize threshold entirely.
    fill(&mut img, 120, 200, 90, 60, 120);

    let found = search_candidates(&img, &CandidateConfig::default());
    assert!(found.is_empty());
}

#[test]
fn composable_pipeline_finds_the_same_plates() {
    let mut gray = dark_frame(640, 480);
    fill(&mut gray, 120, 250, 90, 60, 235);
    fill(&mut gray, 400, 260, 90, 60, 225);
    let img = DynamicImage::ImageLuma8(gray);

    let pipeline = build_candidate_pipeline(&CandidateConfig::default(), false);
    let items = pipeline.run(img).unwrap();

    assert_eq!(items.len(), 2);
    for item in &items {
        let c = item.candidate.as_ref().expect("candidate attached");
        assert!(c.passed());
        // The crop carries the padded region.
        assert!(item.image.width() >= c.region.width());
        assert!(item.image.height() >= c.region.height());
    }
}
