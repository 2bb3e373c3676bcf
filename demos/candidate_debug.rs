//! Paint a synthetic race photo with two bright bib plates and run the
//! inspectable candidate pipeline over it, dumping per-stage images.

use image::{DynamicImage, Rgb, RgbImage};

use bibscore::EngineConfig;
use bibscore::build_candidate_pipeline;

/// Dark background with two bright plates and one dark distractor patch.
fn synthetic_photo() -> DynamicImage {
    let mut img = RgbImage::from_pixel(640, 480, Rgb([40u8, 45u8, 50u8]));

    let mut plate = |x0: u32, y0: u32, w: u32, h: u32, value: u8| {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                img.put_pixel(x, y, Rgb([value, value, value]));
            }
        }
    };

    plate(120, 250, 90, 60, 235); // runner one
    plate(400, 260, 90, 60, 225); // runner two
    plate(300, 100, 40, 40, 70); // too dark to be a plate

    DynamicImage::ImageRgb8(img)
}

fn main() -> anyhow::Result<()> {
    let cfg = EngineConfig::default();
    let img = synthetic_photo();

    let debug_dir = std::env::temp_dir().join("bibscore-candidate-debug");
    if debug_dir.exists() {
        std::fs::remove_dir_all(&debug_dir)?;
    }

    let pipeline = build_candidate_pipeline(&cfg.candidates, true).with_debug(debug_dir.clone())?;
    let items = pipeline.run(img)?;

    println!("\nCandidates found: {}", items.len());
    for item in &items {
        if let Some(c) = &item.candidate {
            println!(
                "  region ({}, {}) {}x{} - median {:.0}, mean {:.0}, aspect {:.2}",
                c.region.min_x,
                c.region.min_y,
                c.region.width(),
                c.region.height(),
                c.median_brightness,
                c.mean_brightness,
                c.aspect_ratio
            );
        }
    }
    println!("\nStage images saved under {}", debug_dir.display());

    Ok(())
}
