mod common;

use bibscore::config::LinkConfig;
use bibscore::linking::{ClusterContext, LinkPredictor};
use bibscore::models::LinkRule;
use common::fixtures::{bib, face, rect};

fn predictor() -> LinkPredictor {
    LinkPredictor::new(LinkConfig::default())
}

#[test]
fn single_face_single_bib_links_directly() {
    // Face 0.1 tall centered at (0.45, 0.15): the torso band spans
    // y in [0.25, 0.50], x in [0.39, 0.51].
    let faces = vec![face(rect(0.40, 0.10, 0.10, 0.10), 0.9)];
    let bibs = vec![bib("421", 0.8, rect(0.40, 0.30, 0.10, 0.06))];

    let links = predictor().predict(&bibs, &faces, &[], &ClusterContext::new());
    assert_eq!(links.len(), 1);
    assert_eq!((links[0].bib_index, links[0].face_index), (0, 0));
    assert_eq!(links[0].rule, LinkRule::Direct);
    assert!((links[0].bib_confidence - 0.8).abs() < 1e-6);
    assert!((links[0].face_confidence - 0.9).abs() < 1e-6);
}

#[test]
fn bib_outside_torso_region_is_not_linked() {
    let faces = vec![face(rect(0.40, 0.10, 0.10, 0.10), 0.9)];
    // Centroid far to the left of the band.
    let bibs = vec![bib("421", 0.8, rect(0.05, 0.30, 0.10, 0.06))];
    let links = predictor().predict(&bibs, &faces, &[], &ClusterContext::new());
    assert!(links.is_empty());
}

#[test]
fn bib_above_face_is_not_linked() {
    let faces = vec![face(rect(0.40, 0.40, 0.10, 0.10), 0.9)];
    // Inside the horizontal band but above the face.
    let bibs = vec![bib("421", 0.8, rect(0.40, 0.10, 0.10, 0.06))];
    let links = predictor().predict(&bibs, &faces, &[], &ClusterContext::new());
    assert!(links.is_empty());
}

#[test]
fn low_confidence_bib_is_not_eligible() {
    let faces = vec![face(rect(0.40, 0.10, 0.10, 0.10), 0.9)];
    // In-region but below the 0.5 confidence floor.
    let bibs = vec![bib("421", 0.3, rect(0.40, 0.30, 0.10, 0.06))];
    let links = predictor().predict(&bibs, &faces, &[], &ClusterContext::new());
    assert!(links.is_empty());
}

#[test]
fn multiple_faces_fall_back_to_nearest_centroid() {
    let faces = vec![
        face(rect(0.10, 0.10, 0.10, 0.10), 0.9),
        face(rect(0.60, 0.10, 0.10, 0.10), 0.85),
    ];
    let bibs = vec![
        bib("100", 0.8, rect(0.10, 0.30, 0.10, 0.06)),
        bib("200", 0.8, rect(0.60, 0.30, 0.10, 0.06)),
    ];

    let mut links = predictor().predict(&bibs, &faces, &[], &ClusterContext::new());
    links.sort_by_key(|l| l.face_index);
    assert_eq!(links.len(), 2);
    assert_eq!((links[0].bib_index, links[0].face_index), (0, 0));
    assert_eq!((links[1].bib_index, links[1].face_index), (1, 1));
    assert!(links.iter().all(|l| l.rule == LinkRule::Direct));
}

#[test]
fn each_bib_is_claimed_at_most_once() {
    // Two faces share one bib candidate below them both.
    let faces = vec![
        face(rect(0.38, 0.10, 0.10, 0.10), 0.9),
        face(rect(0.46, 0.10, 0.10, 0.10), 0.85),
    ];
    let bibs = vec![bib("300", 0.8, rect(0.42, 0.30, 0.10, 0.06))];

    let links = predictor().predict(&bibs, &faces, &[], &ClusterContext::new());
    assert_eq!(links.len(), 1);
}

#[test]
fn cluster_inheritance_overrides_nearest_centroid() {
    // The left face's cluster has strong history with "200", which sits
    // farther away than "100" inside the same torso band.
    let faces = vec![
        face(rect(0.40, 0.10, 0.10, 0.10), 0.9),
        face(rect(0.80, 0.70, 0.10, 0.10), 0.85),
    ];
    let bibs = vec![
        bib("100", 0.8, rect(0.40, 0.28, 0.10, 0.06)),
        bib("200", 0.8, rect(0.41, 0.42, 0.10, 0.06)),
    ];

    let mut ctx = ClusterContext::new();
    ctx.record_link("cluster-a", "200", 2.5);
    let clusters = vec![Some("cluster-a".to_string()), None];

    let links = predictor().predict(&bibs, &faces, &clusters, &ctx);
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].bib_index, 1);
    assert_eq!(links[0].rule, LinkRule::ClusterInheritance);
}

#[test]
fn weak_affinity_does_not_inherit() {
    let faces = vec![
        face(rect(0.40, 0.10, 0.10, 0.10), 0.9),
        face(rect(0.80, 0.70, 0.10, 0.10), 0.85),
    ];
    let bibs = vec![
        bib("100", 0.8, rect(0.40, 0.28, 0.10, 0.06)),
        bib("200", 0.8, rect(0.41, 0.42, 0.10, 0.06)),
    ];

    let mut ctx = ClusterContext::new();
    // Below the 2.0 affinity floor.
    ctx.record_link("cluster-a", "200", 1.0);
    let clusters = vec![Some("cluster-a".to_string()), None];

    let links = predictor().predict(&bibs, &faces, &clusters, &ctx);
    assert_eq!(links.len(), 1);
    assert_eq!(links[0].bib_index, 0);
    assert_eq!(links[0].rule, LinkRule::Direct);
}

#[test]
fn affinity_accumulates_across_recordings() {
    let mut ctx = ClusterContext::new();
    ctx.record_link("c", "42", 1.0);
    ctx.record_link("c", "42", 1.5);
    assert!((ctx.affinity("c", "42") - 2.5).abs() < 1e-6);
    assert_eq!(ctx.affinity("c", "77"), 0.0);
    assert_eq!(ctx.affinity("other", "42"), 0.0);
}
