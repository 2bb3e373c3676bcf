use std::collections::HashMap;

use crate::config::LinkConfig;
use crate::models::{BibDetection, FaceBox, Link, LinkRule};

/// Cross-photo cluster knowledge, passed in explicitly by whoever owns the
/// identity grouping. Records how strongly a face cluster has been linked
/// to each bib number in other photos; this engine only reads it.
#[derive(Debug, Clone, Default)]
pub struct ClusterContext {
    affinities: HashMap<String, HashMap<String, f32>>,
}

impl ClusterContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate evidence that a cluster wears a bib number.
    pub fn record_link(&mut self, cluster: &str, bib_text: &str, weight: f32) {
        *self
            .affinities
            .entry(cluster.to_string())
            .or_default()
            .entry(bib_text.to_string())
            .or_insert(0.0) += weight;
    }

    pub fn affinity(&self, cluster: &str, bib_text: &str) -> f32 {
        self.affinities
            .get(cluster)
            .and_then(|bibs| bibs.get(bib_text))
            .copied()
            .unwrap_or(0.0)
    }
}

/// The search area below a face where its wearer's bib should sit. All
/// offsets are in face-heights, so the band scales with the face; the
/// band may extend past the image edge.
#[derive(Debug, Clone, Copy)]
struct TorsoRegion {
    x_min: f32,
    x_max: f32,
    y_min: f32,
    y_max: f32,
}

impl TorsoRegion {
    fn for_face(face: &FaceBox, cfg: &LinkConfig) -> Self {
        let (cx, cy) = face.bbox.centroid();
        let fh = face.bbox.h;
        Self {
            x_min: cx - cfg.torso_half_width * fh,
            x_max: cx + cfg.torso_half_width * fh,
            y_min: cy + cfg.torso_bottom_offset * fh,
            y_max: cy + cfg.torso_far_offset * fh,
        }
    }

    fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x_min && px <= self.x_max && py >= self.y_min && py <= self.y_max
    }
}

/// Predicts which face wears which bib using the torso-region prior,
/// with cluster inheritance when the photo has several people.
pub struct LinkPredictor {
    cfg: LinkConfig,
}

impl LinkPredictor {
    pub fn new(cfg: LinkConfig) -> Self {
        Self { cfg }
    }

    /// Predict links for one photo. `face_clusters` aligns with `faces`
    /// by index; missing or shorter slices mean no cluster knowledge.
    pub fn predict(
        &self,
        bibs: &[BibDetection],
        faces: &[FaceBox],
        face_clusters: &[Option<String>],
        ctx: &ClusterContext,
    ) -> Vec<Link> {
        let eligible: Vec<usize> = bibs
            .iter()
            .enumerate()
            .filter(|(_, b)| b.confidence >= self.cfg.min_bib_confidence && !b.bbox.is_degenerate())
            .map(|(i, _)| i)
            .collect();

        if eligible.is_empty() || faces.is_empty() {
            return Vec::new();
        }

        // Candidate bibs per face: centroid inside the torso region.
        let candidates_for = |face: &FaceBox| -> Vec<usize> {
            let region = TorsoRegion::for_face(face, &self.cfg);
            eligible
                .iter()
                .copied()
                .filter(|&bi| {
                    let (bx, by) = bibs[bi].bbox.centroid();
                    region.contains(bx, by)
                })
                .collect()
        };

        // One face, one eligible candidate: link unconditionally.
        if faces.len() == 1 {
            let candidates = candidates_for(&faces[0]);
            return match candidates.as_slice() {
                [] => Vec::new(),
                &[only] => vec![make_link(bibs, faces, only, 0, LinkRule::Direct)],
                several => nearest_of(bibs, &faces[0], several)
                    .map(|bi| vec![make_link(bibs, faces, bi, 0, LinkRule::Direct)])
                    .unwrap_or_default(),
            };
        }

        // Several faces: cluster inheritance first, nearest centroid as
        // the fallback. Each bib is claimed at most once, faces in index
        // order for reproducibility.
        let mut claimed: Vec<usize> = Vec::new();
        let mut links = Vec::new();

        for (fi, face) in faces.iter().enumerate() {
            let open: Vec<usize> = candidates_for(face)
                .into_iter()
                .filter(|bi| !claimed.contains(bi))
                .collect();
            if open.is_empty() {
                continue;
            }

            let cluster = face_clusters.get(fi).and_then(|c| c.as_deref());
            let inherited = cluster.and_then(|c| self.inherit_from_cluster(bibs, face, c, &open, ctx));

            let (chosen, rule) = match inherited {
                Some(bi) => (bi, LinkRule::ClusterInheritance),
                None => match nearest_of(bibs, face, &open) {
                    Some(bi) => (bi, LinkRule::Direct),
                    None => continue,
                },
            };

            claimed.push(chosen);
            links.push(make_link(bibs, faces, chosen, fi, rule));
        }

        links
    }

    /// Pick the candidate bib this face's cluster is already strongly
    /// linked to in other photos, if any qualifies.
    fn inherit_from_cluster(
        &self,
        bibs: &[BibDetection],
        face: &FaceBox,
        cluster: &str,
        open: &[usize],
        ctx: &ClusterContext,
    ) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for &bi in open {
            let affinity = ctx.affinity(cluster, &bibs[bi].text);
            if affinity < self.cfg.min_cluster_affinity {
                continue;
            }
            let better = match best {
                None => true,
                Some((prev_bi, prev_aff)) => {
                    affinity > prev_aff
                        || (affinity == prev_aff
                            && centroid_distance(bibs, face, bi)
                                < centroid_distance(bibs, face, prev_bi))
                }
            };
            if better {
                best = Some((bi, affinity));
            }
        }
        best.map(|(bi, _)| bi)
    }
}

fn make_link(
    bibs: &[BibDetection],
    faces: &[FaceBox],
    bib_index: usize,
    face_index: usize,
    rule: LinkRule,
) -> Link {
    Link {
        bib_index,
        face_index,
        rule,
        bib_confidence: bibs[bib_index].confidence,
        face_confidence: faces[face_index].confidence,
    }
}

fn centroid_distance(bibs: &[BibDetection], face: &FaceBox, bi: usize) -> f32 {
    let (fx, fy) = face.bbox.centroid();
    let (bx, by) = bibs[bi].bbox.centroid();
    ((fx - bx).powi(2) + (fy - by).powi(2)).sqrt()
}

fn nearest_of(bibs: &[BibDetection], face: &FaceBox, candidates: &[usize]) -> Option<usize> {
    candidates.iter().copied().min_by(|&a, &b| {
        centroid_distance(bibs, face, a)
            .total_cmp(&centroid_distance(bibs, face, b))
            .then(a.cmp(&b))
    })
}
