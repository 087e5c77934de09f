//! Association engine: cost matrices and gated linear assignment.

use ndarray::Array2;

use crate::tracker::rect::Rect;

/// Outcome of one assignment pass. Index pairs refer into the track and
/// detection slices the cost matrix was built from.
#[derive(Debug, Clone)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Compute the (1 - IoU) cost matrix between track and detection boxes.
pub fn iou_distance(track_boxes: &[Rect], det_boxes: &[Rect]) -> Array2<f32> {
    let mut dists = Array2::zeros((track_boxes.len(), det_boxes.len()));
    for (i, t) in track_boxes.iter().enumerate() {
        for (j, d) in det_boxes.iter().enumerate() {
            dists[[i, j]] = 1.0 - t.iou(d);
        }
    }
    dists
}

/// Blend detection confidence into an IoU cost matrix so that equally
/// overlapping candidates prefer the higher-scoring detection.
pub fn fuse_score(cost_matrix: &mut Array2<f32>, det_scores: &[f32]) {
    let (rows, cols) = cost_matrix.dim();
    for i in 0..rows {
        for j in 0..cols {
            let iou_sim = 1.0 - cost_matrix[[i, j]];
            cost_matrix[[i, j]] = 1.0 - iou_sim * det_scores[j];
        }
    }
}

/// Solve minimum-cost bipartite assignment with a maximum-cost gate.
///
/// The rectangular matrix is padded square with a prohibitive cost before
/// handing it to lapjv; pairs whose original cost exceeds `gate` are
/// rejected back into the unmatched sets. When several minimum-cost
/// assignments exist the solver's scan order decides, which is stable for
/// identical input.
pub fn linear_assignment(cost_matrix: &Array2<f32>, gate: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    if num_rows == 0 || num_cols == 0 {
        return AssignmentResult {
            matches: vec![],
            unmatched_tracks: (0..num_rows).collect(),
            unmatched_detections: (0..num_cols).collect(),
        };
    }

    let size = num_rows.max(num_cols);
    let mut padded = Array2::<f64>::from_elem((size, size), 1e6);

    for i in 0..num_rows {
        for j in 0..num_cols {
            padded[[i, j]] = cost_matrix[[i, j]] as f64;
        }
    }

    let mut matches = vec![];
    let mut unmatched_tracks = vec![];
    let mut unmatched_detections_mask: Vec<bool> = vec![true; num_cols];

    match lapjv::lapjv(&padded) {
        Ok((row_to_col, _)) => {
            for (row_idx, &col_idx) in row_to_col.iter().enumerate() {
                if row_idx >= num_rows {
                    continue;
                }
                if col_idx >= num_cols {
                    unmatched_tracks.push(row_idx);
                } else if cost_matrix[[row_idx, col_idx]] <= gate {
                    matches.push((row_idx, col_idx));
                    unmatched_detections_mask[col_idx] = false;
                } else {
                    unmatched_tracks.push(row_idx);
                }
            }
        }
        Err(_) => {
            unmatched_tracks = (0..num_rows).collect();
        }
    }

    let unmatched_detections: Vec<usize> = unmatched_detections_mask
        .iter()
        .enumerate()
        .filter_map(|(i, &u)| if u { Some(i) } else { None })
        .collect();

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_empty_tracks_routes_all_detections_unmatched() {
        let cost = Array2::<f32>::zeros((0, 3));
        let result = linear_assignment(&cost, 0.8);
        assert!(result.matches.is_empty());
        assert!(result.unmatched_tracks.is_empty());
        assert_eq!(result.unmatched_detections, vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_detections_routes_all_tracks_unmatched() {
        let cost = Array2::<f32>::zeros((2, 0));
        let result = linear_assignment(&cost, 0.8);
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_tracks, vec![0, 1]);
        assert!(result.unmatched_detections.is_empty());
    }

    #[test]
    fn test_assignment_picks_minimum_cost() {
        let cost = array![[0.1f32, 0.9], [0.9, 0.2]];
        let result = linear_assignment(&cost, 0.8);
        let mut matches = result.matches.clone();
        matches.sort();
        assert_eq!(matches, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_gate_rejects_expensive_pairs() {
        let cost = array![[0.95f32]];
        let result = linear_assignment(&cost, 0.8);
        assert!(result.matches.is_empty());
        assert_eq!(result.unmatched_tracks, vec![0]);
        assert_eq!(result.unmatched_detections, vec![0]);
    }

    #[test]
    fn test_rectangular_leaves_extra_detections_unmatched() {
        let cost = array![[0.1f32, 0.5, 0.6]];
        let result = linear_assignment(&cost, 0.8);
        assert_eq!(result.matches, vec![(0, 0)]);
        assert_eq!(result.unmatched_detections, vec![1, 2]);
    }

    #[test]
    fn test_fuse_score() {
        let mut cost = array![[0.2f32]]; // iou sim 0.8
        fuse_score(&mut cost, &[0.5]);
        assert!((cost[[0, 0]] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_iou_distance_identical_boxes() {
        let boxes = vec![Rect::new(0.0, 0.0, 10.0, 10.0)];
        let dists = iou_distance(&boxes, &boxes);
        assert!(dists[[0, 0]].abs() < 1e-6);
    }
}
