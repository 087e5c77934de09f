//! Conversions between normalized and pixel bounding box coordinates.
//!
//! Pipeline nodes exchange boxes as (N, 4) arrays of normalized
//! (x1, y1, x2, y2) coordinates; the trackers work in pixels. Both functions
//! are pure and elementwise, and invert each other to float tolerance.

use ndarray::{Array2, ArrayView2};

/// Scale normalized (x1, y1, x2, y2) boxes to pixel coordinates.
pub fn denormalize(bboxes: &ArrayView2<f32>, height: u32, width: u32) -> Array2<f32> {
    let (w, h) = (width as f32, height as f32);
    let mut out = bboxes.to_owned();
    for mut row in out.rows_mut() {
        row[0] *= w;
        row[1] *= h;
        row[2] *= w;
        row[3] *= h;
    }
    out
}

/// Scale pixel (x1, y1, x2, y2) boxes back to normalized coordinates.
pub fn normalize(bboxes: &ArrayView2<f32>, height: u32, width: u32) -> Array2<f32> {
    let (w, h) = (width as f32, height as f32);
    let mut out = bboxes.to_owned();
    for mut row in out.rows_mut() {
        row[0] /= w;
        row[1] /= h;
        row[2] /= w;
        row[3] /= h;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_denormalize() {
        let bboxes = array![[0.1f32, 0.2, 0.3, 0.4]];
        let px = denormalize(&bboxes.view(), 400, 600);
        assert!((px[[0, 0]] - 60.0).abs() < 1e-4);
        assert!((px[[0, 1]] - 80.0).abs() < 1e-4);
        assert!((px[[0, 2]] - 180.0).abs() < 1e-4);
        assert!((px[[0, 3]] - 160.0).abs() < 1e-4);
    }

    #[test]
    fn test_round_trip_is_identity() {
        let bboxes = array![[0.1f32, 0.2, 0.3, 0.4], [0.0, 0.0, 1.0, 1.0]];
        let restored = normalize(&denormalize(&bboxes.view(), 417, 603).view(), 417, 603);
        for (a, b) in bboxes.iter().zip(restored.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_empty_input() {
        let bboxes = Array2::<f32>::zeros((0, 4));
        assert_eq!(denormalize(&bboxes.view(), 400, 600).dim(), (0, 4));
        assert_eq!(normalize(&bboxes.view(), 400, 600).dim(), (0, 4));
    }
}
