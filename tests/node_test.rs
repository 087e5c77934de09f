use mot_node::{Frame, SimpleTrackerConfig, TrackerConfig, TrackingNode, TrackingType};
use ndarray::{Array2, array};

const WIDTH: u32 = 600;
const HEIGHT: u32 = 400;

fn blank() -> Vec<u8> {
    vec![0u8; (WIDTH * HEIGHT * 3) as usize]
}

fn labels(n: usize) -> Vec<String> {
    vec!["person".to_string(); n]
}

#[test]
fn test_bot_sort_node_scenario() {
    let data = blank();
    let frame = Frame::new(&data, WIDTH, HEIGHT).unwrap();
    let mut node = TrackingNode::new(TrackerConfig::default()).unwrap();

    let bboxes = array![[0.1f32, 0.2, 0.3, 0.4]];
    let empty = Array2::<f32>::zeros((0, 4));

    // frames 0..4: one stable detection, one stable id
    for _ in 0..4 {
        let out = node
            .track_detections(&frame, bboxes.view(), &labels(1), &[0.9])
            .unwrap();
        assert_eq!(out.ids, vec![1]);
        assert_eq!(out.labels, vec!["person".to_string()]);
        assert_eq!(out.ids.len(), out.bboxes.nrows());
        assert_eq!(out.ids.len(), out.scores.len());
    }

    // the detector drops out: the lost track keeps appearing with its
    // predicted box, renormalized
    let out = node
        .track_detections(&frame, empty.view(), &[], &[])
        .unwrap();
    assert_eq!(out.ids, vec![1]);
    let bbox = out.bboxes.row(0);
    assert!((bbox[0] - 0.1).abs() < 0.05);
    assert!((bbox[1] - 0.2).abs() < 0.05);

    // after the full lost buffer (30 more misses), id 1 is gone for good
    for _ in 0..30 {
        node.track_detections(&frame, empty.view(), &[], &[]).unwrap();
    }
    let out = node
        .track_detections(&frame, empty.view(), &[], &[])
        .unwrap();
    assert!(out.ids.is_empty());

    let out = node
        .track_detections(&frame, bboxes.view(), &labels(1), &[0.9])
        .unwrap();
    assert_eq!(out.ids, vec![2]);
}

#[test]
fn test_iou_node_tracks_across_frames() {
    let data = blank();
    let frame = Frame::new(&data, WIDTH, HEIGHT).unwrap();
    let mut node = TrackingNode::new(TrackerConfig::Simple(SimpleTrackerConfig::default()))
        .unwrap();

    let out = node
        .track_detections(
            &frame,
            array![[0.1f32, 0.2, 0.3, 0.4], [0.6, 0.6, 0.8, 0.9]].view(),
            &labels(2),
            &[0.9, 0.8],
        )
        .unwrap();
    assert_eq!(out.ids.len(), 2);

    let out2 = node
        .track_detections(
            &frame,
            array![[0.11f32, 0.2, 0.31, 0.4], [0.6, 0.61, 0.8, 0.91]].view(),
            &labels(2),
            &[0.9, 0.8],
        )
        .unwrap();
    let mut a = out.ids.clone();
    let mut b = out2.ids.clone();
    a.sort_unstable();
    b.sort_unstable();
    assert_eq!(a, b);
}

#[test]
fn test_mosse_node_follows_object_between_detections() {
    // 16x16 bright square on black, moving a few pixels per frame
    let square_at = |x: usize, y: usize| {
        let mut data = blank();
        for row in y..y + 16 {
            for col in x..x + 16 {
                let base = (row * WIDTH as usize + col) * 3;
                data[base] = 255;
                data[base + 1] = 255;
                data[base + 2] = 255;
            }
        }
        data
    };
    let norm = |px: f32, size: u32| px / size as f32;

    let mut node = TrackingNode::new(TrackerConfig::Simple(SimpleTrackerConfig {
        tracking_type: TrackingType::Mosse,
        ..Default::default()
    }))
    .unwrap();

    let data = square_at(100, 100);
    let frame = Frame::new(&data, WIDTH, HEIGHT).unwrap();
    let bboxes = array![[
        norm(96.0, WIDTH),
        norm(96.0, HEIGHT),
        norm(120.0, WIDTH),
        norm(120.0, HEIGHT)
    ]];
    let out = node
        .track_detections(&frame, bboxes.view(), &labels(1), &[0.9])
        .unwrap();
    assert_eq!(out.ids.len(), 1);
    let id = out.ids[0];

    // two frames with no detector output: correlation keeps the identity
    let empty = Array2::<f32>::zeros((0, 4));
    for (x, y) in [(103usize, 101usize), (106, 102)] {
        let data = square_at(x, y);
        let frame = Frame::new(&data, WIDTH, HEIGHT).unwrap();
        let out = node
            .track_detections(&frame, empty.view(), &[], &[])
            .unwrap();
        assert_eq!(out.ids, vec![id]);
    }
}

#[test]
fn test_node_rejects_mismatched_inputs_without_state_change() {
    let data = blank();
    let frame = Frame::new(&data, WIDTH, HEIGHT).unwrap();
    let mut node = TrackingNode::new(TrackerConfig::default()).unwrap();

    let bboxes = array![[0.1f32, 0.2, 0.3, 0.4]];
    node.track_detections(&frame, bboxes.view(), &labels(1), &[0.9])
        .unwrap();

    // scores array too short: the call fails and the track is untouched
    assert!(
        node.track_detections(&frame, bboxes.view(), &labels(1), &[])
            .is_err()
    );

    let out = node
        .track_detections(&frame, bboxes.view(), &labels(1), &[0.9])
        .unwrap();
    assert_eq!(out.ids, vec![1]);
}
