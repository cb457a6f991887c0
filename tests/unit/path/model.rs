use super::*;
use crate::foundation::core::Point;

fn path_of(xy: &[(f64, f64)]) -> PathModel {
    PathModel::from_points(xy.iter().map(|&(x, y)| ControlPoint::at(x, y)).collect()).unwrap()
}

#[test]
fn single_point_is_duplicated_into_zero_length_line() {
    let p = PathModel::from_points(vec![ControlPoint::at(5.0, 7.0)]).unwrap();
    assert_eq!(p.len(), 2);
    assert_eq!(p.point_idx_max(), 1);
    assert_eq!(p.points()[0], p.points()[1]);
    assert_eq!(p.total_length(), 0.0);
}

#[test]
fn empty_and_oversized_inputs_are_rejected() {
    assert!(PathModel::from_points(vec![]).is_err());
    assert!(PathModel::from_points(vec![ControlPoint::default(); MAX_POINTS + 1]).is_err());
    assert!(PathModel::from_points(vec![ControlPoint::default(); MAX_POINTS]).is_ok());
}

#[test]
fn push_stops_at_capacity() {
    let mut p = PathModel::from_points(vec![ControlPoint::default(); MAX_POINTS]).unwrap();
    assert!(p.push(ControlPoint::default()).is_err());
    assert_eq!(p.len(), MAX_POINTS);
}

#[test]
fn insert_and_delete_move_the_cursor() {
    let mut p = path_of(&[(0.0, 0.0), (10.0, 0.0)]);
    p.insert_after_current(ControlPoint::at(5.0, 5.0)).unwrap();
    assert_eq!(p.current(), 1);
    assert_eq!(p.points()[1].position, Point::new(5.0, 5.0));

    p.delete_current();
    assert_eq!(p.current(), 0);
    assert_eq!(p.len(), 2);

    p.delete_current();
    assert_eq!(p.len(), 2);
    assert_eq!(p.points()[0].position, Point::new(10.0, 0.0));
}

#[test]
fn set_current_is_checked() {
    let mut p = path_of(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
    assert!(p.set_current(2).is_ok());
    assert!(p.set_current(3).is_err());
    assert_eq!(p.current(), 2);
}

#[test]
fn line_and_total_lengths() {
    let p = path_of(&[(0.0, 0.0), (3.0, 4.0), (3.0, 10.0)]);
    assert_eq!(p.line_length(0), 0.0);
    assert_eq!(p.line_length(1), 5.0);
    assert_eq!(p.line_length(2), 6.0);
    assert_eq!(p.total_length(), 11.0);
    assert_eq!(p.span_length(1, 2), 6.0);
}

#[test]
fn reset_attributes_keeps_positions_and_keyframes() {
    let mut p = path_of(&[(0.0, 0.0), (4.0, 4.0), (8.0, 0.0)]);
    {
        let mid = p.point_mut(1).unwrap();
        mid.opacity = 20.0;
        mid.rotation = 45.0;
        mid.keyframe = 3;
    }
    p.reset_attributes();
    let mid = p.points()[1];
    assert_eq!(mid.opacity, 100.0);
    assert_eq!(mid.rotation, 0.0);
    assert_eq!(mid.keyframe, 3);
    assert_eq!(mid.position, Point::new(4.0, 4.0));
}

#[test]
fn invert_mirrors_keyframes() {
    let mut p = path_of(&[(0.0, 0.0), (4.0, 0.0), (8.0, 0.0), (12.0, 0.0)]);
    p.point_mut(1).unwrap().keyframe = 2;
    p.invert(10);
    assert_eq!(p.points()[0].position, Point::new(12.0, 0.0));
    assert_eq!(p.points()[2].keyframe, 7);
    assert_eq!(p.points()[1].keyframe, 0);
}

#[test]
fn rotate_follow_tracks_direction_without_wrapping() {
    let mut p = path_of(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]);
    p.rotate_follow(0.0);
    let rot: Vec<f64> = p.points().iter().map(|c| c.rotation).collect();
    assert_eq!(rot[0], 0.0);
    assert!((rot[1] - 45.0).abs() < 1e-9);
    assert!((rot[2] - 135.0).abs() < 1e-9);
    assert!((rot[3] - 225.0).abs() < 1e-9);
    assert!((rot[4] - 270.0).abs() < 1e-9);
}

#[test]
fn keyframe_mirrors_roundtrip_through_descending_span() {
    let span = FrameSpan::new(20, 11).unwrap();
    let mut p = path_of(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
    p.point_mut(1).unwrap().keyframe = 4;
    p.sync_keyframes_abs(span);
    assert_eq!(p.points()[1].keyframe_abs, 16);

    p.point_mut(1).unwrap().keyframe = 0;
    p.apply_keyframes_abs(span);
    assert_eq!(p.points()[1].keyframe, 4);

    p.point_mut(1).unwrap().keyframe_abs = 30;
    p.apply_keyframes_abs(span);
    assert_eq!(p.points()[1].keyframe, 0);
}
