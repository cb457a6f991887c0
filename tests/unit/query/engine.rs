use super::*;
use crate::{
    animation::accel::Accel,
    foundation::math::approx_eq,
    path::point::{AccelGroup, ControlPoint},
};

fn straight(to_x: f64) -> PathModel {
    PathModel::from_points(vec![ControlPoint::at(0.0, 0.0), ControlPoint::at(to_x, 0.0)]).unwrap()
}

fn pinned() -> PathModel {
    PathModel::from_points(vec![
        ControlPoint::at(0.0, 0.0),
        ControlPoint::at(30.0, 0.0).with_keyframe(3),
        ControlPoint::at(150.0, 0.0),
    ])
    .unwrap()
}

#[test]
fn constant_speed_reports_equal_min_and_max() {
    let path = straight(90.0);
    let r = QueryEngine::new(&path, 10, 0).query(0).unwrap();

    assert_eq!(r.segment_number, 1);
    assert_eq!(r.segment, Segment { start: 0, end: 1 });
    assert_eq!(r.segment_length, 90.0);
    assert_eq!(r.samples, 10);
    assert!(approx_eq(r.min_step, 10.0));
    assert!(approx_eq(r.max_step, 10.0));
}

#[test]
fn tweens_split_the_per_frame_step() {
    let path = straight(90.0);
    let r = QueryEngine::new(&path, 10, 1).query(1).unwrap();

    assert_eq!(r.samples, 19);
    assert!(approx_eq(r.min_step, 5.0));
    assert!(approx_eq(r.max_step, 5.0));
}

#[test]
fn first_segment_walk_stops_at_its_keyframe() {
    let path = pinned();
    let r = QueryEngine::new(&path, 10, 0).query(0).unwrap();

    assert_eq!(r.segment_number, 1);
    assert_eq!(r.segment_length, 30.0);
    assert_eq!(r.samples, 4);
    assert!(approx_eq(r.max_step, 10.0));
}

#[test]
fn last_point_falls_back_to_final_segment() {
    let path = pinned();
    let r = QueryEngine::new(&path, 10, 0).query(2).unwrap();

    assert_eq!(r.segment_number, 2);
    assert_eq!(r.segment, Segment { start: 1, end: 2 });
    assert_eq!(r.samples, 6);
    assert!(approx_eq(r.min_step, 20.0));
    assert!(approx_eq(r.max_step, 20.0));

    let past_end = QueryEngine::new(&path, 10, 0).query(99).unwrap();
    assert_eq!(past_end.segment_number, 2);
}

#[test]
fn ease_in_grows_the_step() {
    let mut points = vec![ControlPoint::at(0.0, 0.0), ControlPoint::at(100.0, 0.0)];
    points[0] = points[0].with_accel(AccelGroup {
        position: Accel(11),
        ..AccelGroup::default()
    });
    let path = PathModel::from_points(points).unwrap();
    let r = QueryEngine::new(&path, 11, 0).query(0).unwrap();

    // t^2 over ten steps: first step 1px, last step 19px
    assert!(approx_eq(r.min_step, 1.0));
    assert!(approx_eq(r.max_step, 19.0));
}

#[test]
fn zero_frames_is_rejected() {
    let path = straight(10.0);
    assert!(matches!(
        QueryEngine::new(&path, 0, 0).query(0),
        Err(MovePathError::Validation(_))
    ));
}
