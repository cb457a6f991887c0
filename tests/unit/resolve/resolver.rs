use super::*;
use crate::{
    path::point::AccelGroup,
    schedule::timing::SegmentScheduler,
    schedule::tween::FrameTweenIterator,
};

fn path(points: Vec<ControlPoint>) -> PathModel {
    PathModel::from_points(points).unwrap()
}

fn uneven() -> PathModel {
    let mut pts = vec![
        ControlPoint::at(0.0, 0.0),
        ControlPoint::at(10.0, 0.0),
        ControlPoint::at(40.0, 0.0),
    ];
    pts[1].opacity = 0.0;
    path(pts)
}

fn whole(p: &PathModel) -> Segment {
    Segment {
        start: 0,
        end: p.point_idx_max(),
    }
}

#[test]
fn legacy_midpoint_is_the_arithmetic_mean() {
    let mut a = ControlPoint::at(10.0, 20.0);
    a.opacity = 40.0;
    a.rotation = -30.0;
    let mut b = ControlPoint::at(30.0, 60.0);
    b.opacity = 80.0;
    b.rotation = 90.0;
    b.width_pct = 200.0;
    let p = path(vec![a, b]);
    let r = ParameterResolver::new(&p).resolve_at(whole(&p), 1, 0.5, 0.5);
    assert_eq!(r.position, Point::new(20.0, 40.0));
    assert_eq!(r.opacity, 60.0);
    assert_eq!(r.rotation, 30.0);
    assert_eq!(r.width_pct, 150.0);
    assert_eq!(r.height_pct, 100.0);
    assert!(!r.movement.accelerated);
}

#[test]
fn resolving_twice_gives_identical_values() {
    let p = uneven();
    let table = SegmentScheduler::build_timing_table(&p, 12);
    let mut it = FrameTweenIterator::new(&table, 2, None);
    let resolver = ParameterResolver::new(&p);
    for tick in it.frame(7) {
        assert_eq!(resolver.resolve(&tick), resolver.resolve(&tick));
    }
}

#[test]
fn constant_speed_follows_path_length() {
    let mut p = uneven();
    p.point_mut(0).unwrap().accel = AccelGroup {
        position: Accel(1),
        ..AccelGroup::default()
    };
    let r = ParameterResolver::new(&p).resolve_at(whole(&p), 1, 1.0, 0.5);
    assert!((r.position.x - 20.0).abs() < 1e-9);
    assert_eq!(r.movement.line, 2);
    assert!((r.movement.factor - 1.0 / 3.0).abs() < 1e-12);
    assert!(r.movement.accelerated);
}

#[test]
fn ease_in_lags_behind_linear_progress() {
    let mut p = uneven();
    p.point_mut(0).unwrap().accel.position = Accel(11);
    let r = ParameterResolver::new(&p).resolve_at(whole(&p), 1, 1.0, 0.5);
    // 40 * 0.5^2 = 10: exactly the end of the first line.
    assert!((r.position.x - 10.0).abs() < 1e-9);
}

#[test]
fn unaccelerated_attributes_inherit_movement_timing() {
    let mut p = uneven();
    p.point_mut(0).unwrap().accel.position = Accel(1);
    let r = ParameterResolver::new(&p).resolve_at(whole(&p), 1, 1.0, 0.5);
    // Movement sits a third into line 2 (opacity 0 -> 100), not at the line-1 end point.
    assert!((r.opacity - 100.0 / 3.0).abs() < 1e-9);
}

#[test]
fn accelerated_attribute_blends_segment_end_values() {
    let mut p = uneven();
    p.point_mut(0).unwrap().accel.opacity = Accel(1);
    let r = ParameterResolver::new(&p).resolve_at(whole(&p), 1, 1.0, 0.5);
    assert_eq!(r.position, Point::new(10.0, 0.0));
    // the transparent middle point only shapes the movement line
    assert_eq!(r.opacity, 100.0);
}

#[test]
fn accelerated_attribute_follows_the_remapped_progress() {
    let mut p = uneven();
    p.point_mut(2).unwrap().rotation = 80.0;
    p.point_mut(1).unwrap().rotation = -500.0;
    p.point_mut(0).unwrap().accel.rotation = Accel(11);
    let r = ParameterResolver::new(&p).resolve_at(whole(&p), 1, 1.0, 0.5);
    // 0.5^2 of the way from 0 to 80
    assert!((r.rotation - 20.0).abs() < 1e-9);
}

#[test]
fn stationary_segment_still_blends_accelerated_attributes() {
    let mut pts = vec![ControlPoint::at(5.0, 5.0); 3];
    pts[1].rotation = 10.0;
    pts[2].rotation = 180.0;
    pts[0].accel.rotation = Accel(1);
    pts[0].accel.position = Accel(5);
    let p = path(pts);
    let r = ParameterResolver::new(&p).resolve_at(whole(&p), 1, 0.5, 0.75);
    assert_eq!(r.position, Point::new(5.0, 5.0));
    assert!(!r.movement.accelerated);
    assert!((r.rotation - 135.0).abs() < 1e-9);
}

#[test]
fn acceleration_comes_from_the_segment_start_point() {
    let mut p = path(vec![
        ControlPoint::at(0.0, 0.0),
        ControlPoint::at(10.0, 0.0).with_keyframe(4),
        ControlPoint::at(20.0, 0.0),
        ControlPoint::at(40.0, 0.0),
    ]);
    // Only point 1 starts the second segment; point 2's setting must be ignored.
    p.point_mut(2).unwrap().accel.position = Accel(1);
    let table = SegmentScheduler::build_timing_table(&p, 10);
    let seg = SegmentScheduler::segment_of_line(&table, 3);
    let resolver = ParameterResolver::new(&p);
    let r = resolver.resolve_at(seg, 3, 0.25, 0.5);
    assert!(!r.movement.accelerated);
    assert_eq!(r.position, Point::new(25.0, 0.0));

    p.point_mut(1).unwrap().accel.position = Accel(1);
    let resolver = ParameterResolver::new(&p);
    let r = resolver.resolve_at(seg, 3, 0.25, 0.5);
    assert!(r.movement.accelerated);
    assert!((r.position.x - 25.0).abs() < 1e-9);
    assert_eq!(r.movement.line, 3);
}
