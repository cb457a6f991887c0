use super::*;
use crate::{
    foundation::core::{Canvas, FrameSpan},
    path::point::ControlPoint,
    render::backend::LayerBounds,
    render::test_support::MockBackend,
    schedule::stepper::StepMode,
};

fn line_path(to_x: f64) -> PathModel {
    PathModel::from_points(vec![ControlPoint::at(0.0, 0.0), ControlPoint::at(to_x, 0.0)])
        .unwrap()
}

fn settings(start: i64, end: i64) -> MoveSettings {
    MoveSettings {
        dst_range: FrameSpan { start, end },
        ..MoveSettings::default()
    }
}

fn layers_source(b: &mut MockBackend, count: usize) -> SourceBinding {
    let image = b.add_image(Canvas::new(100, 100));
    SourceBinding::Layers {
        image,
        layer_count: count,
        initial: 0,
    }
}

/// X offsets of every real-frame object layer, in creation order.
fn object_xs(b: &MockBackend) -> Vec<i32> {
    b.layers
        .values()
        .filter(|l| l.props.is_some())
        .map(|l| l.bounds.x)
        .collect()
}

#[test]
fn missing_source_fails_validation_before_touching_host() {
    let path = line_path(20.0);
    let s = settings(1, 3);
    let mut b = MockBackend::default();

    let err = RenderPass::new(&path, &s, None)
        .run(&mut b, |_| ControlFlow::Continue(()))
        .unwrap_err();

    assert!(matches!(err, MovePathError::Validation(_)));
    assert!(err.to_string().contains("No source layer"));
    assert!(b.calls.is_empty());
}

#[test]
fn too_many_points_fail_validation() {
    let path = PathModel::from_points(vec![
        ControlPoint::at(0.0, 0.0),
        ControlPoint::at(1.0, 0.0),
        ControlPoint::at(2.0, 0.0),
    ])
    .unwrap();
    let s = settings(1, 2);
    let mut b = MockBackend::default();
    let source = layers_source(&mut b, 1);

    let err = RenderPass::new(&path, &s, Some(source))
        .run(&mut b, |_| ControlFlow::Continue(()))
        .unwrap_err();

    assert!(err.to_string().contains("exceed"));
    assert!(b.opened.is_empty());
}

#[test]
fn pass_moves_object_along_the_path() {
    let path = line_path(20.0);
    let s = settings(1, 3);
    let mut b = MockBackend::default();
    let source = layers_source(&mut b, 3);

    let report = RenderPass::new(&path, &s, Some(source))
        .run(&mut b, |_| ControlFlow::Continue(()))
        .unwrap();

    assert_eq!(
        report,
        RenderReport {
            frames_committed: 3,
            aborted: false,
        }
    );
    assert_eq!(b.saved, vec![1, 2, 3]);
    assert_eq!(object_xs(&b), vec![0, 10, 20]);
    let indices: Vec<usize> = b.source_requests.iter().map(|(_, i)| *i).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[test]
fn descending_range_runs_backwards() {
    let path = line_path(20.0);
    let s = settings(5, 3);
    let mut b = MockBackend::default();
    let source = layers_source(&mut b, 1);

    RenderPass::new(&path, &s, Some(source))
        .run(&mut b, |_| ControlFlow::Continue(()))
        .unwrap();

    assert_eq!(b.opened, vec![5, 4, 3]);
    assert_eq!(object_xs(&b), vec![0, 10, 20]);
}

#[test]
fn progress_reports_every_frame_and_can_abort() {
    let path = line_path(20.0);
    let s = settings(1, 4);
    let mut b = MockBackend::default();
    let source = layers_source(&mut b, 1);
    let mut seen = Vec::new();

    let report = RenderPass::new(&path, &s, Some(source))
        .run(&mut b, |p| {
            seen.push((p.frames_done, p.state.dst_frame, p.fraction()));
            if p.frames_done == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .unwrap();

    assert_eq!(
        report,
        RenderReport {
            frames_committed: 2,
            aborted: true,
        }
    );
    assert_eq!(seen, vec![(1, 1, 0.25), (2, 2, 0.5)]);
    assert_eq!(b.saved, vec![1, 2]);
}

#[test]
fn host_error_stops_pass_and_releases_open_images() {
    let path = line_path(20.0);
    let s = settings(1, 3);
    let mut b = MockBackend {
        fail_on_save: Some(2),
        ..MockBackend::default()
    };
    let source = SourceBinding::Frames {
        first: 1,
        last: 1,
        initial: 1,
        layer_index: 0,
    };

    let err = RenderPass::new(&path, &s, Some(source))
        .run(&mut b, |_| ControlFlow::Continue(()))
        .unwrap_err();

    assert!(matches!(err, MovePathError::Render(_)));
    assert_eq!(b.saved, vec![1]);
    assert_eq!(b.loaded_sources, vec![1]);
    assert_eq!(b.opened, vec![1, 2]);
    // the failed frame 2 is released as well as the committed frame 1
    assert_eq!(b.dest_images.len(), 2);
    for image in &b.dest_images {
        assert!(b.closed.contains(image), "{image:?} left open");
    }
    assert_eq!(b.calls.last(), Some(&"close_image"));
}

#[test]
fn source_error_mid_frame_still_closes_the_destination() {
    let path = line_path(20.0);
    let s = settings(1, 2);
    let mut b = MockBackend {
        fail_source_layer: true,
        ..MockBackend::default()
    };
    let source = layers_source(&mut b, 1);

    let err = RenderPass::new(&path, &s, Some(source))
        .run(&mut b, |_| ControlFlow::Continue(()))
        .unwrap_err();

    assert!(matches!(err, MovePathError::Render(_)));
    assert!(b.saved.is_empty());
    assert_eq!(b.dest_images.len(), 1);
    assert!(b.closed.contains(&b.dest_images[0]));
}

#[test]
fn tweens_share_the_source_cache_and_scratch_buffer() {
    let path = line_path(20.0);
    let s = MoveSettings {
        tween_steps: 1,
        ..settings(1, 3)
    };
    let mut b = MockBackend::default();
    let source = SourceBinding::Frames {
        first: 10,
        last: 19,
        initial: 10,
        layer_index: 0,
    };

    let report = RenderPass::new(&path, &s, Some(source))
        .run(&mut b, |_| ControlFlow::Continue(()))
        .unwrap();

    assert_eq!(report.frames_committed, 3);
    // half a source step per sample: 10, 10 | 11, 11 | 12, 12
    assert_eq!(b.loaded_sources, vec![10, 11, 12]);
    assert_eq!(b.count("new_scratch_image"), 1);
    // the first frame has no earlier position to tween from
    assert_eq!(b.count("merge_visible"), 2);
}

#[test]
fn ping_pong_state_persists_across_frames() {
    let path = PathModel::from_points(vec![
        ControlPoint::at(0.0, 0.0),
        ControlPoint::at(0.0, 10.0),
    ])
    .unwrap();
    let s = MoveSettings {
        src_stepmode: StepMode::PingPong,
        ..settings(1, 6)
    };
    let mut b = MockBackend::default();
    let source = layers_source(&mut b, 3);

    RenderPass::new(&path, &s, Some(source))
        .run(&mut b, |_| ControlFlow::Continue(()))
        .unwrap();

    let indices: Vec<usize> = b.source_requests.iter().map(|(_, i)| *i).collect();
    assert_eq!(indices, vec![0, 1, 2, 1, 0, 1]);
}

#[test]
fn single_frame_places_object_at_phase() {
    let path = line_path(100.0);
    let s = MoveSettings::default();
    let mut b = MockBackend::default();
    let target = b.add_image(Canvas::new(200, 200));
    let layer = b.add_layer(
        target,
        LayerBounds {
            x: 0,
            y: 0,
            width: 40,
            height: 20,
        },
    );

    let attrs = render_single_frame(
        &path,
        &s,
        &mut b,
        target,
        layer,
        SingleFrameRequest {
            frame_phase: 3,
            total_frames: 5,
            fit: FitOptions {
                fit_width: true,
                fit_height: false,
                keep_proportions: false,
            },
            sizes: FitSizes {
                recorded_frame: Canvas::new(100, 100),
                actual_frame: Canvas::new(200, 200),
                recorded_object: Canvas::new(40, 20),
                actual_object: Canvas::new(40, 20),
            },
        },
    )
    .unwrap();

    assert_eq!(attrs.position.x, 50.0);
    assert_eq!(attrs.width_pct, 200.0);
    let bounds = b.layer(layer).bounds;
    assert_eq!((bounds.x, bounds.width, bounds.height), (50, 80, 20));
}

#[test]
fn single_frame_rejects_empty_timeline() {
    let path = line_path(10.0);
    let mut b = MockBackend::default();
    let target = b.add_image(Canvas::new(10, 10));
    let layer = b.add_layer(target, LayerBounds::default());
    let req = SingleFrameRequest {
        frame_phase: 1,
        total_frames: 0,
        fit: FitOptions::default(),
        sizes: FitSizes::default(),
    };
    let res = render_single_frame(&path, &MoveSettings::default(), &mut b, target, layer, req);
    assert!(matches!(res, Err(MovePathError::Validation(_))));
}
