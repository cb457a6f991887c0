use super::*;
use crate::{animation::accel::Accel, foundation::core::Point};

fn sample() -> MoveParameters {
    let settings = MoveSettings {
        dst_range: FrameSpan { start: 10, end: 1 },
        dst_layerstack: 2,
        recorded_frame_size: Some(Canvas::new(320, 240)),
        src_handle: SourceHandle::Center,
        src_stepmode: StepMode::PingPong,
        src_selmode: SelectionMode::FrameSpecific,
        src_paintmode: PaintMode::Multiply,
        clip_to_image: true,
        step_speed_factor: 0.5,
        tween_steps: 3,
        tween_opacity_desc: 60.0,
        tracelayer_enable: true,
        src_apply_bluebox: true,
        bluebox: Some(BlueBoxSettings {
            keycolor: [10, 20, 30],
            mode: BlueBoxMode::Hsv,
            grow: 2,
            ..BlueBoxSettings::default()
        }),
        ..MoveSettings::default()
    };
    let mut a = ControlPoint::at(0.0, 0.0);
    a.accel = AccelGroup {
        position: Accel(-5),
        ..AccelGroup::default()
    };
    let mut b = ControlPoint::at(160.5, 120.0).with_keyframe(4);
    b.keyframe_abs = 6;
    b.opacity = 50.0;
    b.perspective.tr_x = 0.5;
    let c = ControlPoint::at(320.0, 0.0);
    let mut path = PathModel::from_points(vec![a, b, c]).unwrap();
    path.set_current(1).unwrap();
    MoveParameters::new(settings, path)
}

#[test]
fn write_then_parse_restores_everything() {
    let params = sample();
    let xml = params.to_xml();
    let back = MoveParameters::from_xml(&xml).unwrap();
    assert_eq!(back, params);
}

#[test]
fn root_carries_version_and_symbolic_names() {
    let xml = sample().to_xml();
    assert!(xml.contains(r#"<movepath_parameters version="2">"#));
    assert!(xml.contains(r#"src_stepmode="ping_pong""#));
    assert!(xml.contains(r#"paintmode="multiply""#));
    assert!(xml.contains(r#"<bluebox keycolor_r="10""#));
    assert!(xml.contains(r#"mode="hsv""#));
}

#[test]
fn optional_groups_written_only_when_used() {
    let plain = MoveParameters::new(
        MoveSettings::default(),
        PathModel::from_points(vec![ControlPoint::at(1.0, 2.0), ControlPoint::at(3.0, 4.0)])
            .unwrap(),
    );
    let xml = plain.to_xml();
    assert!(xml.contains(r#"<controlpoint px="1" py="2"/>"#));
    assert!(!xml.contains("opacity=\"100\""));
    assert!(!xml.contains("<bluebox"));

    let rich = sample().to_xml();
    // every point carries the group once any point deviates
    assert_eq!(rich.matches("ttlx=").count(), 3);
    assert_eq!(rich.matches("acc_feather=").count(), 3);
    assert_eq!(rich.matches(" opacity=").count(), 3);
    assert!(!rich.contains("w_resize"));
    assert_eq!(rich.matches("keyframe=").count(), 1);
}

#[test]
fn missing_attributes_keep_defaults() {
    let xml = r#"<?xml version="1.0"?>
<movepath_parameters version="1">
  <tween steps="2"/>
  <controlpoints current_point="0" count="2">
    <controlpoint px="5" py="6"/>
    <controlpoint px="7" py="8" rotation="45"/>
  </controlpoints>
</movepath_parameters>"#;
    let params = MoveParameters::from_xml(xml).unwrap();
    assert_eq!(params.settings.tween_steps, 2);
    assert_eq!(params.settings.tween_opacity_initial, 80.0);
    assert_eq!(params.path.point(1).unwrap().rotation, 45.0);
    assert_eq!(params.path.point(0).unwrap().opacity, 100.0);
}

#[test]
fn failed_apply_leaves_target_untouched() {
    let mut params = sample();
    let before = params.clone();

    let broken = [
        "<movepath_parameters><controlpoints><controlpoint px=\"1\"/></controlpoints></movepath_parameters>",
        "<other/>",
        "<movepath_parameters version=\"9\"/>",
        "<movepath_parameters><moving_object src_stepmode=\"sideways\"/></movepath_parameters>",
        "<movepath_parameters><tween steps=\"x\"/></movepath_parameters>",
        "<movepath_parameters><trace></tween></movepath_parameters>",
        "<movepath_parameters><controlpoints count=\"3\"><controlpoint px=\"1\" py=\"1\"/></controlpoints></movepath_parameters>",
    ];
    for xml in broken {
        let err = params.apply_xml(xml).unwrap_err();
        assert!(matches!(err, MovePathError::Serde(_)), "{xml}: {err}");
        assert_eq!(params, before);
    }
}

#[test]
fn out_of_range_settings_are_rejected() {
    let xml = r#"<movepath_parameters><trace opacity_desc="140"/><controlpoints><controlpoint px="0" py="0"/></controlpoints></movepath_parameters>"#;
    assert!(matches!(
        MoveParameters::from_xml(xml),
        Err(MovePathError::Validation(_))
    ));
}

#[test]
fn successful_apply_replaces_contents() {
    let mut params = MoveParameters::default();
    params.apply_xml(&sample().to_xml()).unwrap();
    assert_eq!(params, sample());
}

#[test]
fn rescale_maps_positions_to_actual_frame() {
    let mut params = sample();
    params.rescale_to(Canvas::new(640, 240));
    assert_eq!(params.path.point(1).unwrap().position, Point::new(321.0, 120.0));
    assert_eq!(params.settings.recorded_frame_size, Some(Canvas::new(640, 240)));

    let mut same = sample();
    same.rescale_to(Canvas::new(320, 240));
    assert_eq!(same, sample());
}

#[test]
fn rescale_ignores_zero_recorded_size() {
    let mut params = sample();
    params.settings.recorded_frame_size = Some(Canvas::new(0, 240));
    params.rescale_to(Canvas::new(640, 480));
    assert_eq!(params.path.point(1).unwrap().position, Point::new(160.5, 240.0));
}

#[test]
fn load_and_save_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("move.xml");
    sample().save(&file).unwrap();

    let loaded = MoveParameters::load(&file, Some(Canvas::new(160, 120))).unwrap();
    assert_eq!(loaded.path.point(2).unwrap().position, Point::new(160.0, 0.0));
    assert_eq!(MoveParameters::load(&file, None).unwrap(), sample());
}
