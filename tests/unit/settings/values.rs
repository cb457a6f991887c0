use super::*;

#[test]
fn defaults_match_host_conventions() {
    let s = MoveSettings::default();
    assert_eq!(s.src_stepmode, StepMode::Loop);
    assert_eq!(s.src_handle, SourceHandle::LeftTop);
    assert_eq!(s.step_speed_factor, 1.0);
    assert_eq!(s.tween_steps, 0);
    assert!(!s.tracelayer_enable);
    assert_eq!(s.frame_count(), 1);
    assert!(s.validate().is_ok());
}

#[test]
fn json_fills_missing_fields_with_defaults() {
    let s = MoveSettings::from_json_str(
        r#"{ "dst_range": { "start": 3, "end": 12 }, "src_stepmode": "ping_pong", "tween_steps": 2 }"#,
    )
    .unwrap();
    assert_eq!(s.frame_count(), 10);
    assert_eq!(s.src_stepmode, StepMode::PingPong);
    assert_eq!(s.tween_steps, 2);
    assert_eq!(s.trace_opacity_desc, 80.0);

    let back = MoveSettings::from_json_str(&s.to_json_string().unwrap()).unwrap();
    assert_eq!(back, s);
}

#[test]
fn out_of_range_values_are_rejected() {
    let err = MoveSettings::from_json_str(r#"{ "tween_opacity_desc": 130.0 }"#).unwrap_err();
    assert!(err.to_string().contains("tween_opacity_desc"));

    let s = MoveSettings {
        step_speed_factor: -1.0,
        ..MoveSettings::default()
    };
    assert!(s.validate().is_err());

    let s = MoveSettings {
        src_apply_bluebox: true,
        ..MoveSettings::default()
    };
    assert!(s.validate().is_err());
}

#[test]
fn malformed_json_is_a_serde_error() {
    let err = MoveSettings::from_json_str("{ nope").unwrap_err();
    assert!(matches!(err, MovePathError::Serde(_)));
}

#[test]
fn symbolic_names_roundtrip() {
    for h in SourceHandle::ALL {
        assert_eq!(SourceHandle::from_name(h.as_str()), Some(*h));
    }
    for m in PaintMode::ALL {
        assert_eq!(PaintMode::from_name(m.as_str()), Some(*m));
    }
    for m in SelectionMode::ALL {
        assert_eq!(SelectionMode::from_name(m.as_str()), Some(*m));
    }
    for m in BlueBoxMode::ALL {
        assert_eq!(BlueBoxMode::from_name(m.as_str()), Some(*m));
    }
    assert_eq!(PaintMode::from_name("glow"), None);
}

#[test]
fn handle_offsets() {
    assert_eq!(SourceHandle::LeftTop.offset_in(40.0, 20.0), (0.0, 0.0));
    assert_eq!(SourceHandle::RightBottom.offset_in(40.0, 20.0), (40.0, 20.0));
    assert_eq!(SourceHandle::Center.offset_in(40.0, 20.0), (20.0, 10.0));
    assert_eq!(SourceHandle::LeftBottom.offset_in(40.0, 20.0), (0.0, 20.0));
    assert_eq!(SourceHandle::RightTop.offset_in(40.0, 20.0), (40.0, 0.0));
}
