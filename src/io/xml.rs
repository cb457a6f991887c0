use std::{fmt::Write as _, path::Path, str::FromStr};

use anyhow::Context;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};

use crate::{
    foundation::core::{Canvas, FrameSpan},
    foundation::error::{MovePathError, MovePathResult},
    path::model::PathModel,
    path::point::{AccelGroup, ControlPoint, Perspective},
    schedule::stepper::StepMode,
    settings::values::{
        BlueBoxMode, BlueBoxSettings, MoveSettings, PaintMode, SelectionMode, SourceHandle,
    },
};

/// Version written to the root element; older versions load too.
pub const XML_VERSION: u32 = 2;

const ROOT: &str = "movepath_parameters";
const PERSPECTIVE_KEYS: [&str; 8] = ["ttlx", "ttly", "ttrx", "ttry", "tblx", "tbly", "tbrx", "tbry"];
const ACCEL_KEYS: [&str; 6] = [
    "acc_position",
    "acc_opacity",
    "acc_size",
    "acc_rotation",
    "acc_perspective",
    "acc_feather",
];

/// Settings plus control points, the unit stored in an XML parameter file.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct MoveParameters {
    /// Non-point parameters.
    pub settings: MoveSettings,
    /// Control points.
    pub path: PathModel,
}

impl MoveParameters {
    /// Bundle settings and points.
    pub fn new(settings: MoveSettings, path: PathModel) -> Self {
        Self { settings, path }
    }

    /// Parse a parameter file into a fresh value.
    #[tracing::instrument(skip(xml), fields(bytes = xml.len()))]
    pub fn from_xml(xml: &str) -> MovePathResult<Self> {
        XmlParser::default().parse(xml)
    }

    /// Replace `self` with the parsed contents; on any error `self` is left untouched.
    pub fn apply_xml(&mut self, xml: &str) -> MovePathResult<()> {
        *self = Self::from_xml(xml)?;
        Ok(())
    }

    /// Rescale positions recorded for another frame size to `actual`.
    ///
    /// No-op per axis when the recorded size is unknown, zero or equal.
    pub fn rescale_to(&mut self, actual: Canvas) {
        let Some(recorded) = self.settings.recorded_frame_size else {
            self.settings.recorded_frame_size = Some(actual);
            return;
        };
        let factor = |actual: u32, recorded: u32| {
            if recorded == 0 || recorded == actual {
                1.0
            } else {
                f64::from(actual) / f64::from(recorded)
            }
        };
        let sx = factor(actual.width, recorded.width);
        let sy = factor(actual.height, recorded.height);
        if sx != 1.0 || sy != 1.0 {
            tracing::debug!(sx, sy, "rescaling recorded path");
            self.path.scale_positions(sx, sy);
        }
        self.settings.recorded_frame_size = Some(actual);
    }

    /// Serialize as a version-2 parameter file.
    pub fn to_xml(&self) -> String {
        write_xml(self)
    }

    /// Load a parameter file, rescaling to `actual` when the frame size is known.
    pub fn load(file: &Path, actual: Option<Canvas>) -> MovePathResult<Self> {
        let xml = std::fs::read_to_string(file)
            .with_context(|| format!("read parameter file {}", file.display()))?;
        let mut params = Self::from_xml(&xml)?;
        if let Some(actual) = actual {
            params.rescale_to(actual);
        }
        Ok(params)
    }

    /// Write the parameter file to `file`.
    pub fn save(&self, file: &Path) -> MovePathResult<()> {
        std::fs::write(file, self.to_xml())
            .with_context(|| format!("write parameter file {}", file.display()))?;
        Ok(())
    }
}

/// Attributes of one element, decoded to UTF-8.
struct Attrs {
    element: String,
    values: Vec<(String, String)>,
}

impl Attrs {
    fn from_start(e: &BytesStart<'_>) -> MovePathResult<Self> {
        let element = std::str::from_utf8(e.name().as_ref())
            .map_err(|err| MovePathError::serde(format!("element name: {err}")))?
            .to_string();
        let mut values = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| MovePathError::serde(format!("<{element}>: {err}")))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|err| MovePathError::serde(format!("<{element}>: {err}")))?;
            let value = std::str::from_utf8(&attr.value)
                .map_err(|err| MovePathError::serde(format!("<{element}> {key}: {err}")))?;
            values.push((key.to_string(), value.to_string()));
        }
        Ok(Self { element, values })
    }

    fn raw(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn bad(&self, key: &str, value: &str) -> MovePathError {
        MovePathError::serde(format!(
            "<{}> attribute {key}: invalid value `{value}`",
            self.element
        ))
    }

    fn num<T: FromStr>(&self, key: &str) -> MovePathResult<Option<T>> {
        self.raw(key)
            .map(|v| v.trim().parse().map_err(|_| self.bad(key, v)))
            .transpose()
    }

    fn required<T: FromStr>(&self, key: &str) -> MovePathResult<T> {
        self.num(key)?.ok_or_else(|| {
            MovePathError::serde(format!("<{}> is missing attribute {key}", self.element))
        })
    }

    fn flag(&self, key: &str) -> MovePathResult<Option<bool>> {
        self.raw(key)
            .map(|v| match v.trim() {
                "true" | "1" => Ok(true),
                "false" | "0" => Ok(false),
                _ => Err(self.bad(key, v)),
            })
            .transpose()
    }

    fn named<T>(&self, key: &str, from_name: fn(&str) -> Option<T>) -> MovePathResult<Option<T>> {
        self.raw(key)
            .map(|v| from_name(v.trim()).ok_or_else(|| self.bad(key, v)))
            .transpose()
    }
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

#[derive(Default)]
struct XmlParser {
    settings: MoveSettings,
    points: Vec<ControlPoint>,
    current: usize,
    count: Option<usize>,
    saw_root: bool,
}

impl XmlParser {
    fn parse(mut self, xml: &str) -> MovePathResult<MoveParameters> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    let attrs = Attrs::from_start(e)?;
                    self.element(&attrs)?;
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(MovePathError::serde(format!(
                        "XML parsing error at position {}: {e}",
                        reader.buffer_position()
                    )));
                }
                _ => {}
            }
            buf.clear();
        }
        self.finish()
    }

    fn element(&mut self, a: &Attrs) -> MovePathResult<()> {
        if !self.saw_root {
            if a.element != ROOT {
                return Err(MovePathError::serde(format!(
                    "expected <{ROOT}> root, found <{}>",
                    a.element
                )));
            }
            let version: u32 = a.num("version")?.unwrap_or(1);
            if version > XML_VERSION {
                return Err(MovePathError::serde(format!(
                    "parameter file version {version} is newer than supported {XML_VERSION}"
                )));
            }
            self.saw_root = true;
            return Ok(());
        }

        let s = &mut self.settings;
        match a.element.as_str() {
            "frame_description" => {
                let start = a.num("range_from")?.unwrap_or(s.dst_range.start);
                let end = a.num("range_to")?.unwrap_or(s.dst_range.end);
                s.dst_range = FrameSpan::new(start, end)?;
                set(&mut s.dst_layerstack, a.num("layerstack")?);
                if let (Some(w), Some(h)) = (a.num("recorded_width")?, a.num("recorded_height")?) {
                    s.recorded_frame_size = Some(Canvas::new(w, h));
                }
            }
            "tween" => {
                set(&mut s.tween_steps, a.num("steps")?);
                set(&mut s.tween_opacity_initial, a.num("opacity_initial")?);
                set(&mut s.tween_opacity_desc, a.num("opacity_desc")?);
            }
            "trace" => {
                set(&mut s.tracelayer_enable, a.flag("enable")?);
                set(&mut s.trace_opacity_initial, a.num("opacity_initial")?);
                set(&mut s.trace_opacity_desc, a.num("opacity_desc")?);
            }
            "moving_object" => {
                set(&mut s.src_handle, a.named("src_handle", SourceHandle::from_name)?);
                set(&mut s.src_stepmode, a.named("src_stepmode", StepMode::from_name)?);
                set(&mut s.src_selmode, a.named("src_selmode", SelectionMode::from_name)?);
                set(&mut s.src_paintmode, a.named("paintmode", PaintMode::from_name)?);
                set(&mut s.src_force_visible, a.flag("force_visibility")?);
                set(&mut s.clip_to_image, a.flag("clip_to_image")?);
                set(&mut s.step_speed_factor, a.num("step_speed_factor")?);
                set(&mut s.rotate_threshold, a.num("rotate_threshold")?);
                set(&mut s.src_apply_bluebox, a.flag("apply_bluebox")?);
            }
            "bluebox" => {
                let mut b = BlueBoxSettings::default();
                for (i, key) in ["keycolor_r", "keycolor_g", "keycolor_b"].iter().enumerate() {
                    set(&mut b.keycolor[i], a.num(key)?);
                }
                set(&mut b.mode, a.named("mode", BlueBoxMode::from_name)?);
                set(&mut b.threshold, a.num("threshold")?);
                set(&mut b.threshold_r, a.num("threshold_r")?);
                set(&mut b.threshold_g, a.num("threshold_g")?);
                set(&mut b.threshold_b, a.num("threshold_b")?);
                set(&mut b.grow, a.num("grow")?);
                set(&mut b.feather_edges, a.flag("feather_edges")?);
                set(&mut b.feather_radius, a.num("feather_radius")?);
                set(&mut b.source_alpha, a.num("source_alpha")?);
                set(&mut b.target_alpha, a.num("target_alpha")?);
                s.bluebox = Some(b);
            }
            "controlpoints" => {
                self.current = a.num("current_point")?.unwrap_or(0);
                self.count = a.num("count")?;
            }
            "controlpoint" => self.points.push(control_point(a)?),
            other => tracing::debug!(element = other, "ignoring unknown element"),
        }
        Ok(())
    }

    fn finish(self) -> MovePathResult<MoveParameters> {
        if !self.saw_root {
            return Err(MovePathError::serde(format!("missing <{ROOT}> root")));
        }
        if let Some(count) = self.count
            && count != self.points.len()
        {
            return Err(MovePathError::serde(format!(
                "controlpoints announces {count} points, found {}",
                self.points.len()
            )));
        }
        self.settings.validate()?;
        let mut path = PathModel::from_points(self.points)?;
        let last = path.point_idx_max();
        path.set_current(self.current.min(last))?;
        Ok(MoveParameters {
            settings: self.settings,
            path,
        })
    }
}

fn control_point(a: &Attrs) -> MovePathResult<ControlPoint> {
    let mut p = ControlPoint::at(a.required("px")?, a.required("py")?);
    set(&mut p.opacity, a.num("opacity")?);
    set(&mut p.width_pct, a.num("w_resize")?);
    set(&mut p.height_pct, a.num("h_resize")?);
    set(&mut p.rotation, a.num("rotation")?);
    set(&mut p.feather_radius, a.num("feather_radius")?);

    let mut persp = p.perspective.to_array();
    for (slot, key) in persp.iter_mut().zip(PERSPECTIVE_KEYS) {
        set(slot, a.num(key)?);
    }
    p.perspective = Perspective::from_array(persp);

    let mut accel = p.accel.to_array();
    for (slot, key) in accel.iter_mut().zip(ACCEL_KEYS) {
        set(slot, a.num(key)?);
    }
    p.accel = AccelGroup::from_array(accel);

    set(&mut p.keyframe, a.num("keyframe")?);
    set(&mut p.keyframe_abs, a.num("keyframe_abs")?);
    Ok(p)
}

/// Which optional control point groups any point of the set uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct PointGroups {
    opacity: bool,
    resize: bool,
    rotation: bool,
    feather: bool,
    perspective: bool,
    accel: bool,
}

impl PointGroups {
    fn of(points: &[ControlPoint]) -> Self {
        let d = ControlPoint::default();
        points.iter().fold(Self::default(), |g, p| Self {
            opacity: g.opacity || p.opacity != d.opacity,
            resize: g.resize || p.width_pct != d.width_pct || p.height_pct != d.height_pct,
            rotation: g.rotation || p.rotation != d.rotation,
            feather: g.feather || p.feather_radius != d.feather_radius,
            perspective: g.perspective || !p.perspective.is_identity(),
            accel: g.accel || !p.accel.is_legacy(),
        })
    }
}

fn write_xml(params: &MoveParameters) -> String {
    let s = &params.settings;
    let mut out = String::new();
    let _ = writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#);
    let _ = writeln!(out, r#"<{ROOT} version="{XML_VERSION}">"#);

    let _ = write!(
        out,
        r#"  <frame_description range_from="{}" range_to="{}" layerstack="{}""#,
        s.dst_range.start, s.dst_range.end, s.dst_layerstack
    );
    if let Some(size) = s.recorded_frame_size {
        let _ = write!(
            out,
            r#" recorded_width="{}" recorded_height="{}""#,
            size.width, size.height
        );
    }
    out.push_str("/>\n");

    let _ = writeln!(
        out,
        r#"  <tween steps="{}" opacity_initial="{}" opacity_desc="{}"/>"#,
        s.tween_steps, s.tween_opacity_initial, s.tween_opacity_desc
    );
    let _ = writeln!(
        out,
        r#"  <trace enable="{}" opacity_initial="{}" opacity_desc="{}"/>"#,
        s.tracelayer_enable, s.trace_opacity_initial, s.trace_opacity_desc
    );

    let _ = write!(
        out,
        r#"  <moving_object src_handle="{}" src_stepmode="{}" src_selmode="{}" paintmode="{}" force_visibility="{}" clip_to_image="{}" step_speed_factor="{}" rotate_threshold="{}" apply_bluebox="{}""#,
        s.src_handle.as_str(),
        s.src_stepmode.as_str(),
        s.src_selmode.as_str(),
        s.src_paintmode.as_str(),
        s.src_force_visible,
        s.clip_to_image,
        s.step_speed_factor,
        s.rotate_threshold,
        s.src_apply_bluebox
    );
    match &s.bluebox {
        None => out.push_str("/>\n"),
        Some(b) => {
            out.push_str(">\n");
            let _ = writeln!(
                out,
                r#"    <bluebox keycolor_r="{}" keycolor_g="{}" keycolor_b="{}" mode="{}" threshold="{}" threshold_r="{}" threshold_g="{}" threshold_b="{}" grow="{}" feather_edges="{}" feather_radius="{}" source_alpha="{}" target_alpha="{}"/>"#,
                b.keycolor[0],
                b.keycolor[1],
                b.keycolor[2],
                b.mode.as_str(),
                b.threshold,
                b.threshold_r,
                b.threshold_g,
                b.threshold_b,
                b.grow,
                b.feather_edges,
                b.feather_radius,
                b.source_alpha,
                b.target_alpha
            );
            out.push_str("  </moving_object>\n");
        }
    }

    let points = params.path.points();
    let groups = PointGroups::of(points);
    let _ = writeln!(
        out,
        r#"  <controlpoints current_point="{}" count="{}">"#,
        params.path.current(),
        points.len()
    );
    for p in points {
        let _ = write!(
            out,
            r#"    <controlpoint px="{}" py="{}""#,
            p.position.x, p.position.y
        );
        if groups.opacity {
            let _ = write!(out, r#" opacity="{}""#, p.opacity);
        }
        if groups.resize {
            let _ = write!(
                out,
                r#" w_resize="{}" h_resize="{}""#,
                p.width_pct, p.height_pct
            );
        }
        if groups.rotation {
            let _ = write!(out, r#" rotation="{}""#, p.rotation);
        }
        if groups.feather {
            let _ = write!(out, r#" feather_radius="{}""#, p.feather_radius);
        }
        if groups.perspective {
            for (key, v) in PERSPECTIVE_KEYS.iter().zip(p.perspective.to_array()) {
                let _ = write!(out, r#" {key}="{v}""#);
            }
        }
        if groups.accel {
            for (key, v) in ACCEL_KEYS.iter().zip(p.accel.to_array()) {
                let _ = write!(out, r#" {key}="{v}""#);
            }
        }
        if p.is_keyframe() {
            let _ = write!(
                out,
                r#" keyframe="{}" keyframe_abs="{}""#,
                p.keyframe, p.keyframe_abs
            );
        }
        out.push_str("/>\n");
    }
    out.push_str("  </controlpoints>\n");
    let _ = writeln!(out, "</{ROOT}>");
    out
}

#[cfg(test)]
#[path = "../../tests/unit/io/xml.rs"]
mod tests;
