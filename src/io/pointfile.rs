use std::{fmt::Write as _, path::Path};

use anyhow::Context;

use crate::{
    foundation::core::Point,
    foundation::error::{MovePathError, MovePathResult},
    path::model::{MAX_POINTS, PathModel},
    path::point::{AccelGroup, ControlPoint, Perspective},
};

/// Indicator bit: eight perspective factors follow.
pub const HAS_PERSPECTIVE: u32 = 8;
/// Indicator bit: six acceleration characteristics follow.
pub const HAS_ACCEL: u32 = 6;
/// Indicator bit: a relative keyframe follows.
pub const HAS_KEYFRAME: u32 = 1;

const BASE_FIELDS: usize = 8;
const LEGAL_INDICATORS: [u32; 8] = [0, 1, 6, 7, 8, 9, 14, 15];

/// Optional groups a point line carries, as an additive indicator value.
pub fn indicator_of(point: &ControlPoint) -> u32 {
    let mut indicator = 0;
    if !point.perspective.is_identity() {
        indicator += HAS_PERSPECTIVE;
    }
    if !point.accel.is_legacy() {
        indicator += HAS_ACCEL;
    }
    if point.is_keyframe() {
        indicator += HAS_KEYFRAME;
    }
    indicator
}

/// Parse point-file text.
///
/// Any malformed line, a point count above [`MAX_POINTS`] or a count that disagrees with the
/// point lines yields a load error that requires the caller to reset its table.
#[tracing::instrument(skip(text), fields(bytes = text.len()))]
pub fn parse_points(text: &str) -> MovePathResult<PathModel> {
    let mut lines = text
        .lines()
        .enumerate()
        .map(|(n, l)| (n + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'));

    let Some((header_no, header)) = lines.next() else {
        return Err(MovePathError::load_reset("point file is empty"));
    };
    let header: Vec<&str> = header.split_whitespace().collect();
    if header.len() != 2 {
        return Err(MovePathError::load_reset(format!(
            "line {header_no}: header needs `<current_point> <point_count>`"
        )));
    }
    let current: usize = parse_field(header[0], header_no)?;
    let count: usize = parse_field(header[1], header_no)?;
    if count > MAX_POINTS {
        return Err(MovePathError::load_reset(format!(
            "line {header_no}: {count} points exceed the maximum of {MAX_POINTS}"
        )));
    }

    let mut points = Vec::with_capacity(count);
    for (line_no, line) in lines {
        if points.len() == count {
            return Err(MovePathError::load_reset(format!(
                "line {line_no}: more point lines than the {count} announced"
            )));
        }
        points.push(parse_point(line, line_no)?);
    }
    if points.len() != count {
        return Err(MovePathError::load_reset(format!(
            "expected {count} points, found {}",
            points.len()
        )));
    }

    let mut path = PathModel::from_points(points).map_err(|e| match e {
        MovePathError::Validation(msg) => MovePathError::load_reset(msg),
        other => other,
    })?;
    let last = path.point_idx_max();
    path.set_current(current.min(last))?;
    tracing::debug!(points = path.len(), "point file parsed");
    Ok(path)
}

fn parse_field<T: std::str::FromStr>(s: &str, line_no: usize) -> MovePathResult<T> {
    s.parse()
        .map_err(|_| MovePathError::load_reset(format!("line {line_no}: invalid number `{s}`")))
}

fn parse_point(line: &str, line_no: usize) -> MovePathResult<ControlPoint> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let legacy = matches!(fields.len(), 6 | 7);
    if !legacy && fields.len() < BASE_FIELDS {
        return Err(MovePathError::load_reset(format!(
            "line {line_no}: {} fields is not a valid point line",
            fields.len()
        )));
    }
    let f = |i: usize| parse_field::<f64>(fields[i], line_no);

    let mut point = ControlPoint {
        position: Point::new(f(0)?, f(1)?),
        width_pct: f(2)?,
        height_pct: f(3)?,
        opacity: f(4)?,
        rotation: f(5)?,
        ..ControlPoint::default()
    };
    if legacy {
        if fields.len() == 7 {
            point.keyframe = parse_field(fields[6], line_no)?;
        }
        return Ok(point);
    }

    point.feather_radius = f(6)?;
    let indicator: u32 = parse_field(fields[7], line_no)?;
    if !LEGAL_INDICATORS.contains(&indicator) || fields.len() != BASE_FIELDS + indicator as usize {
        return Err(MovePathError::load_reset(format!(
            "line {line_no}: indicator {indicator} does not match {} fields",
            fields.len()
        )));
    }

    let mut at = BASE_FIELDS;
    if indicator & HAS_PERSPECTIVE != 0 {
        let mut v = [0.0; 8];
        for slot in &mut v {
            *slot = f(at)?;
            at += 1;
        }
        point.perspective = Perspective::from_array(v);
    }
    if indicator & HAS_ACCEL != 0 {
        let mut v = [0i32; 6];
        for slot in &mut v {
            *slot = parse_field(fields[at], line_no)?;
            at += 1;
        }
        point.accel = AccelGroup::from_array(v);
    }
    if indicator & HAS_KEYFRAME != 0 {
        point.keyframe = parse_field(fields[at], line_no)?;
    }
    Ok(point)
}

/// Render a path in the indicator format.
pub fn format_points(path: &PathModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# movepath point file");
    let _ = writeln!(
        out,
        "# x y width% height% opacity rotation feather indicator [perspective x8] [accel x6] [keyframe]"
    );
    let _ = writeln!(out, "{} {}", path.current(), path.len());
    for p in path.points() {
        let indicator = indicator_of(p);
        let _ = write!(
            out,
            "{} {} {} {} {} {} {} {}",
            p.position.x,
            p.position.y,
            p.width_pct,
            p.height_pct,
            p.opacity,
            p.rotation,
            p.feather_radius,
            indicator
        );
        if indicator & HAS_PERSPECTIVE != 0 {
            for v in p.perspective.to_array() {
                let _ = write!(out, " {v}");
            }
        }
        if indicator & HAS_ACCEL != 0 {
            for c in p.accel.to_array() {
                let _ = write!(out, " {c}");
            }
        }
        if indicator & HAS_KEYFRAME != 0 {
            let _ = write!(out, " {}", p.keyframe);
        }
        out.push('\n');
    }
    out
}

/// Read and parse a point file.
pub fn load_points(file: &Path) -> MovePathResult<PathModel> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("read point file {}", file.display()))?;
    parse_points(&text)
}

/// Write `path` as a point file.
pub fn save_points(path: &PathModel, file: &Path) -> MovePathResult<()> {
    std::fs::write(file, format_points(path))
        .with_context(|| format!("write point file {}", file.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/io/pointfile.rs"]
mod tests;
