use crate::{
    foundation::core::{Canvas, FrameSpan},
    foundation::error::{MovePathError, MovePathResult},
    schedule::stepper::StepMode,
};

macro_rules! name_table {
    ($ty:ident { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            /// Every variant in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Symbolic name used by parameter files.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }

            /// Inverse of [`Self::as_str`].
            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

/// Anchor of the moving object that is placed onto the path position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceHandle {
    /// Top-left corner.
    #[default]
    LeftTop,
    /// Bottom-left corner.
    LeftBottom,
    /// Top-right corner.
    RightTop,
    /// Bottom-right corner.
    RightBottom,
    /// Centre of the object.
    Center,
}

name_table!(SourceHandle {
    LeftTop => "left_top",
    LeftBottom => "left_bottom",
    RightTop => "right_top",
    RightBottom => "right_bottom",
    Center => "center",
});

impl SourceHandle {
    /// Handle offset inside a `width` x `height` box.
    pub fn offset_in(self, width: f64, height: f64) -> (f64, f64) {
        match self {
            Self::LeftTop => (0.0, 0.0),
            Self::LeftBottom => (0.0, height),
            Self::RightTop => (width, 0.0),
            Self::RightBottom => (width, height),
            Self::Center => (width / 2.0, height / 2.0),
        }
    }
}

/// Which selection (if any) masks the moving object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// No selection masking.
    #[default]
    Ignore,
    /// Selection of the initial source image, reused for every frame.
    Initial,
    /// Selection of each fetched source frame.
    FrameSpecific,
}

name_table!(SelectionMode {
    Ignore => "ignore",
    Initial => "initial",
    FrameSpecific => "frame_specific",
});

/// Layer blend mode of inserted object layers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaintMode {
    /// Plain alpha compositing.
    #[default]
    Normal,
    /// Dither by opacity.
    Dissolve,
    /// Multiply.
    Multiply,
    /// Screen.
    Screen,
    /// Overlay.
    Overlay,
    /// Difference.
    Difference,
    /// Addition.
    Addition,
    /// Subtract.
    Subtract,
    /// Darken only.
    DarkenOnly,
    /// Lighten only.
    LightenOnly,
}

name_table!(PaintMode {
    Normal => "normal",
    Dissolve => "dissolve",
    Multiply => "multiply",
    Screen => "screen",
    Overlay => "overlay",
    Difference => "difference",
    Addition => "addition",
    Subtract => "subtract",
    DarkenOnly => "darken_only",
    LightenOnly => "lighten_only",
});

/// Colour model used by the keying threshold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlueBoxMode {
    /// Per-channel red, green and blue thresholds.
    #[default]
    Rgb,
    /// Hue, saturation and value distance.
    Hsv,
    /// Value (brightness) distance only.
    Vals,
    /// Single threshold over every channel.
    All,
}

name_table!(BlueBoxMode {
    Rgb => "rgb",
    Hsv => "hsv",
    Vals => "vals",
    All => "all",
});

/// Colour keying ("blue box") parameters handed to the raster host.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BlueBoxSettings {
    /// Colour made transparent.
    pub keycolor: [u8; 3],
    /// Colour model the thresholds apply to.
    pub mode: BlueBoxMode,
    /// Threshold for [`BlueBoxMode::All`] and the HSV / value modes (0..=1).
    pub threshold: f64,
    /// Red threshold in RGB mode (0..=1).
    pub threshold_r: f64,
    /// Green threshold in RGB mode (0..=1).
    pub threshold_g: f64,
    /// Blue threshold in RGB mode (0..=1).
    pub threshold_b: f64,
    /// Pixels the keyed-out area grows (negative shrinks).
    pub grow: i32,
    /// Soften the mask edge.
    pub feather_edges: bool,
    /// Edge feather radius in pixels.
    pub feather_radius: f64,
    /// Opacity of kept pixels (percent).
    pub source_alpha: f64,
    /// Opacity of keyed-out pixels (percent).
    pub target_alpha: f64,
}

impl Default for BlueBoxSettings {
    fn default() -> Self {
        Self {
            keycolor: [0, 0, 255],
            mode: BlueBoxMode::All,
            threshold: 0.25,
            threshold_r: 0.25,
            threshold_g: 0.25,
            threshold_b: 0.25,
            grow: 0,
            feather_edges: false,
            feather_radius: 2.0,
            source_alpha: 100.0,
            target_alpha: 0.0,
        }
    }
}

/// All non-point parameters of a move-path run.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MoveSettings {
    /// Destination frame range, processed from `start` towards `end`.
    pub dst_range: FrameSpan,
    /// Stack position at which the object layer is inserted (0 = top).
    pub dst_layerstack: usize,
    /// Frame size the path was recorded for; `None` when unknown.
    pub recorded_frame_size: Option<Canvas>,

    /// Object anchor placed onto the path position.
    pub src_handle: SourceHandle,
    /// How the source index advances per destination frame.
    pub src_stepmode: StepMode,
    /// Selection masking of the object.
    pub src_selmode: SelectionMode,
    /// Blend mode of inserted object layers.
    pub src_paintmode: PaintMode,
    /// Insert object layers visible even when the source layer is hidden.
    pub src_force_visible: bool,
    /// Clip object layers to the destination image.
    pub clip_to_image: bool,
    /// Source index advance per destination frame.
    pub step_speed_factor: f64,
    /// Rotations with `|angle| <= rotate_threshold` are skipped.
    pub rotate_threshold: f64,

    /// Run colour keying on the object.
    pub src_apply_bluebox: bool,
    /// Keying parameters; defaults apply when `None`.
    pub bluebox: Option<BlueBoxSettings>,

    /// Sub-steps rendered between consecutive destination frames.
    pub tween_steps: u32,
    /// Opacity of the tween nearest the real frame (percent).
    pub tween_opacity_initial: f64,
    /// Opacity decay per older tween (percent of the previous).
    pub tween_opacity_desc: f64,

    /// Keep a trace layer accumulating every placed object.
    pub tracelayer_enable: bool,
    /// Trace opacity on the first frame (percent).
    pub trace_opacity_initial: f64,
    /// Opacity the trace keeps per frame (percent).
    pub trace_opacity_desc: f64,
}

impl Default for MoveSettings {
    fn default() -> Self {
        Self {
            dst_range: FrameSpan { start: 1, end: 1 },
            dst_layerstack: 0,
            recorded_frame_size: None,
            src_handle: SourceHandle::LeftTop,
            src_stepmode: StepMode::Loop,
            src_selmode: SelectionMode::Ignore,
            src_paintmode: PaintMode::Normal,
            src_force_visible: true,
            clip_to_image: false,
            step_speed_factor: 1.0,
            rotate_threshold: 0.0,
            src_apply_bluebox: false,
            bluebox: None,
            tween_steps: 0,
            tween_opacity_initial: 80.0,
            tween_opacity_desc: 80.0,
            tracelayer_enable: false,
            trace_opacity_initial: 80.0,
            trace_opacity_desc: 80.0,
        }
    }
}

impl MoveSettings {
    /// Number of destination frames.
    pub fn frame_count(&self) -> u32 {
        self.dst_range.len_frames()
    }

    /// Parse and validate settings from JSON.
    pub fn from_json_str(s: &str) -> MovePathResult<Self> {
        let settings: Self =
            serde_json::from_str(s).map_err(|e| MovePathError::serde(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Pretty-printed JSON form.
    pub fn to_json_string(&self) -> MovePathResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| MovePathError::serde(e.to_string()))
    }

    /// Range checks on numeric fields.
    pub fn validate(&self) -> MovePathResult<()> {
        if self.dst_range.start < 0 || self.dst_range.end < 0 {
            return Err(MovePathError::validation(
                "destination range must use non-negative frame numbers",
            ));
        }
        for (name, v) in [
            ("tween_opacity_initial", self.tween_opacity_initial),
            ("tween_opacity_desc", self.tween_opacity_desc),
            ("trace_opacity_initial", self.trace_opacity_initial),
            ("trace_opacity_desc", self.trace_opacity_desc),
        ] {
            if !(0.0..=100.0).contains(&v) {
                return Err(MovePathError::validation(format!(
                    "{name} must be within [0, 100], got {v}"
                )));
            }
        }
        if self.step_speed_factor.is_nan() || self.step_speed_factor < 0.0 {
            return Err(MovePathError::validation(
                "step_speed_factor must be non-negative",
            ));
        }
        if self.rotate_threshold.is_nan() || self.rotate_threshold < 0.0 {
            return Err(MovePathError::validation(
                "rotate_threshold must be non-negative",
            ));
        }
        if self.src_apply_bluebox && self.bluebox.is_none() {
            return Err(MovePathError::validation(
                "src_apply_bluebox requires bluebox settings",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/settings/values.rs"]
mod tests;
