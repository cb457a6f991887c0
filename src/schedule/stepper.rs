/// How the source layer / source frame index advances while the object travels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepMode {
    /// Advance and wrap around to the first index.
    #[default]
    Loop,
    /// Step backwards and wrap around to the last index.
    LoopReverse,
    /// Advance once and stay on the last index.
    Once,
    /// Step backwards once and stay on the first index.
    OnceReverse,
    /// Bounce between both ends.
    PingPong,
    /// Keep the initial index.
    None,
}

impl StepMode {
    /// Every mode in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Loop,
        Self::LoopReverse,
        Self::Once,
        Self::OnceReverse,
        Self::PingPong,
        Self::None,
    ];

    /// Symbolic name used by parameter files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loop => "loop",
            Self::LoopReverse => "loop_reverse",
            Self::Once => "once",
            Self::OnceReverse => "once_reverse",
            Self::PingPong => "ping_pong",
            Self::None => "none",
        }
    }

    /// Inverse of [`Self::as_str`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.as_str() == name)
    }
}

/// Fractional source index walker.
///
/// The index lives in `first..=last`; the integer index handed out is the floor of an
/// accumulator that moves by `step_speed_factor / (tween_steps + 1)` per tick, so one full
/// frame (all tweens plus the real frame) advances by exactly `step_speed_factor`.
///
/// Ping-pong direction is stored here and persists for the lifetime of the stepper, i.e. one
/// pass; a new pass builds a new stepper.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceStepper {
    mode: StepMode,
    first: i64,
    last: i64,
    pos: f64,
    delta: f64,
    forward: bool,
}

impl SourceStepper {
    /// Stepper over `first..=last` (either order) starting at `initial`.
    pub fn new(
        mode: StepMode,
        first: i64,
        last: i64,
        initial: i64,
        step_speed_factor: f64,
        tween_steps: u32,
    ) -> Self {
        let (first, last) = if first <= last {
            (first, last)
        } else {
            (last, first)
        };
        Self {
            mode,
            first,
            last,
            pos: initial.clamp(first, last) as f64,
            delta: step_speed_factor.max(0.0) / (f64::from(tween_steps) + 1.0),
            forward: true,
        }
    }

    /// Step mode in use.
    pub fn mode(&self) -> StepMode {
        self.mode
    }

    /// Index to use for the current tick.
    pub fn current(&self) -> i64 {
        (self.pos.floor() as i64).clamp(self.first, self.last)
    }

    /// Fractional accumulator value.
    pub fn position(&self) -> f64 {
        self.pos
    }

    /// Move to the next tick.
    pub fn advance(&mut self) {
        let first = self.first as f64;
        let last = self.last as f64;
        let count = (self.last - self.first + 1) as f64;
        if self.first == self.last {
            self.pos = first;
            return;
        }
        match self.mode {
            StepMode::None => {}
            StepMode::Loop => {
                self.pos = first + (self.pos + self.delta - first).rem_euclid(count);
            }
            StepMode::LoopReverse => {
                self.pos = first + (self.pos - self.delta - first).rem_euclid(count);
            }
            StepMode::Once => self.pos = (self.pos + self.delta).min(last),
            StepMode::OnceReverse => self.pos = (self.pos - self.delta).max(first),
            StepMode::PingPong => {
                // Unfold into one forward/backward cycle of length `period`.
                let span = last - first;
                let period = 2.0 * span;
                let along = if self.forward {
                    self.pos - first
                } else {
                    period - (self.pos - first)
                };
                let along = (along + self.delta).rem_euclid(period);
                if along <= span {
                    self.pos = first + along;
                    self.forward = true;
                } else {
                    self.pos = first + (period - along);
                    self.forward = false;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/stepper.rs"]
mod tests;
