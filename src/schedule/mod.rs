pub mod stepper;
pub mod timing;
pub mod tween;
