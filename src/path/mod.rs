pub mod model;
pub mod point;
