pub mod pointfile;
pub mod xml;
