pub mod applier;
pub mod backend;
pub mod compositor;
pub mod pipeline;
pub mod source_cache;

#[cfg(test)]
#[path = "../../tests/unit/render/support.rs"]
pub(crate) mod test_support;
