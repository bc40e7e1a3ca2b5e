pub mod compositor;
pub mod placement;
pub mod text;
