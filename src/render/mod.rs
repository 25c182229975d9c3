pub(crate) mod cache;
pub(crate) mod compositor;
pub(crate) mod events;
pub(crate) mod renderer;
pub(crate) mod worker;
