pub(crate) mod frame;
pub(crate) mod loop_image;
pub(crate) mod loop_mode;
