pub(crate) mod display_link;
pub(crate) mod source;
