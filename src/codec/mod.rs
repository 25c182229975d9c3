pub(crate) mod apng;
pub(crate) mod gif;
pub(crate) mod registry;
pub(crate) mod sniff;
pub(crate) mod traits;
pub(crate) mod webp;
