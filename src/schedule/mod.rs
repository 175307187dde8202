pub(crate) mod dates;
pub(crate) mod index;
pub(crate) mod model;
