pub(crate) mod library;
pub(crate) mod profile;
