pub(crate) mod fingerprint;
pub(crate) mod table;
pub(crate) mod visibility;
