pub(crate) mod animation_session;
