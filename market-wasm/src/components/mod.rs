pub(crate) mod auth_panel;
pub(crate) mod chat_panel;
pub(crate) mod nav_bar;
pub(crate) mod notices_panel;
pub(crate) mod profile_panel;
