pub mod api;
pub mod kinds;
pub mod prefs;
