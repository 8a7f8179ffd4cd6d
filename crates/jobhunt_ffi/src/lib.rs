//! Flutter-facing bridge over `jobhunt_core`.

pub mod api;
