//! Cache-key derivations for the shared namespace
//!
//! Every subsystem touching the shared cache derives its keys here so
//! namespaces cannot collide. Keys are deterministic functions of entity
//! kind and id; the same id always maps to the same key.

/// Key for a timbre's cached detail projection.
pub fn timbre_details(id: &str) -> String {
    format!("timbre:details:{id}")
}

/// Key for a voice display name by id.
///
/// Shared by timbre records and voice clones: both kinds of id resolve
/// their display name through this one namespace.
pub fn timbre_name(id: &str) -> String {
    format!("timbre:name:{id}")
}
