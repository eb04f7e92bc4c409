use uuid::Uuid;

/// Generates an identifier for a new article or tag.
///
/// Canonical lowercase v4 UUID. The space is large enough that no uniqueness
/// check against the store is performed.
pub fn new_entity_id() -> String {
    Uuid::new_v4().to_string()
}
