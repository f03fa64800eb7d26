//! Document store schema definitions

/// Builds the schema for one collection table
///
/// The caller must pass a name accepted by [`is_valid_collection_name`].
pub fn collection_schema(collection: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS "{c}" (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    link TEXT NOT NULL,
    title TEXT NOT NULL,
    document TEXT NOT NULL,
    inserted_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS "idx_{c}_link" ON "{c}"(link);
"#,
        c = collection
    )
}

/// Returns true if `name` is a plain identifier (`[A-Za-z_][A-Za-z0-9_]*`)
///
/// Collection names are interpolated into SQL.
pub fn is_valid_collection_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}
