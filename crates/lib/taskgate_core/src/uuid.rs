// Helpers for generating UUIDs.
//
// Users get random v4 ids (PostgreSQL's gen_random_uuid() in the database
// backend). Tasks are listed in creation order, so they get UUIDv7 ids,
// generated app-side since PostgreSQL cannot produce v7 natively.

use uuid::Uuid;

/// Generate a new random UUIDv4.
pub fn uuidv4() -> Uuid {
    Uuid::new_v4()
}

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}
