use uuid::Uuid;

/// Time-ordered id for new rows, so creation-order ties break by id.
pub fn new_uuid_v7() -> String {
    Uuid::now_v7().to_string()
}

/// Random token for session handles; no ordering wanted here.
pub fn new_uuid_v4() -> String {
    Uuid::new_v4().to_string()
}
