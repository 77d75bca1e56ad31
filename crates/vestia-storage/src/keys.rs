//! Collision-resistant object key generation.

use chrono::Utc;
use uuid::Uuid;

/// Generate an owner-scoped object key: `{owner_id}/{timestamp}_{random}.{ext}`.
///
/// The timestamp plus random suffix makes keys globally unique without any
/// read-modify-write round trip against the store.
pub fn generate_object_key(owner_id: Uuid, extension: &str) -> String {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{owner_id}/{timestamp}_{}.{extension}", &suffix[..8])
}
