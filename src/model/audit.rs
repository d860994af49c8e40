//! Site audit configuration

model_object! {
    /// Audit settings of a site collection
    pub struct AuditSettings as "AuditSettings" {
        /// Bitmask of [`AUDIT_FLAGS`]
        pub audit_flags: i64,
        pub audit_log_trimming_retention: i32,
        pub trim_audit_log: bool,
    }
}

/// Named audit flags and their bit values
pub const AUDIT_FLAGS: &[(&str, i64)] = &[
    ("None", 0),
    ("CheckOut", 1),
    ("CheckIn", 2),
    ("View", 4),
    ("Delete", 8),
    ("Update", 16),
    ("ProfileChange", 32),
    ("ChildDelete", 64),
    ("SchemaChange", 128),
    ("SecurityChange", 256),
    ("Undelete", 512),
    ("Workflow", 1024),
    ("Copy", 2048),
    ("Move", 4096),
    ("Search", 8192),
    ("All", -1),
];

/// Bit value of a named audit flag
pub fn audit_flag(name: &str) -> Option<i64> {
    AUDIT_FLAGS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| *v)
}
