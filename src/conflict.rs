//! Duplicate-email conflict handling shared by both facades.
//!
//! When a backend reports that an email is already taken, AddOrUpdateClients
//! retries with a numeric suffix appended to the local part: `user@x.com`
//! becomes `user+1@x.com`, then `user+2@x.com`, and so on. The retry loop is
//! bounded; exhaustion surfaces as [`ErrorKind::ConflictRetriesExhausted`].
//!
//! [`ErrorKind::ConflictRetriesExhausted`]: crate::ErrorKind::ConflictRetriesExhausted

/// Maximum total attempts per AddOrUpdateClients call (first try included).
pub const MAX_EMAIL_CONFLICT_ATTEMPTS: u32 = 5;

/// Next candidate address after a duplicate-email rejection. An existing
/// `+N` suffix is replaced with `+N+1`, so no suffix is ever reused.
pub fn next_conflict_email(email: &str) -> String {
    let (local, domain) = match email.split_once('@') {
        Some((l, d)) => (l, Some(d)),
        None => (email, None),
    };

    let (base, n) = match local.rsplit_once('+') {
        Some((base, suffix)) if !base.is_empty() => match suffix.parse::<u64>() {
            Ok(n) => (base, n),
            Err(_) => (local, 0),
        },
        _ => (local, 0),
    };

    match domain {
        Some(d) => format!("{base}+{}@{d}", n + 1),
        None => format!("{base}+{}", n + 1),
    }
}
