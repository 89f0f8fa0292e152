/// Stable 32-bit FNV-1a fingerprint of an endpoint's identifying fields,
/// formatted as lower hex. Change detection only; nothing cryptographic.
pub fn endpoint_fingerprint(
    path: &str,
    method: &str,
    operation_id: Option<&str>,
    summary: Option<&str>,
    description: Option<&str>,
) -> String {
    let mut hash: u32 = 0x811c9dc5;
    for part in [
        path,
        method,
        operation_id.unwrap_or(""),
        summary.unwrap_or(""),
        description.unwrap_or(""),
    ] {
        // NUL-terminate each field so adjacent fields cannot alias.
        for byte in part.bytes().chain(std::iter::once(0)) {
            hash ^= u32::from(byte);
            hash = hash.wrapping_mul(0x0100_0193);
        }
    }
    format!("{hash:08x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_across_calls() {
        let a = endpoint_fingerprint("/notes", "POST", Some("createNote"), None, None);
        let b = endpoint_fingerprint("/notes", "POST", Some("createNote"), None, None);
        assert_eq!(a, b);
        assert_eq!(a.len(), 8);
    }

    #[test]
    fn sensitive_to_every_field() {
        let base = endpoint_fingerprint("/notes", "POST", Some("op"), Some("s"), Some("d"));
        assert_ne!(
            base,
            endpoint_fingerprint("/notes", "GET", Some("op"), Some("s"), Some("d"))
        );
        assert_ne!(
            base,
            endpoint_fingerprint("/notes", "POST", Some("op"), Some("s"), Some("D"))
        );
    }

    #[test]
    fn field_boundaries_do_not_alias() {
        let a = endpoint_fingerprint("/ab", "c", None, None, None);
        let b = endpoint_fingerprint("/a", "bc", None, None, None);
        assert_ne!(a, b);
    }
}
