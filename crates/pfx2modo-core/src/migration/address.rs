/// Split a mail address at its last `@`.
///
/// Either side comes back as `None` when empty, so `"@example.com"` has no
/// local part and `"postmaster"` has no domain part. Only the last `@`
/// separates: `"a@b@c"` splits into `"a@b"` and `"c"`.
pub fn split_address(address: &str) -> (Option<&str>, Option<&str>) {
    match address.rsplit_once('@') {
        Some((local, domain)) => (
            (!local.is_empty()).then_some(local),
            (!domain.is_empty()).then_some(domain),
        ),
        None => ((!address.is_empty()).then_some(address), None),
    }
}

/// Local part of an address, the whole string when it has no `@`.
pub fn local_part(address: &str) -> &str {
    match address.rsplit_once('@') {
        Some((local, _)) => local,
        None => address,
    }
}
