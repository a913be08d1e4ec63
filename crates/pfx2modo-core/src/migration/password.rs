/// Normalise a password hash for storage.
///
/// Hashes already carrying a `{SCHEME}` prefix are stored untouched; bare
/// hashes get the configured scheme prepended, uppercased. No re-hashing
/// happens here, the destination is expected to verify against the same
/// scheme PostfixAdmin crypted with.
pub fn format_password(password: &str, scheme: &str) -> String {
    let re = regex_lite::Regex::new(r"^\{[\w-]+\}").unwrap();
    if re.is_match(password) {
        password.to_string()
    } else {
        format!("{{{}}}{}", scheme.to_uppercase(), password)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_hash_gets_scheme_prefix() {
        assert_eq!(
            format_password("$1$abcdef$ghijkl", "crypt"),
            "{CRYPT}$1$abcdef$ghijkl"
        );
    }

    #[test]
    fn test_scheme_is_uppercased() {
        assert_eq!(format_password("secret", "md5crypt"), "{MD5CRYPT}secret");
    }

    #[test]
    fn test_prefixed_hash_kept_as_is() {
        assert_eq!(format_password("{MD5}9e107d9d", "crypt"), "{MD5}9e107d9d");
        assert_eq!(
            format_password("{SSHA512-CRYPT}xyz", "crypt"),
            "{SSHA512-CRYPT}xyz"
        );
    }

    #[test]
    fn test_prefix_only_counts_at_the_start() {
        assert_eq!(
            format_password("abc{MD5}def", "crypt"),
            "{CRYPT}abc{MD5}def"
        );
    }

    #[test]
    fn test_empty_password() {
        assert_eq!(format_password("", "crypt"), "{CRYPT}");
    }
}
