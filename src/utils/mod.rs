pub mod url_validator;

/// Shortcodes are 3-20 chars, alphanumeric plus `-` and `_`
pub const MIN_CODE_LENGTH: usize = 3;
pub const MAX_CODE_LENGTH: usize = 20;

/// Generation alphabet, without easily confused characters (0/O, 1/l/I)
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnpqrstuvwxyz23456789";

pub fn generate_random_code(length: usize) -> String {
    use std::iter;

    iter::repeat_with(|| CODE_ALPHABET[rand::random_range(0..CODE_ALPHABET.len())] as char)
        .take(length)
        .collect()
}

pub fn is_valid_short_code(code: &str) -> bool {
    if code.len() < MIN_CODE_LENGTH || code.len() > MAX_CODE_LENGTH {
        return false;
    }
    code.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Maximum stored length of a click source descriptor
pub const MAX_SOURCE_LENGTH: usize = 500;

/// Build the click source descriptor recorded with each redirect:
/// `{user_agent} | IP: {ip} | Ref: {referer}`, truncated to 500 chars.
pub fn compose_click_source(user_agent: &str, ip: &str, referer: &str) -> String {
    let composed = format!("{} | IP: {} | Ref: {}", user_agent, ip, referer);
    truncate_chars(&composed, MAX_SOURCE_LENGTH)
}

/// Truncate on a char boundary so multi-byte user agents do not panic
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}
