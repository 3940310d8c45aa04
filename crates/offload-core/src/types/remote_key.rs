//! URL encoding of remote object keys.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Bytes escaped in a key: everything but unreserved characters and `/`.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'/')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Percent-encode a remote key for use in a URL path, keeping `/`.
pub fn encode_key(key: &str) -> String {
    utf8_percent_encode(key, KEY_ENCODE_SET).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_key() {
        assert_eq!(encode_key("2024/05/my photo#1.png"), "2024/05/my%20photo%231.png");
        assert_eq!(encode_key("plain-name_1.v2~x.jpg"), "plain-name_1.v2~x.jpg");
        assert_eq!(encode_key("café.png"), "caf%C3%A9.png");
    }
}
