//! File name escaping for object and database names
//!
//! Bytes in `[A-Za-z0-9_]` are kept, every other byte of the UTF-8 encoding
//! becomes `%XX` with uppercase hex digits. The mapping is a bijection, so
//! metadata files sort in the same order as their escaped names.

/// Suffix of a metadata file
pub const METADATA_SUFFIX: &str = ".sql";

fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Escape a name for use as a file name
pub fn escape_for_file_name(name: &str) -> String {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";

    let mut escaped = String::with_capacity(name.len());
    for &byte in name.as_bytes() {
        if is_word_byte(byte) {
            escaped.push(byte as char);
        } else {
            escaped.push('%');
            escaped.push(HEX[(byte >> 4) as usize] as char);
            escaped.push(HEX[(byte & 0x0F) as usize] as char);
        }
    }
    escaped
}

/// Reverse [`escape_for_file_name`]. Returns `None` for text that no name
/// escapes to.
pub fn unescape_for_file_name(escaped: &str) -> Option<String> {
    let bytes = escaped.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = escaped.get(i + 1..i + 3)?;
                if !hex.bytes().all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b)) {
                    return None;
                }
                let byte = u8::from_str_radix(hex, 16).ok()?;
                if is_word_byte(byte) {
                    return None;
                }
                decoded.push(byte);
                i += 3;
            }
            byte if is_word_byte(byte) => {
                decoded.push(byte);
                i += 1;
            }
            _ => return None,
        }
    }

    String::from_utf8(decoded).ok()
}

/// `<escaped name>.sql`
pub fn metadata_file_name(name: &str) -> String {
    format!("{}{}", escape_for_file_name(name), METADATA_SUFFIX)
}
