/// Turns a user ID as printed by gpg into readable text.
pub trait TextDecoder: Send + Sync {
    fn decode(&self, raw: &str) -> String;
}

/// Decodes the C-style `\xHH` escapes gpg applies to colon listings.
///
/// Colons, backslashes and control characters are escaped by gpg; the
/// remaining bytes are UTF-8.
#[derive(Debug, Clone, Copy, Default)]
pub struct GpgTextDecoder;

impl TextDecoder for GpgTextDecoder {
    fn decode(&self, raw: &str) -> String {
        if !raw.contains("\\x") {
            return raw.to_string();
        }

        let bytes = raw.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'\\'
                && bytes.get(i + 1) == Some(&b'x')
                && let Some(byte) = bytes.get(i + 2..i + 4).and_then(hex_byte)
            {
                out.push(byte);
                i += 4;
                continue;
            }
            out.push(bytes[i]);
            i += 1;
        }

        String::from_utf8_lossy(&out).into_owned()
    }
}

fn hex_byte(pair: &[u8]) -> Option<u8> {
    if !pair.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let s = std::str::from_utf8(pair).ok()?;
    u8::from_str_radix(s, 16).ok()
}
