/// Encoding that successfully decoded a log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
    Latin1,
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decodes raw log bytes, trying UTF-8, then UTF-16, then Latin-1.
///
/// The first decoder that accepts the input wins; Latin-1 accepts anything.
#[must_use]
pub fn decode_log_bytes(bytes: &[u8]) -> (String, TextEncoding) {
    let utf8 = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(utf8) {
        return (text.to_string(), TextEncoding::Utf8);
    }
    if let Some(decoded) = decode_utf16(bytes) {
        return decoded;
    }
    (bytes.iter().map(|b| char::from(*b)).collect(), TextEncoding::Latin1)
}

fn decode_utf16(bytes: &[u8]) -> Option<(String, TextEncoding)> {
    if bytes.len() % 2 != 0 {
        return None;
    }
    let (body, encoding) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, TextEncoding::Utf16Le),
        [0xFE, 0xFF, rest @ ..] => (rest, TextEncoding::Utf16Be),
        _ => (bytes, TextEncoding::Utf16Le),
    };
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| match encoding {
            TextEncoding::Utf16Be => u16::from_be_bytes([pair[0], pair[1]]),
            _ => u16::from_le_bytes([pair[0], pair[1]]),
        })
        .collect();
    String::from_utf16(&units).ok().map(|text| (text, encoding))
}
