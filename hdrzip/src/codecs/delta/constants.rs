//! Constants specific to the delta codec.

/// Synthetic header listing names whose values repeat the previous message.
pub const DELTA_REF_HEADER: &str = "ref";
/// Separator between entries of the `ref` header.
pub const DELTA_REF_SEPARATOR: char = ',';
/// Prefix of a header name that has no dictionary token.
pub const DELTA_ESCAPE_MARKER: char = '!';

/// Headers whose values are HTTP dates, sent as hexadecimal epoch seconds.
pub const DELTA_DATE_HEADERS: [&str; 3] = ["last-modified", "date", "expires"];

/// Header names with a short wire token. Must stay a bijection.
pub const DELTA_HEADER_TOKENS: [(&str, &str); 24] = [
    ("x-content-type-options", "xct"),
    ("content-encoding", "ce"),
    ("access-control-allow-origin", "ac"),
    ("content-type", "ct"),
    ("accept-language", "al"),
    ("accept-encoding", "ae"),
    ("accept-ranges", "ar"),
    ("user-agent", "ua"),
    ("server", "s"),
    ("referer", "r"),
    ("accept", "a"),
    ("cookie", "c"),
    ("last-modified", "lm"),
    ("cache-control", "cc"),
    ("pragma", "p"),
    ("vary", "v"),
    ("date", "d"),
    ("expires", "x"),
    ("content-length", "cl"),
    ("etag", "e"),
    ("content-language", "la"),
    ("via", "vi"),
    ("set-cookie", "sc"),
    ("p3p", "p3"),
];
