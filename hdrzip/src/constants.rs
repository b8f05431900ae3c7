//! Constants shared by the header model, the line grammar and every codec.
//!
//! Codec-specific constants (dictionaries, escape markers) live in their
//! respective codec modules.

// --- Header model ---

/// Separator packing repeated occurrences of one header into a single value.
pub const MULTI_VALUE_SEPARATOR: char = '\0';
/// First character of every pseudo-header name.
pub const PSEUDO_HEADER_PREFIX: char = ':';

/// Request method pseudo-header.
pub const PSEUDO_METHOD: &str = ":method";
/// Request path (including the query string) pseudo-header.
pub const PSEUDO_PATH: &str = ":path";
/// Protocol version pseudo-header, present on requests and responses.
pub const PSEUDO_VERSION: &str = ":version";
/// Request scheme pseudo-header.
pub const PSEUDO_SCHEME: &str = ":scheme";
/// Request authority pseudo-header.
pub const PSEUDO_HOST: &str = ":host";
/// Response status code pseudo-header.
pub const PSEUDO_STATUS: &str = ":status";
/// Response reason phrase pseudo-header.
pub const PSEUDO_STATUS_TEXT: &str = ":status-text";

/// Pseudo-headers carried on a request's top line.
pub const REQUEST_TOP_LINE: [&str; 3] = [PSEUDO_METHOD, PSEUDO_PATH, PSEUDO_VERSION];
/// Pseudo-headers carried on a response's top line.
pub const RESPONSE_TOP_LINE: [&str; 3] = [PSEUDO_VERSION, PSEUDO_STATUS, PSEUDO_STATUS_TEXT];

/// Wire name used for `:host` in HTTP/1 style serializations.
pub const HOST_HEADER: &str = "host";

// --- Hop-by-hop handling ---

/// Header listing additional hop-by-hop headers; removed itself after use.
pub const CONNECTION_HEADER: &str = "connection";
/// Headers that are always hop-by-hop.
pub const HOP_BY_HOP_HEADERS: [&str; 4] = ["transfer-encoding", "te", "keep-alive", "trailers"];

// --- Normalization ---

/// Header whose value is compared as an unordered set of crumbs.
pub const COOKIE_HEADER: &str = "cookie";
/// Separator between cookie crumbs.
pub const COOKIE_SEPARATOR: char = ';';

// --- Line grammar ---

/// Line delimiter of literal HTTP/1 wire syntax.
pub const HTTP1_LINE_DELIMITER: &str = "\r\n";
/// Name/value separator of literal HTTP/1 wire syntax.
pub const HTTP1_VALUE_SEPARATOR: &str = ": ";
/// Prefix of the protocol version token on a response top line.
pub const HTTP_VERSION_PREFIX: &str = "HTTP/";

// --- Codec identifiers ---

/// Identity HTTP/1 codec; the default baseline.
pub const CODEC_HTTP1: &str = "http1";
/// HTTP/1 serialization followed by gzip.
pub const CODEC_HTTP1_GZIP: &str = "http1_gzip";
/// Stateful delta/reference codec.
pub const CODEC_DELTA: &str = "delta";
/// Baseline used for ratio computations unless configured otherwise.
pub const DEFAULT_BASELINE_CODEC: &str = CODEC_HTTP1;
