//! Simulated persistent connections and host-to-connection routing.
//!
//! Every [`Connection`] owns one codec context per (codec, direction), so a
//! codec only ever sees the ordered subsequence of messages routed to that
//! connection. Connections are declared up front from multiplex patterns or
//! created lazily for the first host no existing connection accepts. They are
//! never merged or dropped during a run.
//!
//! A declaration is a `/`-separated list of alternatives. Each alternative
//! compiles into [`HostPattern`]s:
//!
//! | alternative            | pattern                       | domain suffix      |
//! |------------------------|-------------------------------|--------------------|
//! | `*.example.com`        | `Wildcard` (shell glob)       | `example.com`      |
//! | `img[0-9]\.cdn\.net`   | `Regex` anchored at the start | `cdn.net`          |
//! | `example.org`          | `Wildcard` of `*example.org`  | `example.org`      |
//!
//! The last row applies with domain multiplexing enabled; without it a plain
//! alternative is matched literally and no domain suffixes are derived.
//! A domain suffix is the trailing two labels of a name; there is no public
//! suffix list, so `co.uk` counts as a domain like any other.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::traits::{CodecContext, CodecHandler};
use crate::types::{Direction, PerDirection};

/// Handlers keyed by codec name, as owned by the engine.
pub type CodecHandlers = BTreeMap<String, Box<dyn CodecHandler>>;

/// Separator between alternatives of a multiplex declaration.
pub const ALTERNATIVE_SEPARATOR: char = '/';

static DOMAIN_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:.*\.)?([^.]+\.[^.]+)\.?").expect("valid regex"));

/// One compiled host matching rule.
#[derive(Debug, Clone)]
pub enum HostPattern {
    /// Shell glob translated into an anchored regular expression.
    Wildcard { glob: String, regex: Regex },
    /// User-supplied regular expression, anchored at the start only.
    Regex(Regex),
    /// Exact host name.
    Literal(String),
    /// Hosts whose trailing two labels equal this suffix.
    DomainSuffix(String),
}

impl HostPattern {
    /// Compiles a shell glob (`*`, `?`, `[...]`, `[!...]`).
    ///
    /// # Errors
    /// - [`ConfigError::InvalidHostPattern`] - The translated expression is invalid
    pub fn wildcard(glob: &str) -> Result<Self, ConfigError> {
        let regex = compile(glob, &glob_to_regex(glob))?;
        Ok(HostPattern::Wildcard {
            glob: glob.to_string(),
            regex,
        })
    }

    /// Compiles a regular expression matched from the start of the host.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidHostPattern`] - `pattern` is not a valid expression
    pub fn regex(pattern: &str) -> Result<Self, ConfigError> {
        compile(pattern, &format!("^(?:{pattern})")).map(HostPattern::Regex)
    }

    /// True if `host` satisfies this pattern.
    pub fn matches(&self, host: &str) -> bool {
        match self {
            HostPattern::Wildcard { regex, .. } | HostPattern::Regex(regex) => {
                regex.is_match(host)
            }
            HostPattern::Literal(name) => name == host,
            HostPattern::DomainSuffix(suffix) => {
                domain_suffix(host).is_some_and(|trailing| trailing == *suffix)
            }
        }
    }
}

fn compile(pattern: &str, expression: &str) -> Result<Regex, ConfigError> {
    Regex::new(expression).map_err(|e| ConfigError::InvalidHostPattern {
        pattern: pattern.to_string(),
        description: e.to_string(),
    })
}

/// Translates a shell glob into an expression matching the whole input.
///
/// An unterminated `[` is taken literally.
pub fn glob_to_regex(glob: &str) -> String {
    let chars: Vec<char> = glob.chars().collect();
    let mut out = String::from("^(?s:");
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => match class_end(&chars, i) {
                Some(end) => {
                    out.push('[');
                    let mut j = i + 1;
                    if chars[j] == '!' {
                        out.push('^');
                        j += 1;
                    }
                    for &c in &chars[j..end] {
                        if c == '-' {
                            out.push('-');
                        } else {
                            out.push_str(&regex::escape(&c.to_string()));
                        }
                    }
                    out.push(']');
                    i = end;
                }
                None => out.push_str(r"\["),
            },
            c => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }
    out.push_str(")$");
    out
}

/// Index of the `]` closing the class opened at `open`. A `]` directly after
/// `[` or `[!` is part of the class.
fn class_end(chars: &[char], open: usize) -> Option<usize> {
    let mut j = open + 1;
    if chars.get(j) == Some(&'!') {
        j += 1;
    }
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    (j..chars.len()).find(|&k| chars[k] == ']')
}

/// Trailing two labels of `name`, ignoring a final dot.
///
/// Returns `None` when `name` has fewer than two labels.
pub fn domain_suffix(name: &str) -> Option<String> {
    DOMAIN_SUFFIX
        .captures(name)
        .and_then(|captures| captures.get(1))
        .map(|suffix| suffix.as_str().to_string())
}

/// A simulated persistent connection.
#[derive(Debug)]
pub struct Connection {
    name: String,
    patterns: Vec<HostPattern>,
    domain_suffixes: Vec<String>,
    contexts: BTreeMap<String, PerDirection<Box<dyn CodecContext>>>,
    messages: PerDirection<u64>,
}

impl Connection {
    /// Creates a connection named after a declaration or a host.
    ///
    /// # Parameters
    /// - `name`: Multiplex declaration (`/`-separated alternatives) or plain host.
    /// - `handlers`: Codecs to create fresh contexts for, one per direction.
    /// - `domain_multiplex`: Whether plain alternatives also cover their domain.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidHostPattern`] - An alternative does not compile
    pub fn new(
        name: &str,
        handlers: &CodecHandlers,
        domain_multiplex: bool,
    ) -> Result<Self, ConfigError> {
        let mut patterns = Vec::new();
        let mut domain_suffixes = Vec::new();
        for alternative in name.split(ALTERNATIVE_SEPARATOR) {
            let suffix = if let Some(rest) = alternative.strip_prefix('*') {
                patterns.push(HostPattern::wildcard(alternative)?);
                domain_suffix(rest)
            } else if alternative.contains(r"\.") {
                patterns.push(HostPattern::regex(alternative)?);
                domain_suffix(&alternative.replace(r"\.", "."))
            } else if domain_multiplex {
                patterns.push(HostPattern::wildcard(&format!("*{alternative}"))?);
                domain_suffix(alternative)
            } else {
                patterns.push(HostPattern::Literal(alternative.to_string()));
                None
            };
            if domain_multiplex {
                if let Some(suffix) = suffix.filter(|s| !domain_suffixes.contains(s)) {
                    domain_suffixes.push(suffix);
                }
            }
        }
        patterns.extend(domain_suffixes.iter().cloned().map(HostPattern::DomainSuffix));

        let contexts = handlers
            .iter()
            .map(|(codec, handler)| {
                (
                    codec.clone(),
                    PerDirection::from_fn(|direction| handler.create_context(direction)),
                )
            })
            .collect();

        Ok(Self {
            name: name.to_string(),
            patterns,
            domain_suffixes,
            contexts,
            messages: PerDirection::default(),
        })
    }

    /// True if `host` belongs on this connection.
    pub fn matches(&self, host: &str) -> bool {
        self.name == host || self.patterns.iter().any(|pattern| pattern.matches(host))
    }

    /// Declaration or host this connection was created for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Compiled patterns, domain suffix patterns last.
    pub fn patterns(&self) -> &[HostPattern] {
        &self.patterns
    }

    /// Two-label domains this connection accepts any host of.
    pub fn domain_suffixes(&self) -> &[String] {
        &self.domain_suffixes
    }

    /// Context of `codec` for `direction`, if the codec was configured.
    pub fn context_mut(
        &mut self,
        codec: &str,
        direction: Direction,
    ) -> Option<&mut (dyn CodecContext + 'static)> {
        self.contexts
            .get_mut(codec)
            .map(|pair| &mut **pair.get_mut(direction))
    }

    /// Immutable view of a context.
    pub fn context(&self, codec: &str, direction: Direction) -> Option<&dyn CodecContext> {
        self.contexts
            .get(codec)
            .map(|pair| &**pair.get(direction))
    }

    /// Messages routed to this connection in `direction`.
    pub fn message_count(&self, direction: Direction) -> u64 {
        *self.messages.get(direction)
    }

    pub(crate) fn record_message(&mut self, direction: Direction) {
        *self.messages.get_mut(direction) += 1;
    }
}

/// Registry of simulated connections, in creation order.
#[derive(Debug, Default)]
pub struct ConnectionManager {
    connections: Vec<Connection>,
    by_name: HashMap<String, usize>,
    domain_multiplex: bool,
}

impl ConnectionManager {
    /// Creates an empty registry.
    pub fn new(domain_multiplex: bool) -> Self {
        Self {
            connections: Vec::new(),
            by_name: HashMap::new(),
            domain_multiplex,
        }
    }

    /// Whether plain names also cover hosts of their domain.
    pub fn domain_multiplex(&self) -> bool {
        self.domain_multiplex
    }

    /// Eagerly creates the connection for a multiplex declaration.
    ///
    /// Declaring the same name twice returns the existing connection.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidHostPattern`] - An alternative does not compile
    pub fn declare(
        &mut self,
        declaration: &str,
        handlers: &CodecHandlers,
    ) -> Result<&mut Connection, ConfigError> {
        if let Some(&index) = self.by_name.get(declaration) {
            debug!(connection = declaration, "connection already declared");
            return Ok(&mut self.connections[index]);
        }
        let connection = Connection::new(declaration, handlers, self.domain_multiplex)?;
        info!(
            connection = declaration,
            suffixes = ?connection.domain_suffixes(),
            "initial connection"
        );
        let index = self.push(connection);
        Ok(&mut self.connections[index])
    }

    /// Connection carrying traffic for `host`.
    ///
    /// Looks up `host` as a connection name first, then asks every connection
    /// in creation order; the first match wins. Otherwise a new connection
    /// named `host` is created with fresh contexts.
    ///
    /// # Errors
    /// - [`ConfigError::InvalidHostPattern`] - `host` cannot be compiled into a pattern
    pub fn connection_for(
        &mut self,
        host: &str,
        handlers: &CodecHandlers,
    ) -> Result<&mut Connection, ConfigError> {
        let index = match self.find(host) {
            Some(index) => index,
            None => {
                let connection = Connection::new(host, handlers, self.domain_multiplex)?;
                info!(
                    connection = host,
                    suffixes = ?connection.domain_suffixes(),
                    "new connection"
                );
                self.push(connection)
            }
        };
        Ok(&mut self.connections[index])
    }

    fn find(&self, host: &str) -> Option<usize> {
        self.by_name
            .get(host)
            .copied()
            .or_else(|| self.connections.iter().position(|c| c.matches(host)))
    }

    fn push(&mut self, connection: Connection) -> usize {
        let index = self.connections.len();
        self.by_name.insert(connection.name.clone(), index);
        self.connections.push(connection);
        index
    }

    /// Connection registered under `name`.
    pub fn get(&self, name: &str) -> Option<&Connection> {
        let index = *self.by_name.get(name)?;
        self.connections.get(index)
    }

    /// Mutable connection registered under `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Connection> {
        let index = *self.by_name.get(name)?;
        self.connections.get_mut(index)
    }

    /// Number of connections created so far.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// True if no connection exists yet.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Connections in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }
}
