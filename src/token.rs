//! Module with the token types of the scanner.
//! The token kinds and their integer symbol values are fixed by the host
//! grammar; the symbol values double as indices into the expected-token
//! vector the host passes to every scan.

use serde::{Deserialize, Serialize};

use crate::{HackdocError, Span};

/// The token kinds the scanner can emit.
///
/// The discriminants are the symbol numbers of the host grammar and must not
/// be reordered. `HeredocStartNewline` and `HeredocEndNewline` are never
/// requested by the host directly; they are produced as side effects of a
/// body scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// The opener identifier, optionally quoted, ending before its newline.
    HeredocStart = 0,
    /// The first body-region token when the line after the opener is not
    /// already the closing delimiter.
    HeredocStartNewline = 1,
    /// A run of body bytes, ending before an interpolation site or at a
    /// newline.
    HeredocBody = 2,
    /// The newline separating the last body line from the closing delimiter
    /// line.
    HeredocEndNewline = 3,
    /// The closing delimiter.
    HeredocEnd = 4,
    /// The `{` of a `{$…}` interpolation; the host parser lexes the
    /// expression and the matching `}` itself.
    EmbeddedOpeningBrace = 5,
}

impl TokenKind {
    /// The number of token kinds, which is also the length of the
    /// expected-token vector.
    pub const COUNT: usize = 6;

    /// All token kinds in symbol order.
    pub const ALL: [TokenKind; TokenKind::COUNT] = [
        TokenKind::HeredocStart,
        TokenKind::HeredocStartNewline,
        TokenKind::HeredocBody,
        TokenKind::HeredocEndNewline,
        TokenKind::HeredocEnd,
        TokenKind::EmbeddedOpeningBrace,
    ];

    /// Get the symbol index of the token kind.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Get the grammar name of the token kind.
    pub const fn name(self) -> &'static str {
        match self {
            TokenKind::HeredocStart => "HEREDOC_START",
            TokenKind::HeredocStartNewline => "HEREDOC_START_NEWLINE",
            TokenKind::HeredocBody => "HEREDOC_BODY",
            TokenKind::HeredocEndNewline => "HEREDOC_END_NEWLINE",
            TokenKind::HeredocEnd => "HEREDOC_END",
            TokenKind::EmbeddedOpeningBrace => "EMBEDDED_OPENING_BRACE",
        }
    }
}

impl TryFrom<usize> for TokenKind {
    type Error = HackdocError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        TokenKind::ALL
            .get(index)
            .copied()
            .ok_or(HackdocError::InvalidTokenIndex(index))
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The set of token kinds the host parser currently accepts.
/// It mirrors the boolean vector the host hands to every scan invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenSet {
    expected: [bool; TokenKind::COUNT],
}

impl TokenSet {
    /// Create an empty token set.
    pub const fn new() -> Self {
        TokenSet {
            expected: [false; TokenKind::COUNT],
        }
    }

    /// Add a token kind to the set.
    pub const fn with(mut self, kind: TokenKind) -> Self {
        self.expected[kind.index()] = true;
        self
    }

    /// Check if the set contains the given token kind.
    #[inline]
    pub const fn contains(&self, kind: TokenKind) -> bool {
        self.expected[kind.index()]
    }

    /// Create a token set from the host's expected vector.
    /// Entries beyond the fixed number of token kinds are ignored.
    pub fn from_expected(expected: &[bool]) -> Self {
        let mut set = TokenSet::new();
        for (index, &value) in expected.iter().take(TokenKind::COUNT).enumerate() {
            set.expected[index] = value;
        }
        set
    }
}

impl From<[bool; TokenKind::COUNT]> for TokenSet {
    fn from(expected: [bool; TokenKind::COUNT]) -> Self {
        TokenSet { expected }
    }
}

impl std::fmt::Display for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for kind in TokenKind::ALL {
            if self.contains(kind) {
                if !first {
                    write!(f, " ")?;
                }
                write!(f, "{}", kind)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// A token emitted by the scanner.
#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The kind of the token.
    kind: TokenKind,
    /// The underlying token span.
    span: Span,
}

impl Token {
    /// Create a new token.
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Get the kind of the token.
    #[inline]
    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// Get the span of the token.
    #[inline]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Get the start of the token.
    #[inline]
    pub fn start(&self) -> usize {
        self.span.start
    }

    /// Get the end of the token.
    #[inline]
    pub fn end(&self) -> usize {
        self.span.end
    }

    /// Get the span as range.
    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.span.range()
    }

    /// Get the length of the token.
    #[inline]
    pub fn len(&self) -> usize {
        self.span.len()
    }

    /// Check if the token is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }
}
