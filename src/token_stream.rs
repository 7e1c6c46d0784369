//! Module with the host-emulating token stream.
//!
//! The scanner on its own only answers one question per invocation; the
//! ordering of invocations, the expected-token sets, the rollback of failed
//! scans, and the lexing of interpolated variables and embedded expressions
//! are the host parser's business. [TokenStream] plays that host over a
//! string, which makes whole heredoc literals observable as event
//! sequences.

use serde::{Deserialize, Serialize};

use crate::lexer::{is_identifier_continue, is_identifier_start};
use crate::scanner::SERIALIZATION_BUFFER_SIZE;
use crate::{Scanner, Span, StrLexer, Token, TokenKind, TokenSet};

const START_EXPECTED: TokenSet = TokenSet::new().with(TokenKind::HeredocStart);
const BODY_EXPECTED: TokenSet = TokenSet::new()
    .with(TokenKind::HeredocBody)
    .with(TokenKind::HeredocEnd)
    .with(TokenKind::EmbeddedOpeningBrace);

/// One event of a heredoc literal.
///
/// Scanner tokens carry one of the six token kinds. `Variable` and
/// `Expression` cover the regions the host parser lexes itself: a
/// `$identifier` after the scanner declined, and the contents of a `{$…}`
/// interpolation up to and including the matching `}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeredocEvent {
    /// A token emitted by the scanner.
    Token(Token),
    /// A `$identifier` lexed by the host.
    Variable(Span),
    /// An embedded expression lexed by the host, including the closing
    /// brace.
    Expression(Span),
}

impl HeredocEvent {
    /// Get the byte range the event covers.
    pub fn span(&self) -> Span {
        match self {
            HeredocEvent::Token(token) => token.span(),
            HeredocEvent::Variable(span) => *span,
            HeredocEvent::Expression(span) => *span,
        }
    }
}

/// An iterator over the heredoc events of an input.
///
/// * `'h` represents the lifetime of the haystack being scanned.
///
/// For every `<<<` operator it drives the scanner through a complete
/// literal: one opener scan, then body scans until the closer. The
/// external-scanner contract is honored on the way. State mutations of
/// failed scans are discarded, and the state is round-tripped through its
/// serialized image between successful scans the way an incremental host
/// would restore a cached state.
#[derive(Debug)]
pub struct TokenStream<'h> {
    bytes: &'h [u8],
    lexer: StrLexer<'h>,
    scanner: Scanner,
    scratch: [u8; SERIALIZATION_BUFFER_SIZE],
    in_heredoc: bool,
    // An emitted opening brace obligates the host to lex the expression
    // before the scanner runs again.
    expression_pending: bool,
}

impl<'h> TokenStream<'h> {
    /// Create a new token stream over the given input.
    pub fn new(input: &'h str) -> Self {
        Self {
            bytes: input.as_bytes(),
            lexer: StrLexer::new(input),
            scanner: Scanner::new(),
            scratch: [0; SERIALIZATION_BUFFER_SIZE],
            in_heredoc: false,
            expression_pending: false,
        }
    }

    /// Run one scan under the host contract: snapshot the scanner and the
    /// cursor, and restore both when the scan fails. On success the cursor
    /// resumes at the token end and the state is cycled through its
    /// serialized image.
    fn scan(&mut self, expected: &TokenSet) -> Option<Token> {
        let snapshot = self.scanner.clone();
        let position = self.lexer.pos();

        if self.scanner.scan(&mut self.lexer, expected) {
            if let Some(kind) = self.lexer.result() {
                let token = Token::new(kind, self.lexer.token());
                self.lexer.seek(token.end());
                let length = self.scanner.serialize(&mut self.scratch);
                if length > 0 {
                    self.scanner.deserialize(&self.scratch[..length]);
                }
                return Some(token);
            }
        }

        self.scanner = snapshot;
        self.lexer.seek(position);
        None
    }

    // True if the cursor sits on a `$identifier` the host can lex.
    fn at_variable(&self) -> bool {
        let pos = self.lexer.pos();
        self.bytes.get(pos) == Some(&b'$')
            && self
                .bytes
                .get(pos + 1)
                .is_some_and(|&byte| is_identifier_start(u32::from(byte)))
    }

    // Lex a `$identifier` at the cursor. The caller has verified the sigil
    // and the identifier start.
    fn lex_variable(&mut self) -> Span {
        let start = self.lexer.pos();
        let mut end = start + 2;
        while end < self.bytes.len() && is_identifier_continue(u32::from(self.bytes[end])) {
            end += 1;
        }
        self.lexer.seek(end);
        Span::new(start, end)
    }

    // Lex the embedded expression after an emitted opening brace, through
    // the matching `}`. Returns None when the input ends unbalanced.
    fn lex_expression(&mut self) -> Option<Span> {
        let start = self.lexer.pos();
        let mut depth = 1usize;
        let mut pos = start;
        while depth > 0 {
            match self.bytes.get(pos)? {
                b'{' => depth += 1,
                b'}' => depth -= 1,
                _ => {}
            }
            pos += 1;
        }
        self.lexer.seek(pos);
        Some(Span::new(start, pos))
    }

    // Find the next `<<<` operator, the grammar's anchor for an opener, and
    // place the cursor after it.
    fn seek_past_operator(&mut self) -> Option<()> {
        let from = self.lexer.pos();
        let offset = self.bytes[from..].windows(3).position(|w| w == b"<<<")?;
        self.lexer.seek(from + offset + 3);
        Some(())
    }
}

impl Iterator for TokenStream<'_> {
    type Item = HeredocEvent;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.expression_pending {
                self.expression_pending = false;
                let span = self.lex_expression()?;
                return Some(HeredocEvent::Expression(span));
            }

            if self.in_heredoc {
                if let Some(token) = self.scan(&BODY_EXPECTED) {
                    match token.kind() {
                        TokenKind::HeredocEnd => self.in_heredoc = false,
                        TokenKind::EmbeddedOpeningBrace => self.expression_pending = true,
                        _ => {}
                    }
                    return Some(HeredocEvent::Token(token));
                }
                // The scanner declined. The grammar falls back to a
                // host-lexed variable; anything else means the heredoc is
                // unterminated and the stream ends.
                if self.at_variable() {
                    let span = self.lex_variable();
                    return Some(HeredocEvent::Variable(span));
                }
                return None;
            }

            self.seek_past_operator()?;
            let resume = self.lexer.pos();
            if let Some(token) = self.scan(&START_EXPECTED) {
                self.in_heredoc = true;
                return Some(HeredocEvent::Token(token));
            }
            // Not a heredoc opener after all; keep searching past the
            // operator.
            self.lexer.seek(resume);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_events_expose_spans() {
        init();
        let input = "<<<EOF\nHello $name!\nEOF;\n";
        let events: Vec<HeredocEvent> = TokenStream::new(input).collect();
        for event in &events {
            assert!(event.span().end <= input.len());
        }
        // The variable event covers the sigil and the identifier.
        let variable = events
            .iter()
            .find(|e| matches!(e, HeredocEvent::Variable(_)))
            .unwrap();
        assert_eq!(&input[variable.span().range()], "$name");
    }

    #[test]
    fn test_event_serialization() {
        init();
        let event = HeredocEvent::Token(Token::new(TokenKind::HeredocStart, Span::new(3, 6)));

        let serialized = serde_json::to_string(&event).unwrap();
        eprintln!("{}", serialized);
        let deserialized: HeredocEvent = serde_json::from_str(&serialized).unwrap();
        assert_eq!(event, deserialized);
    }

    #[test]
    fn test_no_heredoc_no_events() {
        init();
        assert_eq!(TokenStream::new("$x = 1 + 2;\n").count(), 0);
        assert_eq!(TokenStream::new("").count(), 0);
        // A shift operator is not an opener.
        assert_eq!(TokenStream::new("$x = $y << 2;\n").count(), 0);
    }
}
