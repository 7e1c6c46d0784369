//! Module with the heredoc scanner state machine.
//!
//! The scanner recognizes the tokens that bound and interrupt a heredoc or
//! nowdoc literal. The host parser drives it one token at a time and owns
//! all byte positions; the scanner only advances the host's lexer, marks
//! token ends, and records result kinds. Its persistent state is four
//! fields, small enough to serialize into the host's scratch region between
//! incremental parse steps.

use log::trace;

use crate::delimiter::Delimiter;
use crate::lexer::{is_delimiter_continue, is_delimiter_start, is_identifier_start, is_space};
use crate::{HackdocError, Lexer, Result, TokenKind, TokenSet};

/// The size of the scratch region the host provides for state serialization.
pub const SERIALIZATION_BUFFER_SIZE: usize = 1024;

const NUL: u32 = 0;
const NEWLINE: u32 = b'\n' as u32;
const BACKSLASH: u32 = b'\\' as u32;
const DOLLAR: u32 = b'$' as u32;
const OPEN_BRACE: u32 = b'{' as u32;
const SEMICOLON: u32 = b';' as u32;
const SINGLE_QUOTE: u32 = b'\'' as u32;
const DOUBLE_QUOTE: u32 = b'"' as u32;

/// The heredoc scanner.
///
/// One instance exists per parse session. All mutation happens inside
/// [Scanner::scan]; the host retains only the mutations of successful scans
/// and discards the rest (emulated with a snapshot where no such host
/// exists, see [crate::TokenStream]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scanner {
    /// The close-identifier of the open heredoc; empty iff no heredoc is
    /// open.
    delimiter: Delimiter,
    /// True if the opener was single-quoted. The body scan then ignores
    /// `{` and `$`.
    is_nowdoc: bool,
    /// True once HEREDOC_START_NEWLINE has been emitted; stays true until
    /// the heredoc fully closes.
    did_start: bool,
    /// True if the closing delimiter was seen in a previous scan but not
    /// yet emitted as HEREDOC_END.
    did_end: bool,
}

impl Scanner {
    /// Create a scanner with fresh empty state.
    pub fn new() -> Self {
        Self {
            delimiter: Delimiter::new(),
            is_nowdoc: false,
            did_start: false,
            did_end: false,
        }
    }

    /// Check if the scanner is between a heredoc opener and its closer.
    #[inline]
    pub fn in_heredoc(&self) -> bool {
        !self.delimiter.is_empty()
    }

    /// Perform one scan. On success the result kind has been recorded via
    /// [Lexer::set_result] and the token extent via [Lexer::mark_end];
    /// returns false when no heredoc token matches at this position, leaving
    /// the host free to try other lex paths.
    pub fn scan(&mut self, lexer: &mut impl Lexer, expected: &TokenSet) -> bool {
        trace!("> {}", expected);

        if (expected.contains(TokenKind::HeredocBody)
            || expected.contains(TokenKind::HeredocEnd)
            || expected.contains(TokenKind::EmbeddedOpeningBrace))
            && self.in_heredoc()
        {
            return self.scan_body(lexer);
        }

        if expected.contains(TokenKind::HeredocStart) {
            return self.scan_start(lexer);
        }

        false
    }

    /// Recognize the opener: optional whitespace, the delimiter identifier
    /// (bare, single- or double-quoted), then a newline. The newline is
    /// lookahead past the marked token end. After a valid opener the closer
    /// is optimistically matched so that a one-line empty heredoc can be
    /// finalized without re-matching the delimiter.
    fn scan_start(&mut self, lexer: &mut impl Lexer) -> bool {
        trace!("scan_start() <-");

        while is_space(lexer.lookahead()) {
            skip(lexer);
        }

        self.is_nowdoc = lexer.lookahead() == SINGLE_QUOTE;
        self.delimiter.clear();

        let mut quote = 0;
        if self.is_nowdoc || lexer.lookahead() == DOUBLE_QUOTE {
            quote = lexer.lookahead();
            next(lexer);
        }

        if is_delimiter_start(lexer.lookahead()) {
            self.delimiter.push(lexer.lookahead() as u8);
            next(lexer);

            while is_delimiter_continue(lexer.lookahead()) {
                self.delimiter.push(lexer.lookahead() as u8);
                next(lexer);
            }
        }

        trace!("del {}", self.delimiter);

        if lexer.lookahead() == quote {
            next(lexer);
        } else if quote != 0 {
            // Opening quote without a matching closing quote.
            return ret("scan_start", false);
        }

        // A valid delimiter must end with a newline with no whitespace in
        // between.
        if lexer.lookahead() != NEWLINE || self.delimiter.is_empty() {
            return false;
        }

        set(lexer, TokenKind::HeredocStart);
        stop(lexer);
        next(lexer);

        if self.scan_delimiter(lexer) {
            if lexer.lookahead() == SEMICOLON {
                next(lexer);
            }
            if lexer.lookahead() == NEWLINE {
                // The line after the opener is already the closer.
                self.did_end = true;
            }
        }

        ret("scan_start", true)
    }

    /// Consume body bytes until exactly one of HEREDOC_BODY,
    /// HEREDOC_START_NEWLINE, HEREDOC_END_NEWLINE, HEREDOC_END, or
    /// EMBEDDED_OPENING_BRACE can be emitted. `did_advance` tracks whether
    /// any body byte was consumed in this invocation.
    fn scan_body(&mut self, lexer: &mut impl Lexer) -> bool {
        trace!("scan_body() <-");

        let mut did_advance = false;

        loop {
            if lexer.lookahead() == NUL {
                return false;
            }

            // A backslash neutralizes the following byte, in nowdocs too.
            if lexer.lookahead() == BACKSLASH {
                next(lexer);
                next(lexer);
                did_advance = true;
                continue;
            }

            if (lexer.lookahead() == OPEN_BRACE || lexer.lookahead() == DOLLAR) && !self.is_nowdoc
            {
                stop(lexer);

                if lexer.lookahead() == OPEN_BRACE {
                    next(lexer);

                    // `{$` opens an embedded expression only at the very
                    // beginning of a body scan; mid-body the `$` branch
                    // below splits the body chunk first.
                    if lexer.lookahead() == DOLLAR && !did_advance {
                        stop(lexer);
                        next(lexer);

                        if is_identifier_start(lexer.lookahead()) {
                            set(lexer, TokenKind::EmbeddedOpeningBrace);
                            return ret("scan_body", true);
                        }
                    }
                }

                if lexer.lookahead() == DOLLAR {
                    next(lexer);

                    if is_identifier_start(lexer.lookahead()) {
                        set(lexer, TokenKind::HeredocBody);
                        // Succeeds only if body bytes precede the `$`;
                        // otherwise the host lexes the variable itself.
                        return ret("scan_body", did_advance);
                    }
                }

                did_advance = true;
                continue;
            }

            if self.did_end || lexer.lookahead() == NEWLINE {
                if did_advance {
                    stop(lexer);
                    next(lexer);
                } else if lexer.lookahead() == NEWLINE {
                    if self.did_end {
                        // Closer detected by an earlier scan; this newline
                        // belongs to no token.
                        skip(lexer);
                    } else {
                        // The newline opens whichever token this scan turns
                        // out to emit.
                        next(lexer);
                        stop(lexer);
                    }
                }

                if self.scan_delimiter(lexer) {
                    if !did_advance && self.did_end {
                        stop(lexer);
                    }
                    if lexer.lookahead() == SEMICOLON {
                        next(lexer);
                    }
                    if lexer.lookahead() == NEWLINE {
                        if did_advance {
                            set(lexer, TokenKind::HeredocBody);
                            self.did_start = true;
                            self.did_end = true;
                        } else if self.did_end {
                            set(lexer, TokenKind::HeredocEnd);
                            self.delimiter.clear();
                            self.is_nowdoc = false;
                            self.did_start = false;
                            self.did_end = false;
                        } else {
                            set(lexer, TokenKind::HeredocEndNewline);
                            self.did_start = true;
                            self.did_end = true;
                        }
                        return ret("scan_body", true);
                    }
                } else if !self.did_start && !did_advance {
                    // The first line after the opener is not the closer.
                    self.did_start = true;
                    set(lexer, TokenKind::HeredocStartNewline);
                    return ret("scan_body", true);
                }

                did_advance = true;
                continue;
            }

            next(lexer);
            did_advance = true;
        }
    }

    /// Match the close-identifier byte-for-byte at the current position.
    /// Always invoked immediately after a newline was consumed; a mismatch
    /// leaves the consumed bytes to the failed-scan discard contract.
    fn scan_delimiter(&self, lexer: &mut impl Lexer) -> bool {
        trace!("scan_delimiter() <-");
        for &byte in self.delimiter.as_bytes() {
            if lexer.lookahead() == u32::from(byte) {
                next(lexer);
            } else {
                return ret("scan_delimiter", false);
            }
        }
        ret("scan_delimiter", true)
    }

    /// Write the state into the host's scratch region and return the number
    /// of bytes written. Returns 0 when the state does not fit, which tells
    /// the host not to cache it.
    ///
    /// Layout: one byte each for `is_nowdoc`, `did_start`, `did_end`,
    /// followed by the delimiter bytes without terminator.
    pub fn serialize(&self, out: &mut [u8]) -> usize {
        let length = self.delimiter.len() + 3;
        if length > out.len() {
            return 0;
        }
        out[0] = self.is_nowdoc as u8;
        out[1] = self.did_start as u8;
        out[2] = self.did_end as u8;
        out[3..length].copy_from_slice(self.delimiter.as_bytes());
        length
    }

    /// Restore the state from a serialized image. An empty image resets the
    /// scanner; an image shorter than the three flag bytes is rejected.
    pub fn restore(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            self.reset();
            return Ok(());
        }
        if bytes.len() < 3 {
            return Err(HackdocError::MalformedState(bytes.len()));
        }
        self.is_nowdoc = bytes[0] != 0;
        self.did_start = bytes[1] != 0;
        self.did_end = bytes[2] != 0;
        self.delimiter.set(&bytes[3..]);
        Ok(())
    }

    /// Restore the state from a serialized image, degrading a malformed
    /// image to a reset. This is the total variant the C entry point uses.
    pub fn deserialize(&mut self, bytes: &[u8]) {
        if self.restore(bytes).is_err() {
            self.reset();
        }
    }

    /// Reset to the all-empty state. The delimiter buffer keeps its
    /// capacity.
    pub fn reset(&mut self) {
        self.is_nowdoc = false;
        self.did_start = false;
        self.did_end = false;
        self.delimiter.clear();
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Scanner::new()
    }
}

fn next(lexer: &mut impl Lexer) {
    trace!("next {}", visible(lexer.lookahead()));
    lexer.advance(false);
}

fn skip(lexer: &mut impl Lexer) {
    trace!("skip {}", visible(lexer.lookahead()));
    lexer.advance(true);
}

fn stop(lexer: &mut impl Lexer) {
    trace!("stop {}", visible(lexer.lookahead()));
    lexer.mark_end();
}

fn set(lexer: &mut impl Lexer, kind: TokenKind) {
    trace!("set {}", kind);
    lexer.set_result(kind);
}

fn ret(function: &str, result: bool) -> bool {
    trace!("{}() -> {}", function, result);
    result
}

/// Render a lookahead value for single-line trace output.
fn visible(chr: u32) -> String {
    match chr {
        0 => "\\0".to_string(),
        9 => "\\t".to_string(),
        10 => "\\n".to_string(),
        13 => "\\r".to_string(),
        c if is_space(c) => "\\s".to_string(),
        c => char::from_u32(c)
            .map(String::from)
            .unwrap_or_else(|| format!("\\x{:02x}", c)),
    }
}
