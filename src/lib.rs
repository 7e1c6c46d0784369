#![forbid(missing_docs)]
//! # `hackdoc`
//! The `hackdoc` crate implements the external heredoc/nowdoc scanner of an
//! incremental parser for the Hack language. The surrounding parser is
//! generated from a declarative grammar and handles all ordinary tokens; it
//! delegates to this scanner for the tokens that bound and interrupt a
//! heredoc string literal, because the close marker is a user-chosen
//! identifier captured at open time and cannot be expressed as a regular
//! expression.
//!
//! The scanner is restartable and incrementally re-entrant: its persistent
//! state is four fields (the close-identifier, a nowdoc flag, and two
//! progress flags) that serialize into a small byte image between parse
//! steps, so partial re-parses resume exactly where they left off. Six
//! token kinds are emitted; interpolation sites (`$name`, `{$expr}`) carve
//! the body into multiple tokens and hand expression lexing back to the
//! host parser.
//!
//! # Example with the host-emulating token stream
//! ```rust
//! use hackdoc::TokenStream;
//!
//! const INPUT: &str = "$greeting = <<<EOF\nHello $name!\nEOF;\n";
//!
//! fn main() {
//!     for event in TokenStream::new(INPUT) {
//!         println!("{:?}: '{}'", event, &INPUT[event.span().range()]);
//!     }
//! }
//! ```
//! The output of the example is:
//! ```text
//! Token(Token { kind: HeredocStart, span: Span { start: 15, end: 18 } }): 'EOF'
//! Token(Token { kind: HeredocStartNewline, span: Span { start: 18, end: 19 } }): '
//! '
//! Token(Token { kind: HeredocBody, span: Span { start: 19, end: 25 } }): 'Hello '
//! Variable(Span { start: 25, end: 30 }): '$name'
//! Token(Token { kind: HeredocBody, span: Span { start: 30, end: 31 } }): '!'
//! Token(Token { kind: HeredocEnd, span: Span { start: 32, end: 35 } }): 'EOF'
//! ```
//!
//! # Example with the scanner driven directly
//! ```rust
//! use hackdoc::{Scanner, StrLexer, TokenKind, TokenSet};
//!
//! const INPUT: &str = "EOF\nHello\nEOF;\n";
//!
//! fn main() {
//!     // The host grammar has consumed `<<<` and expects an opener.
//!     let mut scanner = Scanner::new();
//!     let mut lexer = StrLexer::new(INPUT);
//!     let expected = TokenSet::new().with(TokenKind::HeredocStart);
//!
//!     assert!(scanner.scan(&mut lexer, &expected));
//!     assert_eq!(lexer.result(), Some(TokenKind::HeredocStart));
//!     assert_eq!(&INPUT[lexer.token().range()], "EOF");
//!     assert!(scanner.in_heredoc());
//! }
//! ```
//!
//! The five C ABI entry points the generated parser links against live in
//! the [ffi] module.

/// Module with the delimiter buffer.
mod delimiter;

/// Module with error definitions.
mod errors;
pub use errors::{HackdocError, Result};

/// Module with the C ABI entry points.
pub mod ffi;

/// Module with the lexer I/O contract.
mod lexer;
pub use lexer::{Lexer, StrLexer};

/// Module with the scanner.
mod scanner;
pub use scanner::{Scanner, SERIALIZATION_BUFFER_SIZE};

/// Module with the span type.
mod span;
pub use span::Span;

/// Module with the token types.
mod token;
pub use token::{Token, TokenKind, TokenSet};

/// Module with the host-emulating token stream.
mod token_stream;
pub use token_stream::{HeredocEvent, TokenStream};
