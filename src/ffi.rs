//! Module with the C ABI entry points of the external scanner.
//!
//! The generated host parser calls five functions, suffixed with the
//! language identifier, over an opaque scanner pointer. The lexer it passes
//! is a struct of a lookahead field, a result-symbol field, and callbacks;
//! [TSLexer] mirrors that layout and is adapted onto the [Lexer] trait.

use core::ffi::c_void;

use crate::scanner::SERIALIZATION_BUFFER_SIZE;
use crate::{Lexer, Scanner, TokenKind, TokenSet};

/// The lexer struct of the host parser.
#[repr(C)]
pub struct TSLexer {
    /// The current lookahead code point; zero at end of input.
    pub lookahead: i32,
    /// The symbol number of the matched token, written by the scanner.
    pub result_symbol: u16,
    /// Consume one code point; with the flag set the code point belongs to
    /// no token.
    pub advance: Option<unsafe extern "C" fn(*mut TSLexer, bool)>,
    /// Record the current position as the end of the token being matched.
    pub mark_end: Option<unsafe extern "C" fn(*mut TSLexer)>,
    /// The column of the current position.
    pub get_column: Option<unsafe extern "C" fn(*mut TSLexer) -> u32>,
    /// Whether the current position starts an included range.
    pub is_at_included_range_start: Option<unsafe extern "C" fn(*const TSLexer) -> bool>,
    /// Whether the lexer is at the end of input.
    pub eof: Option<unsafe extern "C" fn(*const TSLexer) -> bool>,
}

// Adapter from the host's lexer struct onto the scanner's trait.
struct CLexer {
    raw: *mut TSLexer,
}

impl Lexer for CLexer {
    fn lookahead(&self) -> u32 {
        // SAFETY: the host keeps the lexer pointer valid for the duration of
        // the scan call.
        unsafe { (*self.raw).lookahead as u32 }
    }

    fn advance(&mut self, skip: bool) {
        unsafe {
            if let Some(advance) = (*self.raw).advance {
                advance(self.raw, skip);
            }
        }
    }

    fn mark_end(&mut self) {
        unsafe {
            if let Some(mark_end) = (*self.raw).mark_end {
                mark_end(self.raw);
            }
        }
    }

    fn set_result(&mut self, kind: TokenKind) {
        unsafe {
            (*self.raw).result_symbol = kind.index() as u16;
        }
    }
}

/// Allocate a scanner with fresh zeroed state.
#[no_mangle]
pub extern "C" fn tree_sitter_hack_external_scanner_create() -> *mut c_void {
    Box::into_raw(Box::new(Scanner::new())).cast()
}

/// Release the scanner and its buffer.
///
/// # Safety
///
/// `payload` must be a pointer returned by the create entry point that has
/// not been destroyed yet, or null.
#[no_mangle]
pub unsafe extern "C" fn tree_sitter_hack_external_scanner_destroy(payload: *mut c_void) {
    if !payload.is_null() {
        drop(Box::from_raw(payload.cast::<Scanner>()));
    }
}

/// Perform one scan. On success the matched symbol has been recorded in the
/// lexer's result field.
///
/// # Safety
///
/// `payload` must be a live scanner from the create entry point, `lexer`
/// a valid lexer struct, and `expected` an array of at least six booleans.
#[no_mangle]
pub unsafe extern "C" fn tree_sitter_hack_external_scanner_scan(
    payload: *mut c_void,
    lexer: *mut TSLexer,
    expected: *const bool,
) -> bool {
    let scanner = &mut *payload.cast::<Scanner>();
    let expected =
        TokenSet::from_expected(std::slice::from_raw_parts(expected, TokenKind::COUNT));
    let mut lexer = CLexer { raw: lexer };
    scanner.scan(&mut lexer, &expected)
}

/// Write the scanner state into the host's scratch region and return the
/// number of bytes written; zero tells the host not to cache the state.
///
/// # Safety
///
/// `payload` must be a live scanner from the create entry point and
/// `buffer` must point to the host's scratch region of 1024 bytes.
#[no_mangle]
pub unsafe extern "C" fn tree_sitter_hack_external_scanner_serialize(
    payload: *mut c_void,
    buffer: *mut u8,
) -> u32 {
    let scanner = &*payload.cast::<Scanner>();
    let out = std::slice::from_raw_parts_mut(buffer, SERIALIZATION_BUFFER_SIZE);
    scanner.serialize(out) as u32
}

/// Restore the scanner state from a serialized image. A zero length resets
/// the state.
///
/// # Safety
///
/// `payload` must be a live scanner from the create entry point and
/// `buffer` must point to at least `length` readable bytes when `length`
/// is nonzero.
#[no_mangle]
pub unsafe extern "C" fn tree_sitter_hack_external_scanner_deserialize(
    payload: *mut c_void,
    buffer: *const u8,
    length: u32,
) {
    let scanner = &mut *payload.cast::<Scanner>();
    let bytes = if length == 0 || buffer.is_null() {
        &[]
    } else {
        std::slice::from_raw_parts(buffer, length as usize)
    };
    scanner.deserialize(bytes);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    // A C-style lexer over a byte buffer: the TSLexer is the first field so
    // the callbacks can recover the full struct from the raw pointer.
    #[repr(C)]
    struct TestLexer {
        inner: TSLexer,
        input: &'static [u8],
        cursor: usize,
    }

    impl TestLexer {
        fn new(input: &'static [u8]) -> Box<Self> {
            let mut lexer = Box::new(TestLexer {
                inner: TSLexer {
                    lookahead: 0,
                    result_symbol: u16::MAX,
                    advance: Some(test_advance),
                    mark_end: Some(test_mark_end),
                    get_column: None,
                    is_at_included_range_start: None,
                    eof: None,
                },
                input,
                cursor: 0,
            });
            lexer.refresh();
            lexer
        }

        fn refresh(&mut self) {
            self.inner.lookahead = self
                .input
                .get(self.cursor)
                .copied()
                .map(i32::from)
                .unwrap_or(0);
        }
    }

    unsafe extern "C" fn test_advance(lexer: *mut TSLexer, _skip: bool) {
        let lexer = &mut *lexer.cast::<TestLexer>();
        if lexer.cursor < lexer.input.len() {
            lexer.cursor += 1;
        }
        lexer.refresh();
    }

    unsafe extern "C" fn test_mark_end(_lexer: *mut TSLexer) {}

    #[test]
    fn test_create_serialize_deserialize_destroy() {
        init();
        let payload = tree_sitter_hack_external_scanner_create();
        assert!(!payload.is_null());

        let image = [1u8, 0, 1, b'E', b'N', b'D'];
        let mut buffer = [0u8; SERIALIZATION_BUFFER_SIZE];
        unsafe {
            tree_sitter_hack_external_scanner_deserialize(
                payload,
                image.as_ptr(),
                image.len() as u32,
            );
            let length =
                tree_sitter_hack_external_scanner_serialize(payload, buffer.as_mut_ptr());
            assert_eq!(length, 6);
            assert_eq!(&buffer[..6], &image);

            // Zero length resets; an empty state serializes to the three
            // flag bytes.
            tree_sitter_hack_external_scanner_deserialize(payload, std::ptr::null(), 0);
            let length =
                tree_sitter_hack_external_scanner_serialize(payload, buffer.as_mut_ptr());
            assert_eq!(length, 3);
            assert_eq!(&buffer[..3], &[0, 0, 0]);

            tree_sitter_hack_external_scanner_destroy(payload);
        }
    }

    #[test]
    fn test_scan_through_the_c_interface() {
        init();
        let payload = tree_sitter_hack_external_scanner_create();
        let mut lexer = TestLexer::new(b"EOF\nEOF;\n");
        let expected = [true, false, false, false, false, false];

        unsafe {
            let matched = tree_sitter_hack_external_scanner_scan(
                payload,
                &mut lexer.inner,
                expected.as_ptr(),
            );
            assert!(matched);
            assert_eq!(
                lexer.inner.result_symbol,
                TokenKind::HeredocStart.index() as u16
            );

            // The optimistic close was detected and survives serialization.
            let mut buffer = [0u8; SERIALIZATION_BUFFER_SIZE];
            let length =
                tree_sitter_hack_external_scanner_serialize(payload, buffer.as_mut_ptr());
            assert_eq!(length, 6);
            assert_eq!(buffer[2], 1); // did_end
            assert_eq!(&buffer[3..6], b"EOF");

            tree_sitter_hack_external_scanner_destroy(payload);
        }
    }
}
