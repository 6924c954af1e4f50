use thiserror::Error;

use crate::metadata::names::DotName;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Errors fall into three groups:
///
/// - **Parse errors** ([`Error::Malformed`], [`Error::OutOfBounds`],
///   [`Error::UnsupportedVersion`]) — the class-file bytes do not conform to the JVM
///   class-file format. A parse error aborts the affected class file; whether it aborts
///   the whole scan depends on the indexing policy.
/// - **Build errors** ([`Error::DuplicateClass`]) — two scanned class files declared the
///   same canonical name during a strict build.
/// - **Access errors** ([`Error::InvalidValueAccess`]) — a typed accessor was called on an
///   annotation value of a different kind. This is a contract error at the read surface;
///   the index itself remains valid.
#[derive(Error, Debug)]
pub enum Error {
    /// The class file is damaged and could not be parsed.
    ///
    /// Raised for a bad magic number, an unknown constant-pool tag, a read of a slot
    /// reserved by a `long`/`double` entry, a wrong-tag constant-pool access, illegal
    /// modified-UTF-8, an unknown element-value tag, a bad type descriptor, or an
    /// attribute whose content does not match its declared length. The source location
    /// where the malformation was detected is included for debugging.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the file.
    ///
    /// This error occurs when a read would cross the end of the class-file buffer. It is
    /// a safety check against truncated or corrupted input.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// The class file declared a major version older than the first supported one.
    ///
    /// Newer versions than the ones this library knows are still accepted; only their
    /// recognized attributes are decoded and everything else is skipped by length.
    #[error("Unsupported class file major version - {0}")]
    UnsupportedVersion(u16),

    /// Two class files declared the same canonical name within one index build.
    ///
    /// Only surfaced by a strict build; a lenient build replaces the earlier class and
    /// records a diagnostic instead.
    #[error("Class indexed twice - {0}")]
    DuplicateClass(DotName),

    /// A typed annotation-value accessor was used on a value of a different kind.
    ///
    /// For example `as_int` on a string value. The annotation value and the index it
    /// came from are unaffected.
    #[error("Annotation value is not {expected} - found {actual}")]
    InvalidValueAccess {
        /// The kind the caller asked for
        expected: &'static str,
        /// The kind the value actually holds
        actual: &'static str,
    },
}
