// Standard Library Imports
use std::fmt;

// External Crate Imports
use miette::{Diagnostic, LabeledSpan, SourceSpan};
use nom::error::ErrorKind;
use thiserror::Error;

/// A failed parse of a [`ChemicalOffset`](crate::ChemicalOffset) or [`ChainSpec`](crate::ChainSpec), pointing back
/// into the text that failed
#[derive(Clone, Eq, PartialEq, Debug, Error)]
#[error("failed to parse {target} {:?}: {kind}", .input.trim_end())]
pub struct ParseError {
    // NOTE: Carries one extra trailing space so that labels can point at the end of the input
    input: String,
    target: &'static str,
    span: SourceSpan,
    kind: ParseErrorKind,
}

#[derive(Clone, Eq, PartialEq, Debug, Diagnostic, Error)]
pub enum ParseErrorKind {
    #[error("expected an element (like Na) or a particle (like p or e), optionally with a count")]
    ExpectedGroup,

    #[diagnostic(help(
        "a 0 value doesn't make sense here, if you've mistakenly included a leading zero, like \
        NH03, try just NH3 instead"
    ))]
    #[error("counts cannot start with 0")]
    ExpectedNoLeadingZero,

    #[error("expected a number")]
    ExpectedNumber,

    #[diagnostic(help("numbers here can be at most 4294967295"))]
    #[error("the number {0} is too large")]
    NumberTooLarge(String),

    #[error("expected a ':' between the carbon and double-bond counts")]
    ExpectedColon,

    #[diagnostic(help("the known elements are C, H, N, O, P, S, Na, K, and Cl"))]
    #[error("the element {0:?} is not known")]
    UnknownElement(String),

    #[diagnostic(help("use p for a proton or e for an electron"))]
    #[error("the particle {0:?} is not known")]
    UnknownParticle(char),

    #[diagnostic(help("check the unparsed region for errors, or remove it"))]
    #[error("could not interpret the full input")]
    TrailingInput,

    #[diagnostic(help(
        "this is an internal error that you shouldn't ever see! If you have gotten this error, \
        then please report it as a bug!"
    ))]
    #[error("internal `nom` error: {0:?}")]
    NomError(ErrorKind),
}

impl ParseError {
    pub(crate) const fn new(
        input: String,
        target: &'static str,
        span: SourceSpan,
        kind: ParseErrorKind,
    ) -> Self {
        Self {
            input,
            target,
            span,
            kind,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    #[must_use]
    pub const fn span(&self) -> SourceSpan {
        self.span
    }
}

impl ParseErrorKind {
    pub(crate) const fn label(&self) -> &'static str {
        match self {
            Self::ExpectedGroup => "expected a formula or particle",
            Self::ExpectedNoLeadingZero => "expected non-zero",
            Self::ExpectedNumber => "expected a number",
            Self::NumberTooLarge(_) => "number too large",
            Self::ExpectedColon => "expected ':'",
            Self::UnknownElement(_) => "element not found",
            Self::UnknownParticle(_) => "particle not found",
            Self::TrailingInput => "input was valid up until this point",
            Self::NomError(_) => "the region that triggered this bug!",
        }
    }

    /// How many characters of the failing input this error should underline
    pub(crate) fn width(&self) -> usize {
        match self {
            Self::UnknownElement(symbol) | Self::NumberTooLarge(symbol) => symbol.len(),
            Self::UnknownParticle(symbol) => symbol.len_utf8(),
            Self::TrailingInput => 0,
            _ => 1,
        }
    }
}

impl From<ErrorKind> for ParseErrorKind {
    fn from(value: ErrorKind) -> Self {
        match value {
            ErrorKind::Eof => Self::TrailingInput,
            kind => Self::NomError(kind),
        }
    }
}

impl Diagnostic for ParseError {
    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.input)
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.kind.help()
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let label = LabeledSpan::new_with_span(Some(self.kind.label().to_owned()), self.span);
        Some(Box::new(std::iter::once(label)))
    }
}
