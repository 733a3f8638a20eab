use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

/// Errors reported by strict parsing
///
/// Lenient parsing never fails; these only surface from
/// [`parse_strict`](crate::parse_strict).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected closing tag </{tag}> at {pos}")]
    UnexpectedClose { pos: usize, tag: String },

    #[error("Unclosed element <{tag}> opened at {pos}")]
    Unclosed { pos: usize, tag: String },

    #[error("Invalid syntax at {pos}: {message}")]
    InvalidSyntax { pos: usize, message: String },
}

impl ParseError {
    pub fn unexpected_close(pos: usize, tag: impl Into<String>) -> Self {
        Self::UnexpectedClose {
            pos,
            tag: tag.into(),
        }
    }

    pub fn unclosed(pos: usize, tag: impl Into<String>) -> Self {
        Self::Unclosed {
            pos,
            tag: tag.into(),
        }
    }

    pub fn invalid_syntax(pos: usize, message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            pos,
            message: message.into(),
        }
    }

    /// Byte offset in the source where the problem was detected
    pub fn pos(&self) -> usize {
        match self {
            Self::UnexpectedClose { pos, .. }
            | Self::Unclosed { pos, .. }
            | Self::InvalidSyntax { pos, .. } => *pos,
        }
    }
}
