use logos::Logos;
use std::fmt;
use std::ops::Range;

/// Token types for serialized rich content
///
/// Tags are matched whole; their name and attributes are decoded by the
/// parser. A `<` that does not start a well-formed tag lexes as [`Token::Lt`]
/// and is treated as literal text.
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token<'src> {
    #[regex(
        r#"<[a-zA-Z][a-zA-Z0-9-]*([ \t\r\n]+[a-zA-Z_:][a-zA-Z0-9_:.-]*([ \t\r\n]*=[ \t\r\n]*("[^"]*"|'[^']*'|[^ \t\r\n"'=<>`/]+))?)*[ \t\r\n]*/?>"#,
        |lex| lex.slice()
    )]
    OpenTag(&'src str),

    #[regex(r"</[a-zA-Z][a-zA-Z0-9-]*[ \t\r\n]*>", |lex| lex.slice())]
    CloseTag(&'src str),

    #[regex(r"[^<]+", |lex| lex.slice())]
    Text(&'src str),

    #[token("<")]
    Lt,
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::OpenTag(s) => write!(f, "open tag {}", s),
            Token::CloseTag(s) => write!(f, "close tag {}", s),
            Token::Text(s) => write!(f, "text {:?}", s),
            Token::Lt => write!(f, "<"),
        }
    }
}

/// Tokenize a markup string
///
/// Every byte of `source` ends up in some token. A `<` that begins a tag the
/// lexer cannot finish (`a<b c`, `<a href="x`) becomes [`Token::Lt`] and
/// lexing restarts right after it, so the rest is kept as text or tags.
pub fn tokenize(source: &str) -> Vec<(Token<'_>, Range<usize>)> {
    let mut tokens = Vec::new();
    let mut offset = 0;

    'restart: while offset < source.len() {
        let mut lexer = Token::lexer(&source[offset..]);
        while let Some(result) = lexer.next() {
            let span = lexer.span().start + offset..lexer.span().end + offset;
            match result {
                Ok(token) => tokens.push((token, span)),
                Err(()) if source[span.clone()].starts_with('<') => {
                    tokens.push((Token::Lt, span.start..span.start + 1));
                    offset = span.start + 1;
                    continue 'restart;
                }
                Err(()) => tokens.push((Token::Text(&source[span.clone()]), span)),
            }
        }
        break;
    }

    tokens
}

/// Name and raw attribute slice of an open tag, plus whether it self-closes
#[derive(Debug, Clone, PartialEq)]
pub struct OpenTagParts<'src> {
    pub name: &'src str,
    pub attributes: Vec<(&'src str, &'src str)>,
    pub self_closing: bool,
}

/// Split an `OpenTag` slice (e.g. `<img src="a.png" />`) into its parts.
///
/// Attribute values are returned raw (quotes stripped, entities still encoded).
pub fn split_open_tag(slice: &str) -> OpenTagParts<'_> {
    let inner = slice.trim_start_matches('<').trim_end_matches('>');
    let (inner, self_closing) = match inner.strip_suffix('/') {
        Some(rest) => (rest, true),
        None => (inner, false),
    };

    let name_end = inner
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(inner.len());
    let name = &inner[..name_end];
    let mut rest = &inner[name_end..];
    let mut attributes = Vec::new();

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }

        let key_end = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '=')
            .unwrap_or(rest.len());
        let key = &rest[..key_end];
        rest = rest[key_end..].trim_start();

        if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (value, remaining) = match after_eq.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let body = &after_eq[1..];
                    let end = body.find(quote).unwrap_or(body.len());
                    (&body[..end], body.get(end + 1..).unwrap_or(""))
                }
                _ => {
                    let end = after_eq
                        .find(|c: char| c.is_ascii_whitespace())
                        .unwrap_or(after_eq.len());
                    (&after_eq[..end], &after_eq[end..])
                }
            };
            attributes.push((key, value));
            rest = remaining;
        } else {
            attributes.push((key, ""));
        }
    }

    OpenTagParts {
        name,
        attributes,
        self_closing,
    }
}

/// Tag name of a `CloseTag` slice (e.g. `</p >` → `p`)
pub fn close_tag_name(slice: &str) -> &str {
    slice
        .trim_start_matches("</")
        .trim_end_matches('>')
        .trim_end()
}
