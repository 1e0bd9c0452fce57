use std::rc::Rc;

use crate::{
    common::{source::Source, span::Span},
    compiler::{
        error::{Error, Note, TokenizingError},
        token::{Token, TokenType, Tokens, KEYWORDS},
    },
};

/// Whether a byte may appear inside an identifier.
pub fn valid_ident_char(c: u8) -> bool {
    c == b'_' || c.is_ascii_alphanumeric()
}

#[derive(Debug)]
pub struct Lexer {
    source: Rc<Source>,
    index: usize,
    tokens: Tokens,
}

impl Lexer {
    /// Lexes a source file into a stream of tokens.
    /// The stream always ends with a single `End` token
    /// whose start is the length of the source.
    pub fn lex(source: Rc<Source>) -> Result<Tokens, Error> {
        log::debug!(
            "lexing {} ({} bytes)",
            source.path.display(),
            source.len()
        );

        // build a base lexer for this file
        let mut lexer = Lexer {
            source,
            index: 0,
            tokens: vec![],
        };

        // prime the lexer
        lexer.strip();

        // consume all!
        while lexer.index < lexer.source.len() {
            let token = lexer.next_token()?;
            log::trace!("{}", token);
            lexer.index = token.end();
            lexer.tokens.push(token);
            lexer.strip();
        }

        let end = lexer.source.len();
        lexer.tokens.push(Token::new(TokenType::End, end, 0));
        log::debug!("lexed {} tokens", lexer.tokens.len());

        // phew, nothing broke. Your tokens, sir!
        Ok(lexer.tokens)
    }

    fn bytes(&self) -> &[u8] {
        self.source.contents.as_bytes()
    }

    /// The byte `ahead` positions past the current index, if any.
    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes().get(self.index + ahead).copied()
    }

    fn strip(&mut self) {
        while let Some(c) = self.peek(0) {
            if !c.is_ascii_whitespace() {
                break;
            }
            self.index += 1;
        }
    }

    /// Counts how many bytes, starting at the current index,
    /// satisfy `pred`.
    fn take_while(&self, pred: impl Fn(u8) -> bool) -> usize {
        self.bytes()[self.index..]
            .iter()
            .take_while(|c| pred(**c))
            .count()
    }

    /// Picks the two-character form of an operator
    /// when it's followed by `second`.
    fn pair(&self, second: u8, double: TokenType, single: TokenType) -> (TokenType, usize) {
        if self.peek(1) == Some(second) {
            (double, 2)
        } else {
            (single, 1)
        }
    }

    /// `&` and `|` only exist as `&&` and `||`.
    fn digraph(&self, c: u8, kind: TokenType) -> Result<(TokenType, usize), Error> {
        if self.peek(1) == Some(c) {
            return Ok((kind, 2));
        }

        let name = if c == b'&' { "ampersand" } else { "pipe" };
        Err(Error::error_with_note(
            TokenizingError::UnpairedOperator.into(),
            &format!("Singleton {} `{}` found", name, c as char),
            Note::new_with_hint(
                &format!("did you mean `{}{}`?", c as char, c as char),
                &Span::new(&self.source, self.index, 1),
            ),
        ))
    }

    fn ellipsis(&self) -> (TokenType, usize) {
        if self.peek(1) == Some(b'.') && self.peek(2) == Some(b'.') {
            (TokenType::Ellipsis, 3)
        } else {
            (TokenType::Dot, 1)
        }
    }

    /// Consumes from the opening quote through the closing quote.
    fn string(&self) -> Result<(TokenType, usize), Error> {
        match self.bytes()[self.index + 1..].iter().position(|c| *c == b'"') {
            Some(inner) => Ok((TokenType::String, inner + 2)),
            None => Err(Error::error_with_note(
                TokenizingError::UnterminatedLiteral.into(),
                "Unexpected end of source while parsing string literal",
                Note::new_with_hint(
                    "string literal starts here",
                    &Span::new(&self.source, self.index, 1),
                ),
            )),
        }
    }

    /// A quote, exactly one character, and a closing quote.
    fn character(&self) -> Result<(TokenType, usize), Error> {
        let mut remaining = self.source.contents[self.index + 1..].chars();

        if let Some(c) = remaining.next() {
            if remaining.next() == Some('\'') {
                return Ok((TokenType::Char, c.len_utf8() + 2));
            }
        }

        Err(Error::error_with_note(
            TokenizingError::UnterminatedLiteral.into(),
            "Character literal is missing its closing quote",
            Note::new_with_hint(
                "a character literal holds exactly one character, like `'a'`",
                &Span::new(&self.source, self.index, 1),
            ),
        ))
    }

    /// Matches the keyword table first, but only when the keyword
    /// isn't just the start of a longer identifier;
    /// otherwise takes the longest identifier.
    fn identifier(&self) -> (TokenType, usize) {
        let rest = &self.bytes()[self.index..];

        for (name, kind) in KEYWORDS.iter() {
            let boundary = rest.get(name.len()).copied().map_or(true, |c| !valid_ident_char(c));
            if rest.starts_with(name.as_bytes()) && boundary {
                return (*kind, name.len());
            }
        }

        (TokenType::Ident, self.take_while(valid_ident_char))
    }

    /// Parses the next token.
    /// Expects all whitespace to be stripped.
    fn next_token(&self) -> Result<Token, Error> {
        let c = self.bytes()[self.index];

        let (kind, len) = match c {
            b'(' => (TokenType::LeftParen, 1),
            b')' => (TokenType::RightParen, 1),
            b'{' => (TokenType::LeftBrace, 1),
            b'}' => (TokenType::RightBrace, 1),
            b',' => (TokenType::Comma, 1),
            b';' => (TokenType::Semicolon, 1),
            b':' => (TokenType::Colon, 1),
            b'-' => (TokenType::Minus, 1),
            b'+' => (TokenType::Plus, 1),
            b'*' => (TokenType::Star, 1),
            b'/' => (TokenType::Slash, 1),
            b'.' => self.ellipsis(),

            // two-character forms win whenever they match
            b'!' => self.pair(b'=', TokenType::BangEq, TokenType::Bang),
            b'=' => self.pair(b'=', TokenType::EqualEq, TokenType::Equal),
            b'>' => self.pair(b'=', TokenType::GreaterEq, TokenType::Greater),
            b'<' => self.pair(b'=', TokenType::LessEq, TokenType::Less),
            b'&' => self.digraph(b'&', TokenType::And)?,
            b'|' => self.digraph(b'|', TokenType::Or)?,

            b'"' => self.string()?,
            b'\'' => self.character()?,

            b'0'..=b'9' => (TokenType::Number, self.take_while(|n| n.is_ascii_digit())),
            c if c == b'_' || c.is_ascii_alphabetic() => self.identifier(),

            // Unrecognized char
            _ => {
                let unknown = self.source.contents[self.index..]
                    .chars()
                    .next()
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                return Err(Error::tokenizing(
                    TokenizingError::UnrecognizedCharacter,
                    &format!(
                        "Hmm... The character `{}` is not recognized in this context - check for encoding issues or typos",
                        unknown,
                    ),
                    &Span::new(&self.source, self.index, unknown.len_utf8()),
                ));
            },
        };

        Ok(Token::new(kind, self.index, len))
    }
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;

    use super::*;
    use crate::compiler::error::ErrorKind;

    fn lex(source: &str) -> Result<Tokens, Error> {
        Lexer::lex(Source::source(source))
    }

    fn kinds(source: &str) -> Vec<TokenType> {
        lex(source).unwrap().iter().map(|t| t.kind).collect()
    }

    fn failure(source: &str) -> ErrorKind {
        lex(source).unwrap_err().kind
    }

    proptest! {
        #[test]
        fn doesnt_crash(s in "\\PC*") {
            let result = lex(&s);
            format!("{:?}", result);
        }

        #[test]
        fn end_is_last(s in "[a-z0-9 (){};,.+*/=!<>-]*") {
            let tokens = lex(&s).unwrap();
            let last = tokens.last().unwrap();
            prop_assert_eq!(last.kind, TokenType::End);
            prop_assert_eq!(last.start, s.len());
            prop_assert_eq!(
                tokens.iter().filter(|t| t.kind == TokenType::End).count(),
                1
            );
        }

        #[test]
        fn tokens_stay_in_bounds(s in "\\PC*") {
            if let Ok(tokens) = lex(&s) {
                for token in tokens {
                    prop_assert!(token.end() <= s.len());
                }
            }
        }

        #[test]
        fn slices_reproduce_lexemes(pieces in prop::collection::vec(
            prop_oneof![
                "[a-z_][a-z0-9_]{0,8}",
                "[0-9]{1,5}",
                "\"[a-z ]{0,6}\"",
                "'[a-z]'",
                Just("&&".to_string()),
                Just("||".to_string()),
                Just("...".to_string()),
                Just("!=".to_string()),
                Just("==".to_string()),
                Just("<=".to_string()),
                Just(">=".to_string()),
                Just("(".to_string()),
                Just("}".to_string()),
                Just(";".to_string()),
            ],
            0..16,
        )) {
            let source = pieces.join(" ");
            let tokens = lex(&source).unwrap();
            prop_assert_eq!(tokens.len(), pieces.len() + 1);
            for (token, piece) in tokens.iter().zip(pieces.iter()) {
                prop_assert_eq!(token.lexeme(&source), piece.as_str());
            }
        }

        #[test]
        fn numbers(s in "[0-9]{1,12}") {
            let tokens = lex(&s).unwrap();
            prop_assert_eq!(tokens[0].kind, TokenType::Number);
            prop_assert_eq!(tokens[0].len, s.len());
        }
    }

    #[test]
    fn keyword_prefix_is_an_identifier() {
        let tokens = lex("returnValue").unwrap();
        assert_eq!(tokens[0], Token::new(TokenType::Ident, 0, 11));
        assert_eq!(tokens[1], Token::new(TokenType::End, 11, 0));
    }

    #[test]
    fn nil_keyword() {
        let tokens = lex("nil").unwrap();
        assert_eq!(tokens[0], Token::new(TokenType::Nil, 0, 3));
    }

    #[test]
    fn return_then_punctuation() {
        assert_eq!(
            kinds("return;"),
            vec![TokenType::Return, TokenType::Semicolon, TokenType::End]
        );
        assert_eq!(kinds("return_")[0], TokenType::Ident);
    }

    #[test]
    fn function() {
        assert_eq!(
            kinds("func add(a, b) { return 4; }"),
            vec![
                TokenType::Func,
                TokenType::Ident,
                TokenType::LeftParen,
                TokenType::Ident,
                TokenType::Comma,
                TokenType::Ident,
                TokenType::RightParen,
                TokenType::LeftBrace,
                TokenType::Return,
                TokenType::Number,
                TokenType::Semicolon,
                TokenType::RightBrace,
                TokenType::End,
            ]
        );
    }

    #[test]
    fn two_character_operators() {
        let source = "a != b == c <= d >= e && f || g";
        let tokens = lex(source).unwrap();
        let ops: Vec<_> = tokens
            .iter()
            .filter(|t| t.kind != TokenType::Ident && t.kind != TokenType::End)
            .map(|t| (t.kind, t.len))
            .collect();
        assert_eq!(
            ops,
            vec![
                (TokenType::BangEq, 2),
                (TokenType::EqualEq, 2),
                (TokenType::LessEq, 2),
                (TokenType::GreaterEq, 2),
                (TokenType::And, 2),
                (TokenType::Or, 2),
            ]
        );
        assert_eq!(tokens[1].start, 2);
    }

    #[test]
    fn single_character_operators() {
        assert_eq!(
            kinds("! = < > - + * /"),
            vec![
                TokenType::Bang,
                TokenType::Equal,
                TokenType::Less,
                TokenType::Greater,
                TokenType::Minus,
                TokenType::Plus,
                TokenType::Star,
                TokenType::Slash,
                TokenType::End,
            ]
        );
    }

    #[test]
    fn ellipsis_and_dots() {
        assert_eq!(
            kinds("... .. ."),
            vec![
                TokenType::Ellipsis,
                TokenType::Dot,
                TokenType::Dot,
                TokenType::Dot,
                TokenType::End,
            ]
        );
    }

    #[test]
    fn string_literal() {
        let tokens = lex("\"hello world\"").unwrap();
        assert_eq!(tokens[0], Token::new(TokenType::String, 0, 13));
    }

    #[test]
    fn char_literal() {
        let tokens = lex("'a' 'é'").unwrap();
        assert_eq!(tokens[0], Token::new(TokenType::Char, 0, 3));
        assert_eq!(tokens[1].kind, TokenType::Char);
        assert_eq!(tokens[1].lexeme("'a' 'é'"), "'é'");
    }

    #[test]
    fn lone_ampersand() {
        assert_eq!(
            failure("a & b"),
            ErrorKind::Tokenizing(TokenizingError::UnpairedOperator)
        );
        assert_eq!(
            failure("&&&"),
            ErrorKind::Tokenizing(TokenizingError::UnpairedOperator)
        );
    }

    #[test]
    fn lone_pipe() {
        assert_eq!(
            failure("a |"),
            ErrorKind::Tokenizing(TokenizingError::UnpairedOperator)
        );
    }

    #[test]
    fn unclosed_string() {
        assert_eq!(
            failure("\"asdf\"\"qwerty"),
            ErrorKind::Tokenizing(TokenizingError::UnterminatedLiteral)
        );
    }

    #[test]
    fn unclosed_char() {
        assert_eq!(
            failure("'ab'"),
            ErrorKind::Tokenizing(TokenizingError::UnterminatedLiteral)
        );
        assert_eq!(
            failure("'a"),
            ErrorKind::Tokenizing(TokenizingError::UnterminatedLiteral)
        );
    }

    #[test]
    fn unrecognized() {
        assert_eq!(
            failure("func f() { return 4 @ 2; }"),
            ErrorKind::Tokenizing(TokenizingError::UnrecognizedCharacter)
        );
        assert_eq!(
            failure("λ"),
            ErrorKind::Tokenizing(TokenizingError::UnrecognizedCharacter)
        );
    }

    #[test]
    fn valid_ident_chars() {
        assert!(valid_ident_char(b'_'));
        assert!(valid_ident_char(b'e'));
        assert!(valid_ident_char(b'J'));
        assert!(valid_ident_char(b'4'));
        assert!(!valid_ident_char(b'!'));
        assert!(!valid_ident_char(b':'));
    }

    #[test]
    fn new_empty() {
        let tokens = lex("").unwrap();
        assert_eq!(tokens, vec![Token::new(TokenType::End, 0, 0)]);

        let tokens = lex("  \n\t ").unwrap();
        assert_eq!(tokens, vec![Token::new(TokenType::End, 5, 0)]);
    }
}
