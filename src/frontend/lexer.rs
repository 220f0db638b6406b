use crate::frontend::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
}

#[derive(Debug)]
pub struct LexerError {
    pub message: String,
    pub line: usize,
    pub col: usize,
}

impl std::fmt::Display for LexerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.col, self.message)
    }
}

impl std::error::Error for LexerError {}

/// Tokenizer for program listings.
///
/// Listings are line oriented, so newlines are tokens. `;` starts a comment
/// running to the end of the line.
pub struct Lexer {
    source: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Lexer {
            source: source.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
        }
    }

    fn current(&self) -> Option<char> {
        self.source.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.source.get(self.pos + 1).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.current();
        if ch == Some('\n') {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        self.pos += 1;
        ch
    }

    fn span(&self) -> Span {
        Span {
            line: self.line,
            col: self.col,
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current() {
            if ch == ' ' || ch == '\t' || ch == '\r' || ch == ',' {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_comment(&mut self) -> Token {
        self.advance();
        let mut comment = String::new();
        while let Some(ch) = self.current() {
            if ch == '\n' {
                break;
            }
            comment.push(ch);
            self.advance();
        }
        Token::Comment(comment.trim().to_string())
    }

    fn read_number(&mut self) -> Result<Token, LexerError> {
        let start = self.span();
        let error = |message: String| LexerError {
            message,
            line: start.line,
            col: start.col,
        };

        // The sign stays in the digit string so i64::MIN parses.
        let mut digits = String::new();
        if self.current() == Some('-') {
            digits.push('-');
            self.advance();
        }

        let radix = if self.current() == Some('0') && matches!(self.peek(), Some('x' | 'X')) {
            self.advance();
            self.advance();
            16
        } else {
            10
        };

        let sign_len = digits.len();
        while let Some(ch) = self.current() {
            if ch.is_digit(radix) {
                digits.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if digits.len() == sign_len {
            return Err(error(if radix == 16 {
                "expected hex digits after 0x".to_string()
            } else {
                "expected digits".to_string()
            }));
        }
        if let Some(ch) = self.current().filter(|c| c.is_alphanumeric() || *c == '_') {
            return Err(error(format!("invalid digit '{}' in number", ch)));
        }

        i64::from_str_radix(&digits, radix)
            .map(Token::Integer)
            .map_err(|_| error(format!("integer out of range: {}", digits)))
    }

    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();
        while let Some(ch) = self.current() {
            if ch.is_alphanumeric() || ch == '_' || ch == '.' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        Token::Ident(ident)
    }

    pub fn tokenize(&mut self) -> Result<Vec<Spanned>, LexerError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace();
            let span = self.span();

            match self.current() {
                None => {
                    tokens.push(Spanned {
                        token: Token::Eof,
                        span,
                    });
                    break;
                }
                Some('\n') => {
                    tokens.push(Spanned {
                        token: Token::Newline,
                        span,
                    });
                    self.advance();
                }
                Some(';') | Some('#') => {
                    let token = self.read_comment();
                    tokens.push(Spanned { token, span });
                }
                Some(':') => {
                    self.advance();
                    tokens.push(Spanned {
                        token: Token::Colon,
                        span,
                    });
                }
                Some('-') if self.peek().map(|c| c.is_ascii_digit()).unwrap_or(false) => {
                    let token = self.read_number()?;
                    tokens.push(Spanned { token, span });
                }
                Some(ch) if ch.is_ascii_digit() => {
                    let token = self.read_number()?;
                    tokens.push(Spanned { token, span });
                }
                Some(ch) if ch.is_alphabetic() || ch == '_' || ch == '.' => {
                    let token = self.read_identifier();
                    tokens.push(Spanned { token, span });
                }
                Some(ch) => {
                    return Err(LexerError {
                        message: format!("unexpected character: '{}'", ch),
                        line: self.line,
                        col: self.col,
                    });
                }
            }
        }

        Ok(tokens)
    }
}
