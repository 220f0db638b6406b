#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    Integer(i64),

    // Mnemonic, register name or label name
    Ident(String),

    // `label:`
    Colon,

    Comment(String),
    Newline,
    Eof,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Integer(n) => write!(f, "integer {}", n),
            Token::Ident(name) => write!(f, "'{}'", name),
            Token::Colon => write!(f, "':'"),
            Token::Comment(_) => write!(f, "comment"),
            Token::Newline => write!(f, "end of line"),
            Token::Eof => write!(f, "end of file"),
        }
    }
}
