use std::collections::{BTreeMap, HashMap};

use crate::bytecode::{Op, Program, Reg};
use crate::frontend::lexer::{Span, Spanned};
use crate::frontend::parser_error::ParserError;
use crate::frontend::token::Token;

/// A jump whose label is resolved after the whole listing is read.
struct Fixup {
    ip: usize,
    label: String,
    span: Span,
}

/// Parser for program listings.
///
/// One instruction per line, optionally preceded by any number of
/// `name:` labels. Jumps name labels; they are resolved to instruction
/// indices once every label is known, so forward jumps work.
pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    /// Span of the most recently consumed token.
    last_span: Option<Span>,

    ops: Vec<Op>,
    labels: HashMap<String, usize>,
    fixups: Vec<Fixup>,
}

impl Parser {
    /// Creates a new parser from lexer output. Comments are dropped;
    /// newlines are kept because they end instructions.
    pub fn new(tokens: Vec<Spanned>) -> Self {
        let tokens: Vec<Spanned> = tokens
            .into_iter()
            .filter(|t| !matches!(t.token, Token::Comment(_)))
            .collect();
        Parser {
            tokens,
            pos: 0,
            last_span: None,
            ops: Vec::new(),
            labels: HashMap::new(),
            fixups: Vec::new(),
        }
    }

    fn current(&self) -> Option<&Spanned> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let token = self.tokens.get(self.pos).cloned();
        if let Some(s) = &token {
            self.last_span = Some(s.span);
        }
        self.pos += 1;
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.current().map(|s| &s.token)
    }

    fn peek_next(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1).map(|s| &s.token)
    }

    fn error_at(span: Span, message: impl Into<String>) -> ParserError {
        ParserError {
            message: message.into(),
            line: span.line,
            col: span.col,
        }
    }

    /// Error at the current token, else the last consumed one, else 1:1.
    fn error(&self, message: impl Into<String>) -> ParserError {
        let span = self
            .current()
            .map(|s| s.span)
            .or(self.last_span)
            .unwrap_or(Span { line: 1, col: 1 });
        Self::error_at(span, message)
    }

    /// Parses the whole listing into a resolved program.
    pub fn parse(mut self) -> Result<Program, ParserError> {
        while let Some(token) = self.peek() {
            match token {
                Token::Eof => break,
                Token::Newline => {
                    self.advance();
                }
                Token::Ident(_) if self.peek_next() == Some(&Token::Colon) => {
                    self.parse_label()?;
                }
                Token::Ident(_) => {
                    let op = self.parse_instruction()?;
                    self.ops.push(op);
                    self.expect_line_end()?;
                }
                other => {
                    let message = format!("expected instruction or label, found {}", other);
                    return Err(self.error(message));
                }
            }
        }
        self.resolve()
    }

    fn parse_label(&mut self) -> Result<(), ParserError> {
        let Some(Spanned {
            token: Token::Ident(name),
            span,
        }) = self.advance()
        else {
            return Err(self.error("expected label name"));
        };
        self.advance(); // ':'

        if self.labels.insert(name.clone(), self.ops.len()).is_some() {
            return Err(Self::error_at(
                span,
                format!("label '{}' defined more than once", name),
            ));
        }
        Ok(())
    }

    fn expect_line_end(&mut self) -> Result<(), ParserError> {
        match self.peek() {
            Some(Token::Newline) => {
                self.advance();
                Ok(())
            }
            Some(Token::Eof) | None => Ok(()),
            Some(other) => {
                let message = format!("unexpected {} after instruction", other);
                Err(self.error(message))
            }
        }
    }

    fn parse_instruction(&mut self) -> Result<Op, ParserError> {
        let Some(Spanned {
            token: Token::Ident(mnemonic),
            span,
        }) = self.advance()
        else {
            return Err(self.error("expected instruction"));
        };

        let op = match mnemonic.to_ascii_lowercase().as_str() {
            "nop" => Op::Nop,
            "halt" => Op::Halt,

            "add" => Op::Add,
            "sub" => Op::Sub,
            "mul" => Op::Mul,
            "div" => Op::Div,
            "rem" | "mod" => Op::Rem,
            "cmp" | "compare" => Op::Compare,

            "select" => Op::Select(self.parse_bank()?),
            "pop" => Op::Pop(self.parse_reg()?),
            "push" => match self.peek() {
                Some(Token::Integer(_)) => Op::PushConst(self.parse_integer()?),
                _ => Op::Push(self.parse_reg()?),
            },
            "push_front" => Op::PushFront(self.parse_reg()?),
            "push_to" => {
                let reg = self.parse_reg()?;
                let bank = self.parse_bank()?;
                Op::PushTo { reg, bank }
            }
            "dup" => Op::Dup,
            "swap" => Op::Swap,
            "drop" => Op::Drop,

            "print_dec" => Op::PrintDecimal,
            "print_char" => Op::PrintChar,
            "read_dec" => Op::ReadDecimal,
            "read_char" => Op::ReadChar,

            "jmp" => {
                self.parse_target()?;
                Op::Jump(0)
            }
            "jnz" => {
                self.parse_target()?;
                Op::JumpIfNonZero(0)
            }
            "jlt" => {
                let min = self.parse_count()?;
                self.parse_target()?;
                Op::JumpIfSizeBelow { min, target: 0 }
            }
            "jge" => {
                let min = self.parse_count()?;
                self.parse_target()?;
                Op::JumpIfSizeAtLeast { min, target: 0 }
            }

            _ => {
                return Err(Self::error_at(
                    span,
                    format!("unknown instruction '{}'", mnemonic),
                ));
            }
        };
        Ok(op)
    }

    fn parse_reg(&mut self) -> Result<Reg, ParserError> {
        match self.peek() {
            Some(Token::Ident(name)) if name.eq_ignore_ascii_case("a") => {
                self.advance();
                Ok(Reg::A)
            }
            Some(Token::Ident(name)) if name.eq_ignore_ascii_case("b") => {
                self.advance();
                Ok(Reg::B)
            }
            Some(other) => {
                let message = format!("expected register a or b, found {}", other);
                Err(self.error(message))
            }
            None => Err(self.error("expected register a or b")),
        }
    }

    fn parse_integer(&mut self) -> Result<i64, ParserError> {
        match self.peek() {
            Some(&Token::Integer(n)) => {
                self.advance();
                Ok(n)
            }
            Some(other) => {
                let message = format!("expected integer, found {}", other);
                Err(self.error(message))
            }
            None => Err(self.error("expected integer")),
        }
    }

    fn parse_bank(&mut self) -> Result<u32, ParserError> {
        let n = self.parse_integer()?;
        u32::try_from(n)
            .map_err(|_| self.error_prev(format!("bank number {} is negative or too large", n)))
    }

    fn parse_count(&mut self) -> Result<usize, ParserError> {
        let n = self.parse_integer()?;
        usize::try_from(n)
            .map_err(|_| self.error_prev(format!("size threshold {} is negative", n)))
    }

    /// Error at the token just consumed.
    fn error_prev(&self, message: String) -> ParserError {
        Self::error_at(self.last_span.unwrap_or(Span { line: 1, col: 1 }), message)
    }

    /// Records a fixup for the jump about to be pushed at `self.ops.len()`.
    fn parse_target(&mut self) -> Result<(), ParserError> {
        match self.peek() {
            Some(Token::Ident(_)) => {
                if let Some(Spanned {
                    token: Token::Ident(label),
                    span,
                }) = self.advance()
                {
                    self.fixups.push(Fixup {
                        ip: self.ops.len(),
                        label,
                        span,
                    });
                }
                Ok(())
            }
            Some(other) => {
                let message = format!("expected label, found {}", other);
                Err(self.error(message))
            }
            None => Err(self.error("expected label")),
        }
    }

    fn resolve(mut self) -> Result<Program, ParserError> {
        for fixup in &self.fixups {
            let Some(&target) = self.labels.get(&fixup.label) else {
                return Err(Self::error_at(
                    fixup.span,
                    format!("undefined label '{}'", fixup.label),
                ));
            };
            match &mut self.ops[fixup.ip] {
                Op::Jump(t) | Op::JumpIfNonZero(t) => *t = target,
                Op::JumpIfSizeBelow { target: t, .. } | Op::JumpIfSizeAtLeast { target: t, .. } => {
                    *t = target
                }
                _ => {}
            }
        }

        // Several names on one instruction: keep the alphabetically first.
        let mut labels = BTreeMap::new();
        let mut named: Vec<_> = self.labels.into_iter().collect();
        named.sort();
        for (name, ip) in named {
            labels.entry(ip).or_insert(name);
        }

        Ok(Program {
            ops: self.ops,
            labels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;

    fn parse(source: &str) -> Result<Program, ParserError> {
        let tokens = Lexer::new(source).tokenize().unwrap();
        Parser::new(tokens).parse()
    }

    fn ops(source: &str) -> Vec<Op> {
        parse(source).unwrap().ops
    }

    #[test]
    fn test_straight_line() {
        assert_eq!(
            ops("read_dec\npush a\npop b\nadd\nprint_dec\nhalt"),
            vec![
                Op::ReadDecimal,
                Op::Push(Reg::A),
                Op::Pop(Reg::B),
                Op::Add,
                Op::PrintDecimal,
                Op::Halt,
            ]
        );
    }

    #[test]
    fn test_operands() {
        assert_eq!(
            ops("SELECT 21\npush -3\npush_front B\npush_to a 4\njlt 2 end\nend: halt"),
            vec![
                Op::Select(21),
                Op::PushConst(-3),
                Op::PushFront(Reg::B),
                Op::PushTo {
                    reg: Reg::A,
                    bank: 4
                },
                Op::JumpIfSizeBelow { min: 2, target: 5 },
                Op::Halt,
            ]
        );
    }

    #[test]
    fn test_forward_and_backward_labels() {
        let program =
            parse("top:\n  read_dec\n  jnz top\n  jmp out\n  nop\nout:\n  halt\n").unwrap();
        assert_eq!(
            program.ops,
            vec![
                Op::ReadDecimal,
                Op::JumpIfNonZero(0),
                Op::Jump(4),
                Op::Nop,
                Op::Halt,
            ]
        );
        assert_eq!(program.labels.get(&0).map(String::as_str), Some("top"));
        assert_eq!(program.labels.get(&4).map(String::as_str), Some("out"));
    }

    #[test]
    fn test_undefined_label() {
        let err = parse("halt\njmp nowhere").unwrap_err();
        assert_eq!((err.line, err.col), (2, 5));
        assert!(err.message.contains("undefined label 'nowhere'"));
    }

    #[test]
    fn test_duplicate_label() {
        let err = parse("x: nop\nx: halt").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("more than once"));
    }

    #[test]
    fn test_unknown_instruction() {
        let err = parse("nop\n  frobnicate").unwrap_err();
        assert_eq!(err.to_string(), "2:3: unknown instruction 'frobnicate'");
    }

    #[test]
    fn test_missing_operand() {
        let err = parse("pop").unwrap_err();
        assert!(err.message.contains("expected register"));
        let err = parse("jlt done").unwrap_err();
        assert!(err.message.contains("expected integer"));
    }

    #[test]
    fn test_trailing_garbage() {
        let err = parse("add 3").unwrap_err();
        assert!(err.message.contains("after instruction"));
    }

    #[test]
    fn test_negative_bank() {
        let err = parse("select -1").unwrap_err();
        assert!(err.message.contains("negative"));
    }
}
