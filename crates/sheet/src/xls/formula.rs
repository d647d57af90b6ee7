//! Compiles formula text into BIFF8 parsed-expression tokens (`rgce`).
//!
//! Expressions are parsed with the usual spreadsheet precedence and emitted
//! in reverse Polish order. Only references on the formula's own sheet and
//! a table of common built-in functions can be encoded.

use crate::coord::{parse_reference, CellReference};
use crate::error::{Result, SheetError};

const PTG_ADD: u8 = 0x03;
const PTG_SUB: u8 = 0x04;
const PTG_MUL: u8 = 0x05;
const PTG_DIV: u8 = 0x06;
const PTG_POWER: u8 = 0x07;
const PTG_CONCAT: u8 = 0x08;
const PTG_LT: u8 = 0x09;
const PTG_LE: u8 = 0x0A;
const PTG_EQ: u8 = 0x0B;
const PTG_GE: u8 = 0x0C;
const PTG_GT: u8 = 0x0D;
const PTG_NE: u8 = 0x0E;
const PTG_UPLUS: u8 = 0x12;
const PTG_UMINUS: u8 = 0x13;
const PTG_PERCENT: u8 = 0x14;
const PTG_PAREN: u8 = 0x15;
const PTG_STR: u8 = 0x17;
const PTG_ERR: u8 = 0x1C;
const PTG_BOOL: u8 = 0x1D;
const PTG_INT: u8 = 0x1E;
const PTG_NUM: u8 = 0x1F;
// Reference class (function arguments) and value class operands
const PTG_REF: u8 = 0x24;
const PTG_AREA: u8 = 0x25;
const PTG_REF_V: u8 = 0x44;
const PTG_AREA_V: u8 = 0x45;
const PTG_FUNC_V: u8 = 0x41;
const PTG_FUNC_VAR_V: u8 = 0x42;

const MAX_ROW: usize = 0xFFFF;
const MAX_COL: usize = 0xFF;
const COL_RELATIVE: u16 = 0x4000;
const ROW_RELATIVE: u16 = 0x8000;

/// Largest token stream a FORMULA record can carry next to its fixed fields.
pub(crate) const MAX_RGCE_LEN: usize = super::records::MAX_RECORD_DATA - 22;

/// Compile a formula body (no leading `=`) into `rgce` bytes
pub fn compile(formula: &str) -> Result<Vec<u8>> {
    let invalid = |reason: String| SheetError::InvalidFormula {
        formula: formula.to_string(),
        reason,
    };

    let expr = parse(formula).map_err(invalid)?;
    let mut rgce = Vec::new();
    emit(&expr, false, &mut rgce).map_err(invalid)?;

    if rgce.len() > MAX_RGCE_LEN {
        return Err(invalid(format!(
            "encoded formula is {} bytes, limit is {MAX_RGCE_LEN}",
            rgce.len()
        )));
    }
    Ok(rgce)
}

type ParseResult<T> = std::result::Result<T, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    Fixed(u8),
    Variable { min: u8, max: u8 },
}

#[derive(Debug, PartialEq)]
struct Function {
    name: &'static str,
    index: u16,
    arity: Arity,
}

const fn fixed(name: &'static str, index: u16, argc: u8) -> Function {
    Function {
        name,
        index,
        arity: Arity::Fixed(argc),
    }
}

const fn variable(name: &'static str, index: u16, min: u8, max: u8) -> Function {
    Function {
        name,
        index,
        arity: Arity::Variable { min, max },
    }
}

/// Built-in functions by their BIFF function-table index.
const FUNCTIONS: &[Function] = &[
    variable("COUNT", 0, 1, 30),
    variable("IF", 1, 2, 3),
    variable("SUM", 4, 1, 30),
    variable("AVERAGE", 5, 1, 30),
    variable("MIN", 6, 1, 30),
    variable("MAX", 7, 1, 30),
    fixed("PI", 19, 0),
    fixed("SQRT", 20, 1),
    fixed("EXP", 21, 1),
    fixed("LN", 22, 1),
    fixed("LOG10", 23, 1),
    fixed("ABS", 24, 1),
    fixed("INT", 25, 1),
    fixed("ROUND", 27, 2),
    variable("INDEX", 29, 2, 4),
    fixed("MID", 31, 3),
    fixed("LEN", 32, 1),
    fixed("VALUE", 33, 1),
    variable("AND", 36, 1, 30),
    variable("OR", 37, 1, 30),
    fixed("NOT", 38, 1),
    fixed("MOD", 39, 2),
    fixed("TEXT", 48, 2),
    variable("MATCH", 64, 2, 3),
    fixed("NOW", 74, 0),
    variable("HLOOKUP", 101, 3, 4),
    variable("VLOOKUP", 102, 3, 4),
    fixed("LOWER", 112, 1),
    fixed("UPPER", 113, 1),
    variable("LEFT", 115, 1, 2),
    variable("RIGHT", 116, 1, 2),
    fixed("TRIM", 118, 1),
    fixed("ISBLANK", 129, 1),
    variable("COUNTA", 169, 1, 30),
    variable("PRODUCT", 183, 1, 30),
    fixed("ROUNDUP", 212, 2),
    fixed("ROUNDDOWN", 213, 2),
    fixed("TODAY", 221, 0),
    variable("MEDIAN", 227, 1, 30),
    variable("CONCATENATE", 336, 1, 30),
    fixed("POWER", 337, 2),
    variable("SUMIF", 345, 2, 3),
    fixed("COUNTIF", 346, 2),
];

fn lookup_function(name: &str) -> Option<&'static Function> {
    FUNCTIONS.iter().find(|f| f.name.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Power,
    Concat,
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
}

impl BinaryOp {
    fn ptg(self) -> u8 {
        match self {
            BinaryOp::Add => PTG_ADD,
            BinaryOp::Sub => PTG_SUB,
            BinaryOp::Mul => PTG_MUL,
            BinaryOp::Div => PTG_DIV,
            BinaryOp::Power => PTG_POWER,
            BinaryOp::Concat => PTG_CONCAT,
            BinaryOp::Lt => PTG_LT,
            BinaryOp::Le => PTG_LE,
            BinaryOp::Eq => PTG_EQ,
            BinaryOp::Ge => PTG_GE,
            BinaryOp::Gt => PTG_GT,
            BinaryOp::Ne => PTG_NE,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Number(f64),
    Text(String),
    Bool(bool),
    Error(u8),
    Ref(CellReference),
    Area(CellReference, CellReference),
    Negate(Box<Expr>),
    Plus(Box<Expr>),
    Percent(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Paren(Box<Expr>),
    Call(&'static Function, Vec<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Text(String),
    Error(u8),
    Word(String),
    LParen,
    RParen,
    Comma,
    Colon,
    Bang,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Ampersand,
    Percent,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Eof,
}

fn error_code(literal: &str) -> Option<u8> {
    match literal.to_ascii_uppercase().as_str() {
        "#NULL!" => Some(0x00),
        "#DIV/0!" => Some(0x07),
        "#VALUE!" => Some(0x0F),
        "#REF!" => Some(0x17),
        "#NAME?" => Some(0x1D),
        "#NUM!" => Some(0x24),
        "#N/A" => Some(0x2A),
        _ => None,
    }
}

struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    fn new(input: &str) -> Self {
        Lexer {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn tokenize(mut self) -> ParseResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn next_token(&mut self) -> ParseResult<Token> {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        let Some(ch) = self.peek() else {
            return Ok(Token::Eof);
        };

        let token = match ch {
            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            ',' => self.single(Token::Comma),
            ':' => self.single(Token::Colon),
            '!' => self.single(Token::Bang),
            '+' => self.single(Token::Plus),
            '-' => self.single(Token::Minus),
            '*' => self.single(Token::Star),
            '/' => self.single(Token::Slash),
            '^' => self.single(Token::Caret),
            '&' => self.single(Token::Ampersand),
            '%' => self.single(Token::Percent),
            '=' => self.single(Token::Equal),
            '<' => {
                self.pos += 1;
                if self.consume('=') {
                    Token::LessEqual
                } else if self.consume('>') {
                    Token::NotEqual
                } else {
                    Token::Less
                }
            }
            '>' => {
                self.pos += 1;
                if self.consume('=') {
                    Token::GreaterEqual
                } else {
                    Token::Greater
                }
            }
            '"' => self.text()?,
            '#' => self.error_literal()?,
            '\'' => return Err("sheet-qualified references are not supported".to_string()),
            '.' | '0'..='9' => self.number()?,
            c if c.is_ascii_alphabetic() || c == '$' || c == '_' => self.word(),
            other => return Err(format!("unexpected character '{other}'")),
        };
        Ok(token)
    }

    fn single(&mut self, token: Token) -> Token {
        self.pos += 1;
        token
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn consume(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn text(&mut self) -> ParseResult<Token> {
        self.pos += 1;
        let mut text = String::new();
        while let Some(ch) = self.peek() {
            self.pos += 1;
            if ch == '"' {
                // doubled quote is an escaped quote
                if self.consume('"') {
                    text.push('"');
                    continue;
                }
                return Ok(Token::Text(text));
            }
            text.push(ch);
        }
        Err("unterminated string literal".to_string())
    }

    fn error_literal(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        self.pos += 1;
        while let Some(ch) = self.peek() {
            if !(ch.is_ascii_alphanumeric() || matches!(ch, '/' | '!' | '?')) {
                break;
            }
            self.pos += 1;
            if matches!(ch, '!' | '?') {
                break;
            }
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        error_code(&literal)
            .map(Token::Error)
            .ok_or_else(|| format!("unknown error literal '{literal}'"))
    }

    fn number(&mut self) -> ParseResult<Token> {
        let start = self.pos;
        let mut seen_dot = false;
        let mut seen_exp = false;
        while let Some(ch) = self.peek() {
            match ch {
                '0'..='9' => self.pos += 1,
                '.' if !seen_dot && !seen_exp => {
                    seen_dot = true;
                    self.pos += 1;
                }
                'e' | 'E' if !seen_exp => {
                    seen_exp = true;
                    self.pos += 1;
                    if !self.consume('+') {
                        self.consume('-');
                    }
                }
                _ => break,
            }
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal
            .parse()
            .map(Token::Number)
            .map_err(|_| format!("invalid number '{literal}'"))
    }

    fn word(&mut self) -> Token {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || matches!(c, '$' | '_' | '.'))
        {
            self.pos += 1;
        }
        Token::Word(self.chars[start..self.pos].iter().collect())
    }
}

struct Parser {
    tokens: Vec<Token>,
    idx: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.idx]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.idx].clone();
        if token != Token::Eof {
            self.idx += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token) -> ParseResult<()> {
        let token = self.advance();
        if &token == expected {
            Ok(())
        } else {
            Err(format!("expected {expected:?}, found {token:?}"))
        }
    }

    fn expression(&mut self) -> ParseResult<Expr> {
        self.comparison()
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.concat()?;
        loop {
            let op = match self.peek() {
                Token::Equal => BinaryOp::Eq,
                Token::NotEqual => BinaryOp::Ne,
                Token::Less => BinaryOp::Lt,
                Token::LessEqual => BinaryOp::Le,
                Token::Greater => BinaryOp::Gt,
                Token::GreaterEqual => BinaryOp::Ge,
                _ => return Ok(expr),
            };
            self.advance();
            let right = self.concat()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(right));
        }
    }

    fn concat(&mut self) -> ParseResult<Expr> {
        let mut expr = self.additive()?;
        while *self.peek() == Token::Ampersand {
            self.advance();
            let right = self.additive()?;
            expr = Expr::Binary(BinaryOp::Concat, Box::new(expr), Box::new(right));
        }
        Ok(expr)
    }

    fn additive(&mut self) -> ParseResult<Expr> {
        let mut expr = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                _ => return Ok(expr),
            };
            self.advance();
            let right = self.multiplicative()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(right));
        }
    }

    fn multiplicative(&mut self) -> ParseResult<Expr> {
        let mut expr = self.power()?;
        loop {
            let op = match self.peek() {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                _ => return Ok(expr),
            };
            self.advance();
            let right = self.power()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(right));
        }
    }

    // `^` is left associative: 2^3^2 = (2^3)^2
    fn power(&mut self) -> ParseResult<Expr> {
        let mut expr = self.postfix()?;
        while *self.peek() == Token::Caret {
            self.advance();
            let right = self.postfix()?;
            expr = Expr::Binary(BinaryOp::Power, Box::new(expr), Box::new(right));
        }
        Ok(expr)
    }

    fn postfix(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;
        while *self.peek() == Token::Percent {
            self.advance();
            expr = Expr::Percent(Box::new(expr));
        }
        Ok(expr)
    }

    // Negation binds tighter than `^`: -2^2 = 4
    fn unary(&mut self) -> ParseResult<Expr> {
        match self.peek() {
            Token::Minus => {
                self.advance();
                Ok(Expr::Negate(Box::new(self.unary()?)))
            }
            Token::Plus => {
                self.advance();
                Ok(Expr::Plus(Box::new(self.unary()?)))
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        match self.advance() {
            Token::Number(n) => Ok(Expr::Number(n)),
            Token::Text(s) => Ok(Expr::Text(s)),
            Token::Error(code) => Ok(Expr::Error(code)),
            Token::Word(word) => self.word(word),
            Token::LParen => {
                let inner = self.expression()?;
                self.expect(&Token::RParen)?;
                Ok(Expr::Paren(Box::new(inner)))
            }
            Token::Eof => Err("unexpected end of formula".to_string()),
            other => Err(format!("unexpected {other:?}")),
        }
    }

    fn word(&mut self, word: String) -> ParseResult<Expr> {
        match self.peek() {
            Token::Bang => return Err("sheet-qualified references are not supported".to_string()),
            Token::LParen => {
                self.advance();
                return self.call(&word);
            }
            _ => {}
        }

        if word.eq_ignore_ascii_case("TRUE") {
            return Ok(Expr::Bool(true));
        }
        if word.eq_ignore_ascii_case("FALSE") {
            return Ok(Expr::Bool(false));
        }

        let first = parse_reference(&word).map_err(|_| format!("unknown name '{word}'"))?;
        if *self.peek() != Token::Colon {
            return Ok(Expr::Ref(first));
        }
        self.advance();
        match self.advance() {
            Token::Word(end) => {
                let last = parse_reference(&end)
                    .map_err(|_| format!("'{end}' is not a cell reference"))?;
                Ok(Expr::Area(first, last))
            }
            other => Err(format!("expected a cell reference after ':', found {other:?}")),
        }
    }

    fn call(&mut self, name: &str) -> ParseResult<Expr> {
        let function = lookup_function(name).ok_or_else(|| format!("unknown function '{name}'"))?;

        let mut args = Vec::new();
        if *self.peek() == Token::RParen {
            self.advance();
        } else {
            loop {
                args.push(self.expression()?);
                match self.advance() {
                    Token::Comma => {}
                    Token::RParen => break,
                    other => return Err(format!("expected ',' or ')', found {other:?}")),
                }
            }
        }

        let argc = args.len();
        let accepted = match function.arity {
            Arity::Fixed(n) => argc == usize::from(n),
            Arity::Variable { min, max } => (usize::from(min)..=usize::from(max)).contains(&argc),
        };
        if !accepted {
            return Err(format!(
                "{} does not take {argc} argument(s)",
                function.name
            ));
        }
        Ok(Expr::Call(function, args))
    }
}

fn parse(formula: &str) -> ParseResult<Expr> {
    if formula.trim().is_empty() {
        return Err("empty formula".to_string());
    }
    let tokens = Lexer::new(formula).tokenize()?;
    let mut parser = Parser { tokens, idx: 0 };
    let expr = parser.expression()?;
    match parser.peek() {
        Token::Eof => Ok(expr),
        other => Err(format!("unexpected trailing {other:?}")),
    }
}

/// Append the tokens of `expr`. `as_reference` selects the reference-class
/// operand tokens for a reference passed straight to a function.
fn emit(expr: &Expr, as_reference: bool, out: &mut Vec<u8>) -> ParseResult<()> {
    match expr {
        Expr::Number(n) => {
            if n.fract() == 0.0 && (0.0..=65535.0).contains(n) {
                out.push(PTG_INT);
                out.extend_from_slice(&(*n as u16).to_le_bytes());
            } else {
                out.push(PTG_NUM);
                out.extend_from_slice(&n.to_le_bytes());
            }
        }
        Expr::Text(text) => emit_string(text, out)?,
        Expr::Bool(b) => out.extend_from_slice(&[PTG_BOOL, u8::from(*b)]),
        Expr::Error(code) => out.extend_from_slice(&[PTG_ERR, *code]),
        Expr::Ref(cell) => {
            out.push(if as_reference { PTG_REF } else { PTG_REF_V });
            let (row, col) = encode_reference(cell)?;
            out.extend_from_slice(&row.to_le_bytes());
            out.extend_from_slice(&col.to_le_bytes());
        }
        Expr::Area(first, last) => {
            out.push(if as_reference { PTG_AREA } else { PTG_AREA_V });
            let (first_row, first_col) = encode_reference(first)?;
            let (last_row, last_col) = encode_reference(last)?;
            out.extend_from_slice(&first_row.to_le_bytes());
            out.extend_from_slice(&last_row.to_le_bytes());
            out.extend_from_slice(&first_col.to_le_bytes());
            out.extend_from_slice(&last_col.to_le_bytes());
        }
        Expr::Negate(inner) => {
            emit(inner, false, out)?;
            out.push(PTG_UMINUS);
        }
        Expr::Plus(inner) => {
            emit(inner, false, out)?;
            out.push(PTG_UPLUS);
        }
        Expr::Percent(inner) => {
            emit(inner, false, out)?;
            out.push(PTG_PERCENT);
        }
        Expr::Binary(op, left, right) => {
            emit(left, false, out)?;
            emit(right, false, out)?;
            out.push(op.ptg());
        }
        Expr::Paren(inner) => {
            emit(inner, false, out)?;
            out.push(PTG_PAREN);
        }
        Expr::Call(function, args) => {
            for arg in args {
                emit(arg, true, out)?;
            }
            match function.arity {
                Arity::Fixed(_) => out.push(PTG_FUNC_V),
                Arity::Variable { .. } => {
                    out.push(PTG_FUNC_VAR_V);
                    // arity was validated against a max of 30
                    out.push(args.len() as u8);
                }
            }
            out.extend_from_slice(&function.index.to_le_bytes());
        }
    }
    Ok(())
}

fn emit_string(text: &str, out: &mut Vec<u8>) -> ParseResult<()> {
    let compressed = text.chars().all(|c| u32::from(c) <= 0xFF);
    let units: Vec<u16> = text.encode_utf16().collect();
    let cch = u8::try_from(units.len())
        .map_err(|_| format!("string literal longer than 255 characters ({})", units.len()))?;

    out.push(PTG_STR);
    out.push(cch);
    if compressed {
        out.push(0x00);
        out.extend(text.chars().map(|c| u32::from(c) as u8));
    } else {
        out.push(0x01);
        for unit in units {
            out.extend_from_slice(&unit.to_le_bytes());
        }
    }
    Ok(())
}

/// Row word and column word of a reference; the column word carries the
/// relative-row and relative-column flags.
fn encode_reference(cell: &CellReference) -> ParseResult<(u16, u16)> {
    if cell.row > MAX_ROW || cell.col > MAX_COL {
        return Err(format!(
            "reference {} is outside the 65536 x 256 sheet",
            crate::coord::rowcol_to_coord(cell.row, cell.col)
        ));
    }
    let mut col = cell.col as u16;
    if !cell.row_absolute {
        col |= ROW_RELATIVE;
    }
    if !cell.col_absolute {
        col |= COL_RELATIVE;
    }
    Ok((cell.row as u16, col))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(n: u16) -> Vec<u8> {
        let mut out = vec![PTG_INT];
        out.extend_from_slice(&n.to_le_bytes());
        out
    }

    fn concat(parts: &[&[u8]]) -> Vec<u8> {
        parts.concat()
    }

    fn reason(formula: &str) -> String {
        match compile(formula) {
            Err(SheetError::InvalidFormula { reason, .. }) => reason,
            other => panic!("expected InvalidFormula for {formula:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            compile("1+2*3").unwrap(),
            concat(&[&int(1), &int(2), &int(3), &[PTG_MUL, PTG_ADD]])
        );
        assert_eq!(
            compile("(1+2)*3").unwrap(),
            concat(&[&int(1), &int(2), &[PTG_ADD, PTG_PAREN], &int(3), &[PTG_MUL]])
        );
        assert_eq!(
            compile("1-2-3").unwrap(),
            concat(&[&int(1), &int(2), &[PTG_SUB], &int(3), &[PTG_SUB]])
        );
    }

    #[test]
    fn test_negation_binds_tighter_than_power() {
        assert_eq!(
            compile("-2^2").unwrap(),
            concat(&[&int(2), &[PTG_UMINUS], &int(2), &[PTG_POWER]])
        );
        assert_eq!(compile("50%").unwrap(), concat(&[&int(50), &[PTG_PERCENT]]));
        assert_eq!(compile("+1").unwrap(), concat(&[&int(1), &[PTG_UPLUS]]));
    }

    #[test]
    fn test_comparison_and_concat() {
        assert_eq!(
            compile("\"a\"&\"b\"<>\"ab\"").unwrap(),
            vec![
                PTG_STR, 1, 0, b'a', PTG_STR, 1, 0, b'b', PTG_CONCAT, PTG_STR, 2, 0, b'a', b'b',
                PTG_NE
            ]
        );
        assert_eq!(
            compile("1<=2").unwrap(),
            concat(&[&int(1), &int(2), &[PTG_LE]])
        );
    }

    #[test]
    fn test_literals() {
        assert_eq!(compile("TRUE").unwrap(), vec![PTG_BOOL, 1]);
        assert_eq!(compile("false").unwrap(), vec![PTG_BOOL, 0]);
        assert_eq!(compile("#N/A").unwrap(), vec![PTG_ERR, 0x2A]);
        assert_eq!(compile("#DIV/0!").unwrap(), vec![PTG_ERR, 0x07]);

        let mut num = vec![PTG_NUM];
        num.extend_from_slice(&2.5f64.to_le_bytes());
        assert_eq!(compile("2.5").unwrap(), num);

        let mut big = vec![PTG_NUM];
        big.extend_from_slice(&70000f64.to_le_bytes());
        assert_eq!(compile("70000").unwrap(), big);
    }

    #[test]
    fn test_wide_string_literal() {
        assert_eq!(
            compile("\"π\"").unwrap(),
            vec![PTG_STR, 1, 1, 0xC0, 0x03]
        );
        assert_eq!(compile("\"say \"\"hi\"\"\"").unwrap()[1], 8);
    }

    #[test]
    fn test_references() {
        assert_eq!(
            compile("A1+B2").unwrap(),
            vec![PTG_REF_V, 0, 0, 0x00, 0xC0, PTG_REF_V, 1, 0, 0x01, 0xC0, PTG_ADD]
        );
        assert_eq!(compile("$A$1").unwrap(), vec![PTG_REF_V, 0, 0, 0, 0]);
        assert_eq!(compile("$C7").unwrap(), vec![PTG_REF_V, 6, 0, 0x02, 0x80]);
        assert_eq!(compile("c$7").unwrap(), vec![PTG_REF_V, 6, 0, 0x02, 0x40]);
    }

    #[test]
    fn test_function_calls() {
        assert_eq!(
            compile("SUM(A1:B3)").unwrap(),
            vec![PTG_AREA, 0, 0, 2, 0, 0x00, 0xC0, 0x01, 0xC0, PTG_FUNC_VAR_V, 1, 4, 0]
        );
        assert_eq!(
            compile("round(A1,0)").unwrap(),
            concat(&[&[PTG_REF, 0, 0, 0x00, 0xC0], &int(0), &[PTG_FUNC_V, 27, 0]])
        );
        assert_eq!(compile("PI()").unwrap(), vec![PTG_FUNC_V, 19, 0]);
        assert_eq!(
            compile("IF(A1>0,\"pos\",\"neg\")").unwrap(),
            concat(&[
                &[PTG_REF_V, 0, 0, 0x00, 0xC0],
                &int(0),
                &[PTG_GT],
                &[PTG_STR, 3, 0, b'p', b'o', b's'],
                &[PTG_STR, 3, 0, b'n', b'e', b'g'],
                &[PTG_FUNC_VAR_V, 3, 1, 0],
            ])
        );
    }

    #[test]
    fn test_rejections() {
        assert!(reason("Sheet2!A1").contains("sheet-qualified"));
        assert!(reason("'My Sheet'!A1").contains("sheet-qualified"));
        assert!(reason("FOO(1)").contains("unknown function"));
        assert!(reason("total").contains("unknown name"));
        assert!(reason("ROUND(1)").contains("argument"));
        assert!(reason("1+").contains("end of formula"));
        assert!(reason("\"open").contains("unterminated"));
        assert!(reason("1 2").contains("trailing"));
        assert!(reason("  ").contains("empty"));
        assert!(reason("IV65537").contains("outside"));
        assert!(reason("#BOGUS!").contains("error literal"));
    }

    #[test]
    fn test_whitespace_is_ignored() {
        assert_eq!(compile(" SUM( A1 : A2 ) ").unwrap(), compile("SUM(A1:A2)").unwrap());
    }
}
