use crate::ast::{BinaryOp, Expr, Scope, UnaryOp};
use crate::classad::ClassAd;
use crate::error::{ParseError, Position};
use crate::stack::ensure_sufficient_stack;

/// Height limit for a parsed expression tree. Operator and postfix chains
/// grow the tree without nesting, so they are measured separately.
const MAX_DEPTH: usize = 1000;

/// Deepest nesting of parentheses, lists, records and unary operators the
/// parser accepts. Rendering adds at most two levels per tree level, so
/// every accepted tree renders to text that parses back.
const MAX_NESTING: usize = 2 * MAX_DEPTH;

/// Binary operator precedence, loosest first. `?:` and `? :` sit above all
/// of these and are handled separately.
const LEVELS: &[&[BinaryOp]] = &[
    &[BinaryOp::Or],
    &[BinaryOp::And],
    &[BinaryOp::BitOr],
    &[BinaryOp::BitXor],
    &[BinaryOp::BitAnd],
    &[BinaryOp::Eq, BinaryOp::Ne, BinaryOp::Is, BinaryOp::Isnt],
    &[BinaryOp::Lt, BinaryOp::Le, BinaryOp::Gt, BinaryOp::Ge],
    &[BinaryOp::Shl, BinaryOp::Shr, BinaryOp::Ushr],
    &[BinaryOp::Add, BinaryOp::Sub],
    &[BinaryOp::Mul, BinaryOp::Div, BinaryOp::Mod],
];

/// Symbolic operators, longest first so that `>>>` wins over `>>` and `>`.
const SYMBOLS: &[(&str, BinaryOp)] = &[
    (">>>", BinaryOp::Ushr),
    ("=?=", BinaryOp::Is),
    ("=!=", BinaryOp::Isnt),
    ("||", BinaryOp::Or),
    ("&&", BinaryOp::And),
    ("==", BinaryOp::Eq),
    ("!=", BinaryOp::Ne),
    ("<=", BinaryOp::Le),
    (">=", BinaryOp::Ge),
    ("<<", BinaryOp::Shl),
    (">>", BinaryOp::Shr),
    ("|", BinaryOp::BitOr),
    ("^", BinaryOp::BitXor),
    ("&", BinaryOp::BitAnd),
    ("<", BinaryOp::Lt),
    (">", BinaryOp::Gt),
    ("+", BinaryOp::Add),
    ("-", BinaryOp::Sub),
    ("*", BinaryOp::Mul),
    ("/", BinaryOp::Div),
    ("%", BinaryOp::Mod),
];

/// Parser state: tracks position in the input string.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

/// Parse a single expression, e.g. `TARGET.Memory >= 1024 && Arch == "X86_64"`.
pub fn parse_expr(input: &str) -> Result<Expr, ParseError> {
    let mut parser = Parser::new(input);
    parser.skip_ws()?;
    let expr = parser.parse_expression()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parse exactly one new-format record: `[ name = expr; ... ]`.
pub fn parse_classad(input: &str) -> Result<ClassAd, ParseError> {
    let mut parser = Parser::new(input);
    parser.skip_ws()?;
    let ad = parser.parse_record()?;
    parser.expect_end()?;
    Ok(ad)
}

/// Parse any number of concatenated new-format records: `[..] [..] ...`.
pub fn parse_classads(input: &str) -> Result<Vec<ClassAd>, ParseError> {
    let mut parser = Parser::new(input);
    let mut ads = Vec::new();
    parser.skip_ws()?;
    while !parser.at_end() {
        ads.push(parser.parse_record()?);
        parser.skip_ws()?;
    }
    Ok(ads)
}

/// Parse one old-format record: a `name = expr` per line. Blank lines and
/// lines starting with `#` or `//` are ignored.
pub fn parse_old_classad(input: &str) -> Result<ClassAd, ParseError> {
    let ad = ClassAd::new();
    for line in lines(input) {
        if !line.is_ignorable() {
            line.parse_into(&ad)?;
        }
    }
    Ok(ad)
}

/// Parse old-format records separated by one or more blank lines.
pub fn parse_old_classads(input: &str) -> Result<Vec<ClassAd>, ParseError> {
    let mut ads = Vec::new();
    let mut current: Option<ClassAd> = None;
    for line in lines(input) {
        if line.is_blank() {
            ads.extend(current.take());
        } else if !line.is_ignorable() {
            let ad = current.get_or_insert_with(ClassAd::new);
            line.parse_into(ad)?;
        }
    }
    ads.extend(current);
    Ok(ads)
}

/// One physical line of old-format input.
pub(crate) struct Line<'a> {
    pub text: &'a str,
    pub number: usize,
    pub offset: usize,
}

impl Line<'_> {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Blank or a comment.
    pub fn is_ignorable(&self) -> bool {
        let trimmed = self.text.trim_start();
        trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("//")
    }

    /// Parse `name = expr` and insert it into `ad`.
    pub fn parse_into(&self, ad: &ClassAd) -> Result<(), ParseError> {
        let (name, expr) = Parser::new(self.text)
            .parse_old_attribute()
            .map_err(|e| e.relocated(self.number, self.offset))?;
        ad.insert(name, expr);
        Ok(())
    }
}

/// Split on `\n`, dropping a trailing `\r`, keeping line numbers and byte
/// offsets for error positions.
pub(crate) fn lines(input: &str) -> impl Iterator<Item = Line<'_>> {
    let mut offset = 0;
    input.split('\n').enumerate().map(move |(number, raw)| {
        let line = Line {
            text: raw.strip_suffix('\r').unwrap_or(raw),
            number,
            offset,
        };
        offset += raw.len() + 1;
        line
    })
}

/// Render `s` as a double-quoted ClassAd string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_ascii_control() => out.push_str(&format!("\\{:03o}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Inverse of `quote`: decode a double-quoted string literal.
pub fn unquote(input: &str) -> Result<String, ParseError> {
    let mut parser = Parser::new(input);
    let text = parser.parse_string()?;
    parser.expect_end()?;
    Ok(text)
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser {
            input,
            pos: 0,
            depth: 0,
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.remaining().chars().nth(1)
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn starts_with(&self, s: &str) -> bool {
        self.remaining().starts_with(s)
    }

    fn eat_char(&mut self, ch: char) -> bool {
        if self.peek_char() == Some(ch) {
            self.advance(ch.len_utf8());
            true
        } else {
            false
        }
    }

    fn expect_char(&mut self, ch: char) -> Result<(), ParseError> {
        if self.eat_char(ch) {
            Ok(())
        } else {
            Err(self.error_point(format!("Expected '{}'", ch)))
        }
    }

    fn expect_end(&mut self) -> Result<(), ParseError> {
        self.skip_ws()?;
        match self.peek_char() {
            None => Ok(()),
            Some(ch) => Err(self.error_point(format!("Unexpected trailing '{}'", ch))),
        }
    }

    fn position(&self) -> Position {
        Position::locate(self.input, self.pos)
    }

    /// Create an error at a single point (current position).
    fn error_point(&self, message: String) -> ParseError {
        let pos = self.position();
        ParseError::syntax_error(message, pos, pos)
    }

    /// Create an error spanning from `begin` to the current position.
    fn error_span(&self, message: String, begin: Position) -> ParseError {
        ParseError::syntax_error(message, begin, self.position())
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_NESTING {
            return Err(self.error_point("Expression nested too deeply".to_string()));
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn check_height(&self, height: usize, begin: Position) -> Result<(), ParseError> {
        if height > MAX_DEPTH {
            return Err(self.error_span("Expression nested too deeply".to_string(), begin));
        }
        Ok(())
    }

    // ── Whitespace & Comments ───────────────────────────────────────

    fn skip_ws(&mut self) -> Result<(), ParseError> {
        loop {
            while let Some(ch) = self.peek_char() {
                if ch.is_whitespace() {
                    self.advance(ch.len_utf8());
                } else {
                    break;
                }
            }
            if self.starts_with("//") {
                while let Some(ch) = self.peek_char() {
                    if ch == '\n' {
                        break;
                    }
                    self.advance(ch.len_utf8());
                }
            } else if self.starts_with("/*") {
                let begin = self.position();
                match self.remaining()[2..].find("*/") {
                    Some(end) => self.advance(end + 4),
                    None => {
                        self.pos = self.input.len();
                        return Err(self.error_span("Unterminated comment".to_string(), begin));
                    }
                }
            } else {
                return Ok(());
            }
        }
    }

    // ── Records & Lists ─────────────────────────────────────────────

    fn parse_record(&mut self) -> Result<ClassAd, ParseError> {
        let begin = self.position();
        self.expect_char('[')?;
        self.enter()?;
        let ad = ClassAd::new();
        loop {
            self.skip_ws()?;
            if self.eat_char(']') {
                break;
            }
            if self.at_end() {
                return Err(self.error_span("Unclosed '['".to_string(), begin));
            }
            let (name, expr) = self.parse_attribute()?;
            ad.insert(name, expr);
            self.skip_ws()?;
            if self.eat_char(';') {
                continue;
            }
            if self.eat_char(']') {
                break;
            }
            if self.at_end() {
                return Err(self.error_span("Unclosed '['".to_string(), begin));
            }
            return Err(self.error_point("Expected ';' or ']' in record".to_string()));
        }
        self.leave();
        Ok(ad)
    }

    /// `name = expr`
    fn parse_attribute(&mut self) -> Result<(String, Expr), ParseError> {
        let name = self.parse_name()?;
        self.skip_ws()?;
        self.expect_char('=')?;
        self.skip_ws()?;
        let expr = self.parse_expression()?;
        Ok((name, expr))
    }

    /// One old-format line: `name = expr` and nothing else.
    fn parse_old_attribute(&mut self) -> Result<(String, Expr), ParseError> {
        self.skip_ws()?;
        let attribute = self.parse_attribute()?;
        self.expect_end()?;
        Ok(attribute)
    }

    fn parse_list(&mut self) -> Result<Expr, ParseError> {
        let begin = self.position();
        self.expect_char('{')?;
        self.enter()?;
        let mut items = Vec::new();
        self.skip_ws()?;
        if !self.eat_char('}') {
            loop {
                items.push(self.parse_expression()?);
                self.skip_ws()?;
                if self.eat_char('}') {
                    break;
                }
                if self.eat_char(',') {
                    self.skip_ws()?;
                    // Allow trailing comma
                    if self.eat_char('}') {
                        break;
                    }
                    continue;
                }
                if self.at_end() {
                    return Err(self.error_span("Unclosed '{'".to_string(), begin));
                }
                return Err(self.error_point("Expected ',' or '}' in list".to_string()));
            }
        }
        self.leave();
        Ok(Expr::List(items))
    }

    // ── Expressions ─────────────────────────────────────────────────

    /// `a ? b : c` and `a ?: b`, both right-associative, then binary operators.
    fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        ensure_sufficient_stack(|| self.parse_conditional())
    }

    fn parse_conditional(&mut self) -> Result<Expr, ParseError> {
        let begin = self.position();
        self.enter()?;
        let cond = self.parse_binary(0)?;
        self.skip_ws()?;
        let expr = if self.starts_with("?:") {
            self.advance(2);
            self.skip_ws()?;
            let right = self.parse_expression()?;
            self.check_height(cond.depth().max(right.depth()) + 1, begin)?;
            Expr::elvis(cond, right)
        } else if self.eat_char('?') {
            self.skip_ws()?;
            let then = self.parse_expression()?;
            self.skip_ws()?;
            self.expect_char(':')?;
            self.skip_ws()?;
            let otherwise = self.parse_expression()?;
            let height = cond.depth().max(then.depth()).max(otherwise.depth()) + 1;
            self.check_height(height, begin)?;
            Expr::conditional(cond, then, otherwise)
        } else {
            cond
        };
        self.leave();
        Ok(expr)
    }

    fn parse_binary(&mut self, level: usize) -> Result<Expr, ParseError> {
        let Some(ops) = LEVELS.get(level) else {
            return self.parse_unary();
        };
        let begin = self.position();
        let mut left = self.parse_binary(level + 1)?;
        let mut height = left.depth();
        loop {
            self.skip_ws()?;
            match self.peek_operator() {
                Some((op, len)) if ops.contains(&op) => {
                    self.advance(len);
                    self.skip_ws()?;
                    let right = self.parse_binary(level + 1)?;
                    height = height.max(right.depth()) + 1;
                    self.check_height(height, begin)?;
                    left = Expr::binary(op, left, right);
                }
                _ => return Ok(left),
            }
        }
    }

    /// The binary operator at the current position, with its length.
    fn peek_operator(&self) -> Option<(BinaryOp, usize)> {
        let rest = self.remaining();
        if let Some((symbol, op)) = SYMBOLS.iter().find(|(s, _)| rest.starts_with(*s)) {
            return Some((*op, symbol.len()));
        }
        let word_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let word = &rest[..word_len];
        if word.eq_ignore_ascii_case("is") {
            Some((BinaryOp::Is, word_len))
        } else if word.eq_ignore_ascii_case("isnt") {
            Some((BinaryOp::Isnt, word_len))
        } else {
            None
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match self.peek_char() {
            Some('-') => UnaryOp::Neg,
            Some('+') => UnaryOp::Plus,
            Some('!') => UnaryOp::Not,
            Some('~') => UnaryOp::BitNot,
            _ => return self.parse_postfix(),
        };
        self.advance(1);
        self.skip_ws()?;
        if op == UnaryOp::Neg && self.at_number() {
            let number = self.parse_number(true)?;
            return self.parse_postfix_of(number);
        }
        self.enter()?;
        let operand = self.parse_unary()?;
        self.leave();
        Ok(match (op, operand) {
            // Negative literals stay literals.
            (UnaryOp::Neg, Expr::Integer(i)) => Expr::Integer(i.wrapping_neg()),
            (UnaryOp::Neg, Expr::Real(r)) => Expr::Real(-r),
            (op, operand) => Expr::unary(op, operand),
        })
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let primary = self.parse_primary()?;
        self.parse_postfix_of(primary)
    }

    /// `.attr` selections and `[index]` subscripts following `expr`.
    fn parse_postfix_of(&mut self, mut expr: Expr) -> Result<Expr, ParseError> {
        let begin = self.position();
        let mut height = expr.depth();
        loop {
            self.skip_ws()?;
            if self.peek_char() == Some('.') {
                self.advance(1);
                self.skip_ws()?;
                let attr = self.parse_name()?;
                height += 1;
                expr = Expr::select(expr, attr);
            } else if self.peek_char() == Some('[') {
                self.advance(1);
                self.skip_ws()?;
                let index = self.parse_expression()?;
                self.skip_ws()?;
                self.expect_char(']')?;
                height = height.max(index.depth()) + 1;
                expr = Expr::subscript(expr, index);
            } else {
                return Ok(expr);
            }
            self.check_height(height, begin)?;
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        match self.peek_char() {
            None => Err(self.error_point("Unexpected end of input".to_string())),
            Some('(') => {
                self.advance(1);
                self.skip_ws()?;
                let expr = self.parse_expression()?;
                self.skip_ws()?;
                self.expect_char(')')?;
                Ok(expr)
            }
            Some('{') => self.parse_list(),
            Some('[') => self.parse_record().map(Expr::Record),
            Some('"') => self.parse_string().map(Expr::String),
            Some('\'') => self.parse_quoted_name().map(Expr::attr),
            Some(_) if self.at_number() => self.parse_number(false),
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => self.parse_word(),
            Some(ch) => Err(self.error_point(format!("Unexpected '{}'", ch))),
        }
    }

    /// Keyword literal, scoped reference, function call or attribute name.
    fn parse_word(&mut self) -> Result<Expr, ParseError> {
        let begin = self.position();
        let word = self.parse_identifier()?;
        match word.to_ascii_lowercase().as_str() {
            "true" => return Ok(Expr::Boolean(true)),
            "false" => return Ok(Expr::Boolean(false)),
            "undefined" => return Ok(Expr::Undefined),
            "error" => return Ok(Expr::Error),
            "is" | "isnt" => {
                return Err(self.error_span(format!("Unexpected operator '{}'", word), begin))
            }
            _ => {}
        }
        if let Some(scope) = Scope::from_keyword(&word) {
            if self.eat_char('.') {
                let name = self.parse_name()?;
                return Ok(Expr::scoped_attr(scope, name));
            }
        }
        self.skip_ws()?;
        if self.peek_char() == Some('(') {
            let args = self.parse_arguments()?;
            return Ok(Expr::call(word, args));
        }
        Ok(Expr::attr(word))
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let begin = self.position();
        self.expect_char('(')?;
        let mut args = Vec::new();
        self.skip_ws()?;
        if self.eat_char(')') {
            return Ok(args);
        }
        loop {
            args.push(self.parse_expression()?);
            self.skip_ws()?;
            if self.eat_char(')') {
                return Ok(args);
            }
            if self.eat_char(',') {
                self.skip_ws()?;
                continue;
            }
            if self.at_end() {
                return Err(self.error_span("Unclosed '('".to_string(), begin));
            }
            return Err(self.error_point("Expected ',' or ')' in arguments".to_string()));
        }
    }

    // ── Names ───────────────────────────────────────────────────────

    fn parse_identifier(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        match self.peek_char() {
            Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => self.advance(1),
            _ => return Err(self.error_point("Expected a name".to_string())),
        }
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.advance(1);
            } else {
                break;
            }
        }
        Ok(self.input[start..self.pos].to_string())
    }

    /// A bare identifier or a `'quoted name'`.
    fn parse_name(&mut self) -> Result<String, ParseError> {
        if self.peek_char() == Some('\'') {
            self.parse_quoted_name()
        } else {
            self.parse_identifier()
        }
    }

    /// `'any text'`, where `\'` and `\\` are the only escapes.
    fn parse_quoted_name(&mut self) -> Result<String, ParseError> {
        let begin = self.position();
        self.expect_char('\'')?;
        let mut result = String::new();
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    return Err(self.error_span("Unterminated quoted name".to_string(), begin));
                }
                Some('\'') => {
                    self.advance(1);
                    break;
                }
                Some('\\') if matches!(self.peek_second(), Some('\'') | Some('\\')) => {
                    self.advance(1);
                    if let Some(ch) = self.peek_char() {
                        self.advance(1);
                        result.push(ch);
                    }
                }
                Some(ch) => {
                    self.advance(ch.len_utf8());
                    result.push(ch);
                }
            }
        }
        if result.is_empty() {
            return Err(self.error_span("Empty quoted name".to_string(), begin));
        }
        Ok(result)
    }

    // ── Numbers ─────────────────────────────────────────────────────

    fn at_number(&self) -> bool {
        match self.peek_char() {
            Some(ch) if ch.is_ascii_digit() => true,
            Some('.') => self.peek_second().is_some_and(|c| c.is_ascii_digit()),
            _ => false,
        }
    }

    fn consume_digits(&mut self, radix: u32) -> usize {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if ch.is_digit(radix) {
                self.advance(1);
            } else {
                break;
            }
        }
        self.pos - start
    }

    /// Integer (decimal or `0x` hex) or real literal. `negative` means a
    /// `-` was already consumed and belongs to the literal.
    fn parse_number(&mut self, negative: bool) -> Result<Expr, ParseError> {
        let begin = self.position();
        let sign = if negative { "-" } else { "" };

        if self.starts_with("0x") || self.starts_with("0X") {
            self.advance(2);
            let start = self.pos;
            if self.consume_digits(16) == 0 {
                return Err(self.error_span("Expected hex digits".to_string(), begin));
            }
            let digits = &self.input[start..self.pos];
            return i64::from_str_radix(&format!("{}{}", sign, digits), 16)
                .map(Expr::Integer)
                .map_err(|_| self.error_span("Integer literal out of range".to_string(), begin));
        }

        let start = self.pos;
        let mut is_real = false;
        self.consume_digits(10);
        if self.peek_char() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit())
        {
            self.advance(1);
            self.consume_digits(10);
            is_real = true;
        }
        if matches!(self.peek_char(), Some('e') | Some('E')) {
            let saved = self.pos;
            self.advance(1);
            if matches!(self.peek_char(), Some('+') | Some('-')) {
                self.advance(1);
            }
            if self.consume_digits(10) == 0 {
                self.pos = saved;
            } else {
                is_real = true;
            }
        }

        let text = format!("{}{}", sign, &self.input[start..self.pos]);
        if is_real {
            text.parse::<f64>()
                .map(Expr::Real)
                .map_err(|_| self.error_span(format!("Invalid number: {}", text), begin))
        } else {
            text.parse::<i64>()
                .map(Expr::Integer)
                .map_err(|_| self.error_span("Integer literal out of range".to_string(), begin))
        }
    }

    // ── Strings ─────────────────────────────────────────────────────

    fn parse_string(&mut self) -> Result<String, ParseError> {
        let begin = self.position();
        self.expect_char('"')?;
        let mut result = String::new();
        loop {
            match self.peek_char() {
                None | Some('\n') => {
                    return Err(self.error_span("Unterminated string".to_string(), begin));
                }
                Some('"') => {
                    self.advance(1);
                    return Ok(result);
                }
                Some('\\') => {
                    self.advance(1);
                    result.push(self.parse_escape_char()?);
                }
                Some(ch) => {
                    self.advance(ch.len_utf8());
                    result.push(ch);
                }
            }
        }
    }

    fn parse_escape_char(&mut self) -> Result<char, ParseError> {
        let begin = self.position();
        let Some(ch) = self.peek_char() else {
            return Err(self.error_point("Unterminated escape sequence".to_string()));
        };
        self.advance(ch.len_utf8());
        match ch {
            'n' => Ok('\n'),
            't' => Ok('\t'),
            'r' => Ok('\r'),
            'b' => Ok('\u{0008}'),
            'f' => Ok('\u{000C}'),
            '"' | '\'' | '\\' | '/' => Ok(ch),
            '0'..='7' => {
                // Up to three octal digits, at most \377.
                let mut code = ch as u32 - '0' as u32;
                for _ in 0..2 {
                    match self.peek_char().and_then(|c| c.to_digit(8)) {
                        Some(d) if code * 8 + d <= 0o377 => {
                            code = code * 8 + d;
                            self.advance(1);
                        }
                        _ => break,
                    }
                }
                char::from_u32(code)
                    .ok_or_else(|| self.error_span("Invalid octal escape".to_string(), begin))
            }
            'u' => {
                let start = self.pos;
                if self.consume_digits(16) < 4 {
                    return Err(self.error_span("Expected 4 hex digits in \\uXXXX".to_string(), begin));
                }
                self.pos = start + 4;
                let hex = &self.input[start..self.pos];
                u32::from_str_radix(hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        self.error_span(format!("Invalid unicode code point: \\u{}", hex), begin)
                    })
            }
            other => Err(self.error_span(format!("Unknown escape '\\{}'", other), begin)),
        }
    }
}
