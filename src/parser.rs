//! Surface-syntax parser.
//!
//! Parses a token stream into a `RuleExpr`. Malformed input is fatal
//! (`Error::Malformed` / `Error::IllegalRepetition`) — the engine never
//! guesses at a broken grammar.

use crate::error::Error;
use crate::expr::{RepBounds, RuleExpr};
use crate::lexer::{Lexer, Token};
use crate::value::Value;

/// Wildcard keywords, reserved: rules cannot take these names.
const WILDCARDS: &[(&str, RuleExpr)] = &[
    ("char", RuleExpr::AnyChar),
    ("byte", RuleExpr::AnyByte),
    ("symbol", RuleExpr::AnySym),
    ("form", RuleExpr::AnyForm),
    ("list", RuleExpr::AnyList),
    ("vector", RuleExpr::AnyVector),
    ("number", RuleExpr::AnyNumber),
    ("string", RuleExpr::AnyStr),
];

/// Combinator heads, reserved alongside the wildcards.
const HEADS: &[&str] = &["or", "and", "and~", "not", "rep"];

/// Parse canonical surface text into a rule expression.
pub fn parse_expr(text: &str) -> Result<RuleExpr, Error> {
    let tokens = Lexer::new(text).tokenize()?;
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_expr()?;
    parser.expect_end()?;
    Ok(expr)
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.pos).cloned()?;
        self.pos += 1;
        Some(tok)
    }

    fn expect_rparen(&mut self) -> Result<(), Error> {
        match self.advance() {
            Some(Token::RParen) => Ok(()),
            Some(tok) => Err(Error::Malformed(format!("expected ')', found {tok:?}"))),
            None => Err(Error::Malformed("expected ')', found end of input".to_string())),
        }
    }

    fn expect_end(&mut self) -> Result<(), Error> {
        match self.peek() {
            None => Ok(()),
            Some(tok) => Err(Error::Malformed(format!(
                "trailing input after expression: {tok:?}"
            ))),
        }
    }

    pub fn parse_expr(&mut self) -> Result<RuleExpr, Error> {
        match self.advance() {
            Some(Token::LParen) => self.parse_form(),
            Some(Token::LBracket) => self.parse_vector_literal(),
            Some(Token::SymLit(name)) => Ok(RuleExpr::Sym(name)),
            Some(Token::CharLit(c)) => Ok(RuleExpr::Char(c)),
            Some(Token::IntLit(n)) => Ok(RuleExpr::Int(n)),
            Some(Token::FloatLit(x)) => Ok(RuleExpr::Float(x)),
            Some(Token::StrLit(s)) => Ok(RuleExpr::Str(s)),
            Some(Token::Ident(name)) => {
                for (keyword, wildcard) in WILDCARDS {
                    if name == *keyword {
                        return Ok(wildcard.clone());
                    }
                }
                if HEADS.contains(&name.as_str()) {
                    return Err(Error::Malformed(format!(
                        "reserved word '{name}' is not an expression"
                    )));
                }
                Ok(RuleExpr::Call(name, Vec::new()))
            }
            Some(tok) => Err(Error::Malformed(format!("unexpected {tok:?}"))),
            None => Err(Error::Malformed("expected an expression".to_string())),
        }
    }

    /// Parse the body of a parenthesized form; the `(` is consumed.
    fn parse_form(&mut self) -> Result<RuleExpr, Error> {
        match self.advance() {
            Some(Token::Star) => self.unary(RuleExpr::Star),
            Some(Token::Plus) => self.unary(RuleExpr::Plus),
            Some(Token::Question) => self.unary(RuleExpr::Opt),
            Some(Token::Amp) => self.unary(RuleExpr::Ahead),
            Some(Token::Bang) => self.unary(RuleExpr::BehindNot),
            Some(Token::Ident(name)) => match name.as_str() {
                "or" => Ok(RuleExpr::Or(self.variadic("or")?)),
                "and" => Ok(RuleExpr::And(self.variadic("and")?)),
                "and~" => Ok(RuleExpr::AndUnordered(self.variadic("and~")?)),
                "not" => self.unary(RuleExpr::Not),
                "rep" => self.parse_rep(),
                "list" => self.unary(RuleExpr::DescendList),
                "string" => self.unary(RuleExpr::DescendStr),
                "vector" => self.unary(RuleExpr::DescendVector),
                "char" | "byte" | "symbol" | "form" | "number" => Err(Error::Malformed(
                    format!("reserved word '{name}' in rule position"),
                )),
                _ => {
                    let mut args = Vec::new();
                    while self.peek().is_some() && self.peek() != Some(&Token::RParen) {
                        args.push(self.parse_expr()?);
                    }
                    self.expect_rparen()?;
                    Ok(RuleExpr::Call(name, args))
                }
            },
            Some(tok) => Err(Error::Malformed(format!(
                "expected a rule name or combinator, found {tok:?}"
            ))),
            None => Err(Error::Malformed("unterminated form".to_string())),
        }
    }

    /// A combinator that takes exactly one sub-expression.
    fn unary(
        &mut self,
        build: impl FnOnce(Box<RuleExpr>) -> RuleExpr,
    ) -> Result<RuleExpr, Error> {
        let inner = self.parse_expr()?;
        self.expect_rparen()?;
        Ok(build(Box::new(inner)))
    }

    /// One or more sub-expressions up to the closing paren.
    fn variadic(&mut self, head: &str) -> Result<Vec<RuleExpr>, Error> {
        let mut items = Vec::new();
        while self.peek().is_some() && self.peek() != Some(&Token::RParen) {
            items.push(self.parse_expr()?);
        }
        self.expect_rparen()?;
        if items.is_empty() {
            return Err(Error::Malformed(format!("({head}) needs at least one expression")));
        }
        Ok(items)
    }

    /// `(rep k e)` where `k` is `n`, `(max)`, or `(min max)`.
    fn parse_rep(&mut self) -> Result<RuleExpr, Error> {
        let bounds = match self.advance() {
            Some(Token::IntLit(n)) => {
                let n = usize::try_from(n)
                    .map_err(|_| Error::IllegalRepetition(format!("negative count {n}")))?;
                RepBounds::exactly(n)
            }
            Some(Token::LParen) => {
                let first = self.rep_bound()?;
                match self.advance() {
                    Some(Token::RParen) => RepBounds::at_most(first),
                    Some(Token::IntLit(n)) => {
                        let max = usize::try_from(n)
                            .map_err(|_| Error::IllegalRepetition(format!("negative bound {n}")))?;
                        if self.advance() != Some(Token::RParen) {
                            return Err(Error::IllegalRepetition(
                                "bounds must be a 1- or 2-element list".to_string(),
                            ));
                        }
                        RepBounds::between(first, max)?
                    }
                    _ => {
                        return Err(Error::IllegalRepetition(
                            "bounds must be a 1- or 2-element list".to_string(),
                        ));
                    }
                }
            }
            _ => {
                return Err(Error::IllegalRepetition(
                    "expected a count or a bounds list".to_string(),
                ));
            }
        };
        let inner = self.parse_expr()?;
        self.expect_rparen()?;
        Ok(RuleExpr::Rep(bounds, Box::new(inner)))
    }

    fn rep_bound(&mut self) -> Result<usize, Error> {
        match self.advance() {
            Some(Token::IntLit(n)) => usize::try_from(n)
                .map_err(|_| Error::IllegalRepetition(format!("negative bound {n}"))),
            _ => Err(Error::IllegalRepetition(
                "bounds must be integers".to_string(),
            )),
        }
    }

    /// `[n …]` — vector literals hold numbers only.
    fn parse_vector_literal(&mut self) -> Result<RuleExpr, Error> {
        let mut items = Vec::new();
        loop {
            match self.advance() {
                Some(Token::RBracket) => return Ok(RuleExpr::Vector(items)),
                Some(Token::IntLit(n)) => items.push(Value::Int(n)),
                Some(Token::FloatLit(x)) => items.push(Value::Float(x)),
                Some(tok) => {
                    return Err(Error::Malformed(format!(
                        "vector literals hold numbers only, found {tok:?}"
                    )));
                }
                None => return Err(Error::Malformed("unterminated vector literal".to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::expr_summary;

    fn parse(text: &str) -> RuleExpr {
        parse_expr(text).unwrap()
    }

    #[test]
    fn parse_symbol_literal() {
        assert_eq!(parse("'hey"), RuleExpr::Sym("hey".to_string()));
    }

    #[test]
    fn parse_wildcards() {
        assert_eq!(parse("char"), RuleExpr::AnyChar);
        assert_eq!(parse("byte"), RuleExpr::AnyByte);
        assert_eq!(parse("form"), RuleExpr::AnyForm);
        assert_eq!(parse("list"), RuleExpr::AnyList);
        assert_eq!(parse("string"), RuleExpr::AnyStr);
    }

    #[test]
    fn parse_rule_reference() {
        assert_eq!(parse("digits"), RuleExpr::Call("digits".to_string(), vec![]));
    }

    #[test]
    fn parse_call_with_args() {
        let expr = parse("(greet 'you 42)");
        assert_eq!(
            expr,
            RuleExpr::Call(
                "greet".to_string(),
                vec![RuleExpr::Sym("you".to_string()), RuleExpr::Int(42)],
            )
        );
    }

    #[test]
    fn parse_ordered_sequence() {
        let expr = parse("(and 'a 'b 'c)");
        match expr {
            RuleExpr::And(items) => assert_eq!(items.len(), 3),
            other => panic!("expected And, got {}", expr_summary(&other)),
        }
    }

    #[test]
    fn parse_nested_combinators() {
        let expr = parse("(or 'a (and 'b (* char)))");
        match expr {
            RuleExpr::Or(alts) => {
                assert_eq!(alts.len(), 2);
                match &alts[1] {
                    RuleExpr::And(items) => {
                        assert_eq!(items.len(), 2);
                        assert!(matches!(&items[1], RuleExpr::Star(inner)
                            if **inner == RuleExpr::AnyChar));
                    }
                    other => panic!("expected And, got {}", expr_summary(other)),
                }
            }
            other => panic!("expected Or, got {}", expr_summary(&other)),
        }
    }

    #[test]
    fn parse_unordered_sequence() {
        let expr = parse("(and~ 'a 'b)");
        assert!(matches!(expr, RuleExpr::AndUnordered(items) if items.len() == 2));
    }

    #[test]
    fn parse_predicates() {
        assert!(matches!(parse("(& 'a)"), RuleExpr::Ahead(_)));
        assert!(matches!(parse("(! 'a)"), RuleExpr::BehindNot(_)));
        assert!(matches!(parse("(not 'a)"), RuleExpr::Not(_)));
        assert!(matches!(parse("(? 'a)"), RuleExpr::Opt(_)));
    }

    #[test]
    fn parse_typed_descents() {
        assert!(matches!(parse("(list (* form))"), RuleExpr::DescendList(_)));
        assert!(matches!(parse("(string (+ char))"), RuleExpr::DescendStr(_)));
        assert!(matches!(parse("(vector (* number))"), RuleExpr::DescendVector(_)));
    }

    #[test]
    fn parse_rep_shapes() {
        assert_eq!(
            parse("(rep 3 byte)"),
            RuleExpr::Rep(RepBounds::exactly(3), Box::new(RuleExpr::AnyByte)),
        );
        assert_eq!(
            parse("(rep (4) byte)"),
            RuleExpr::Rep(RepBounds::at_most(4), Box::new(RuleExpr::AnyByte)),
        );
        assert_eq!(
            parse("(rep (2 4) byte)"),
            RuleExpr::Rep(RepBounds::between(2, 4).unwrap(), Box::new(RuleExpr::AnyByte)),
        );
    }

    #[test]
    fn parse_rep_bad_bounds() {
        assert!(matches!(
            parse_expr("(rep 'a byte)"),
            Err(Error::IllegalRepetition(_))
        ));
        assert!(matches!(
            parse_expr("(rep (1 2 3) byte)"),
            Err(Error::IllegalRepetition(_))
        ));
        assert!(matches!(
            parse_expr("(rep -1 byte)"),
            Err(Error::IllegalRepetition(_))
        ));
        assert!(matches!(
            parse_expr("(rep (4 2) byte)"),
            Err(Error::IllegalRepetition(_))
        ));
    }

    #[test]
    fn parse_vector_literal_numbers() {
        assert_eq!(
            parse("[1 2.5 -3]"),
            RuleExpr::Vector(vec![Value::Int(1), Value::Float(2.5), Value::Int(-3)]),
        );
    }

    #[test]
    fn parse_vector_literal_rejects_non_numbers() {
        assert!(matches!(parse_expr("['a]"), Err(Error::Malformed(_))));
    }

    #[test]
    fn parse_empty_choice_fails() {
        assert!(matches!(parse_expr("(or)"), Err(Error::Malformed(_))));
        assert!(matches!(parse_expr("(and)"), Err(Error::Malformed(_))));
    }

    #[test]
    fn parse_reserved_head_fails() {
        assert!(matches!(parse_expr("(char)"), Err(Error::Malformed(_))));
    }

    #[test]
    fn parse_trailing_input_fails() {
        assert!(matches!(parse_expr("'a 'b"), Err(Error::Malformed(_))));
    }

    #[test]
    fn parse_unterminated_form_fails() {
        assert!(matches!(parse_expr("(and 'a"), Err(Error::Malformed(_))));
    }

    #[test]
    fn summary_round_trip() {
        for text in [
            "'hey",
            "(and 'a (or 'b 'c))",
            "(and~ 'a 'b)",
            "(* char)",
            "(+ byte)",
            "(? 'a)",
            "(& 'a)",
            "(! 'a)",
            "(not 'a)",
            "(rep 3 byte)",
            "(rep (2 4) byte)",
            "(list (* form))",
            "(string (+ char))",
            "(greet 'you)",
            "[1 2 3]",
        ] {
            let expr = parse(text);
            assert_eq!(expr_summary(&expr), text, "round trip failed for {text}");
            assert_eq!(parse(&expr_summary(&expr)), expr);
        }
    }
}
