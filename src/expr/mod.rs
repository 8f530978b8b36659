//! Custom formula models.
//!
//! Turns a user-supplied algebraic formula such as `a*x**2 + b*x + c` into a
//! callable model. The formula may reference the variable `x`, numeric
//! literals, the constant `pi`, a fixed whitelist of elementary functions,
//! and single lowercase letters as free parameters. Parameters are bound in
//! the order their letters first appear, left to right.
//!
//! Unlike the usual "evaluate the string in a restricted namespace" shortcut,
//! the formula is parsed into a small AST and evaluated directly. Nothing
//! outside the grammar below can execute, so there is no injection surface:
//!
//! ```text
//! expr   := term  (('+' | '-') term)*
//! term   := unary (('*' | '/') unary)*
//! unary  := ('+' | '-') unary | power
//! power  := atom  (('**' | '^') unary)?        (right-associative)
//! atom   := number | 'x' | letter | 'pi' | func '(' expr ')' | '(' expr ')'
//! ```

use crate::error::{FitError, FitErrorKind};

/// Whitelisted elementary functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathFn {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Log10,
    Sqrt,
    Abs,
}

impl MathFn {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "sin" => MathFn::Sin,
            "cos" => MathFn::Cos,
            "tan" => MathFn::Tan,
            "asin" => MathFn::Asin,
            "acos" => MathFn::Acos,
            "atan" => MathFn::Atan,
            "sinh" => MathFn::Sinh,
            "cosh" => MathFn::Cosh,
            "tanh" => MathFn::Tanh,
            "exp" => MathFn::Exp,
            "ln" => MathFn::Ln,
            "log10" => MathFn::Log10,
            "sqrt" => MathFn::Sqrt,
            "abs" => MathFn::Abs,
            _ => return None,
        })
    }

    fn apply(self, v: f64) -> f64 {
        match self {
            MathFn::Sin => v.sin(),
            MathFn::Cos => v.cos(),
            MathFn::Tan => v.tan(),
            MathFn::Asin => v.asin(),
            MathFn::Acos => v.acos(),
            MathFn::Atan => v.atan(),
            MathFn::Sinh => v.sinh(),
            MathFn::Cosh => v.cosh(),
            MathFn::Tanh => v.tanh(),
            MathFn::Exp => v.exp(),
            MathFn::Ln => v.ln(),
            MathFn::Log10 => v.log10(),
            MathFn::Sqrt => v.sqrt(),
            MathFn::Abs => v.abs(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Number(f64),
    Variable,
    Param(usize),
    Neg(Box<Node>),
    Binary(BinOp, Box<Node>, Box<Node>),
    Call(MathFn, Box<Node>),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

/// A compiled custom model: the parsed formula plus its discovered parameters.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    source: String,
    ast: Node,
    params: Vec<char>,
}

impl CompiledExpression {
    /// Parse and validate a formula.
    ///
    /// Fails with an [`FitErrorKind::Expression`] error when the formula is
    /// empty, malformed, references a name outside the whitelist, or declares
    /// no free parameters.
    pub fn compile(source: &str) -> Result<Self, FitError> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(expr_error(
                "Enter a custom expression, e.g. a*x**2 + b*x + c",
            ));
        }

        let tokens = lex(trimmed)?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            params: Vec::new(),
        };
        let ast = parser.parse_expr()?;
        if parser.pos != parser.tokens.len() {
            return Err(expr_error("Unexpected trailing input in expression."));
        }
        if parser.params.is_empty() {
            return Err(expr_error(
                "Expression has no free parameters to fit (use letters a, b, c, ...).",
            ));
        }

        Ok(Self {
            source: trimmed.to_string(),
            ast,
            params: parser.params,
        })
    }

    /// The raw formula text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Result label: `Custom: <formula>`.
    pub fn display_label(&self) -> String {
        format!("Custom: {}", self.source)
    }

    /// Parameter names in first-appearance order.
    pub fn param_names(&self) -> Vec<String> {
        self.params.iter().map(|c| c.to_string()).collect()
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Evaluate the formula at `x` with the given parameter values.
    ///
    /// `params.len()` must equal [`CompiledExpression::param_count`].
    pub fn eval(&self, x: f64, params: &[f64]) -> f64 {
        debug_assert_eq!(params.len(), self.params.len());
        eval_node(&self.ast, x, params)
    }
}

fn eval_node(node: &Node, x: f64, params: &[f64]) -> f64 {
    match node {
        Node::Number(v) => *v,
        Node::Variable => x,
        Node::Param(i) => params[*i],
        Node::Neg(inner) => -eval_node(inner, x, params),
        Node::Binary(op, lhs, rhs) => {
            let l = eval_node(lhs, x, params);
            let r = eval_node(rhs, x, params);
            match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => l / r,
                BinOp::Pow => l.powf(r),
            }
        }
        Node::Call(f, inner) => f.apply(eval_node(inner, x, params)),
    }
}

fn expr_error(message: impl Into<String>) -> FitError {
    FitError::new(FitErrorKind::Expression, message)
}

fn lex(source: &str) -> Result<Vec<Token>, FitError> {
    let chars: Vec<char> = source.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                if chars.get(i + 1) == Some(&'*') {
                    tokens.push(Token::Caret);
                    i += 2;
                } else {
                    tokens.push(Token::Star);
                    i += 1;
                }
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Caret);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            _ if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Optional exponent: only consume 'e'/'E' when it actually
                // starts an exponent, otherwise it is a parameter letter.
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        i = j;
                        while i < chars.len() && chars[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text.parse::<f64>().map_err(|_| {
                    expr_error(format!("Invalid numeric literal '{text}'."))
                })?;
                tokens.push(Token::Number(value));
            }
            _ if c.is_ascii_alphabetic() => {
                let start = i;
                while i < chars.len()
                    && (chars[i].is_ascii_alphabetic() || chars[i].is_ascii_digit())
                {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            _ => {
                return Err(expr_error(format!(
                    "Unexpected character '{c}' in expression."
                )));
            }
        }
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    /// Parameter letters in first-appearance order. Filled in during parsing;
    /// the parser consumes tokens left to right, so discovery order matches
    /// textual order.
    params: Vec<char>,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<(), FitError> {
        if self.peek() == Some(&token) {
            self.pos += 1;
            Ok(())
        } else {
            Err(expr_error(format!("Expected {what} in expression.")))
        }
    }

    fn parse_expr(&mut self) -> Result<Node, FitError> {
        let mut node = self.parse_term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    let rhs = self.parse_term()?;
                    node = Node::Binary(BinOp::Add, Box::new(node), Box::new(rhs));
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    let rhs = self.parse_term()?;
                    node = Node::Binary(BinOp::Sub, Box::new(node), Box::new(rhs));
                }
                _ => return Ok(node),
            }
        }
    }

    fn parse_term(&mut self) -> Result<Node, FitError> {
        let mut node = self.parse_unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    let rhs = self.parse_unary()?;
                    node = Node::Binary(BinOp::Mul, Box::new(node), Box::new(rhs));
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.parse_unary()?;
                    node = Node::Binary(BinOp::Div, Box::new(node), Box::new(rhs));
                }
                _ => return Ok(node),
            }
        }
    }

    fn parse_unary(&mut self) -> Result<Node, FitError> {
        match self.peek() {
            Some(Token::Plus) => {
                self.pos += 1;
                self.parse_unary()
            }
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Node::Neg(Box::new(self.parse_unary()?)))
            }
            _ => self.parse_power(),
        }
    }

    fn parse_power(&mut self) -> Result<Node, FitError> {
        let base = self.parse_atom()?;
        if self.peek() == Some(&Token::Caret) {
            self.pos += 1;
            // Right-associative, and the exponent may carry a unary sign.
            let exponent = self.parse_unary()?;
            return Ok(Node::Binary(
                BinOp::Pow,
                Box::new(base),
                Box::new(exponent),
            ));
        }
        Ok(base)
    }

    fn parse_atom(&mut self) -> Result<Node, FitError> {
        match self.bump() {
            Some(Token::Number(v)) => Ok(Node::Number(v)),
            Some(Token::LParen) => {
                let inner = self.parse_expr()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => self.resolve_ident(&name),
            _ => Err(expr_error("Expected a value in expression.")),
        }
    }

    fn resolve_ident(&mut self, name: &str) -> Result<Node, FitError> {
        if name == "x" {
            return Ok(Node::Variable);
        }
        if name == "pi" {
            return Ok(Node::Number(std::f64::consts::PI));
        }
        if let Some(func) = MathFn::from_name(name) {
            self.expect(Token::LParen, &format!("'(' after {name}"))?;
            let arg = self.parse_expr()?;
            self.expect(Token::RParen, "')'")?;
            return Ok(Node::Call(func, Box::new(arg)));
        }

        let mut letters = name.chars();
        let letter = letters.next().unwrap_or('?');
        if letters.next().is_none() && letter.is_ascii_lowercase() {
            let index = match self.params.iter().position(|&p| p == letter) {
                Some(i) => i,
                None => {
                    self.params.push(letter);
                    self.params.len() - 1
                }
            };
            return Ok(Node::Param(index));
        }

        Err(expr_error(format!(
            "Unknown name '{name}' in expression (allowed: x, pi, single-letter \
             parameters, and elementary functions)."
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_bind_in_first_appearance_order() {
        let e = CompiledExpression::compile("b*x + a").unwrap();
        assert_eq!(e.param_names(), vec!["b", "a"]);
    }

    #[test]
    fn function_letters_are_not_parameters() {
        let e = CompiledExpression::compile("a*sin(pi*x)").unwrap();
        assert_eq!(e.param_names(), vec!["a"]);
        let v = e.eval(0.5, &[2.0]);
        assert!((v - 2.0).abs() < 1e-12);
    }

    #[test]
    fn quadratic_evaluates_correctly() {
        let e = CompiledExpression::compile("a*x**2 + b*x + c").unwrap();
        assert_eq!(e.param_names(), vec!["a", "b", "c"]);
        let v = e.eval(2.0, &[1.0, 2.0, 3.0]);
        assert!((v - 11.0).abs() < 1e-12);
    }

    #[test]
    fn caret_is_power_too() {
        let e = CompiledExpression::compile("a*x^2").unwrap();
        assert!((e.eval(3.0, &[2.0]) - 18.0).abs() < 1e-12);
    }

    #[test]
    fn unary_minus_and_power_precedence() {
        // -x**2 must parse as -(x**2), and the exponent may be signed.
        let e = CompiledExpression::compile("a - x**2").unwrap();
        assert!((e.eval(3.0, &[0.0]) + 9.0).abs() < 1e-12);

        let e = CompiledExpression::compile("a*x**-1").unwrap();
        assert!((e.eval(4.0, &[2.0]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn scientific_literals_do_not_shadow_the_e_parameter() {
        let e = CompiledExpression::compile("1e-2*a*x + e").unwrap();
        assert_eq!(e.param_names(), vec!["a", "e"]);
        let v = e.eval(10.0, &[3.0, 0.5]);
        assert!((v - 0.8).abs() < 1e-12);
    }

    #[test]
    fn constant_expression_has_no_free_parameters() {
        let err = CompiledExpression::compile("3*x + 1").unwrap_err();
        assert_eq!(err.kind(), FitErrorKind::Expression);
    }

    #[test]
    fn empty_expression_is_rejected() {
        let err = CompiledExpression::compile("   ").unwrap_err();
        assert_eq!(err.kind(), FitErrorKind::Expression);
    }

    #[test]
    fn disallowed_names_are_rejected() {
        for bad in ["foo(x)", "np.exp(x)*a", "A*x", "__import__(x)"] {
            let err = CompiledExpression::compile(bad).unwrap_err();
            assert_eq!(err.kind(), FitErrorKind::Expression, "expr: {bad}");
        }
    }

    #[test]
    fn malformed_expressions_are_rejected() {
        for bad in ["a*", "(a*x", "a x", "a**", "sin x * a"] {
            assert!(
                CompiledExpression::compile(bad).is_err(),
                "should reject: {bad}"
            );
        }
    }

    #[test]
    fn division_and_parens() {
        let e = CompiledExpression::compile("(a + b) / (x - 1)").unwrap();
        assert_eq!(e.param_names(), vec!["a", "b"]);
        assert!((e.eval(3.0, &[1.0, 3.0]) - 2.0).abs() < 1e-12);
    }
}
