//! The embedded expression sub-language.
//!
//! Template bodies embed expressions inside `${...}` delimiters: variable
//! references with member/index access, literals, operators with
//! conventional precedence, and function calls. Call names may be dotted
//! (`lg.greet`) and may carry a trailing `!` re-execution marker.
//!
//! The public entry point is [`Expression::parse`].

mod parser;

use std::fmt;

/// A parsed expression together with its original source text.
///
/// The source text is kept for error messages and analyzer output.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    text: String,
    kind: ExprKind,
}

impl Expression {
    /// Parse an expression from its source text.
    ///
    /// # Errors
    ///
    /// Returns a rendered syntax error message when the text is not a
    /// valid expression.
    pub fn parse(text: impl Into<String>) -> Result<Expression, String> {
        let text = text.into();
        let kind = parser::parse_expr_text(&text)?;
        Ok(Expression { text, kind })
    }

    /// The original source text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The parsed syntax tree.
    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    /// Visit every node of the syntax tree in pre-order.
    pub fn walk(&self, f: &mut impl FnMut(&ExprKind)) {
        self.kind.walk(f);
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}}}", self.text)
    }
}

/// An expression syntax tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A literal constant.
    Literal(Lit),
    /// A variable reference by name.
    Var(String),
    /// Member access: `base.field`.
    Member(Box<ExprKind>, String),
    /// Index access: `base[index]`.
    Index(Box<ExprKind>, Box<ExprKind>),
    /// A function or template call. The name may be dotted and may end
    /// with the `!` re-execution marker.
    Call { name: String, args: Vec<ExprKind> },
    /// A unary operation.
    Unary { op: UnaryOp, operand: Box<ExprKind> },
    /// A binary operation.
    Binary {
        op: BinaryOp,
        left: Box<ExprKind>,
        right: Box<ExprKind>,
    },
}

impl ExprKind {
    pub(crate) fn binary(op: BinaryOp, left: ExprKind, right: ExprKind) -> ExprKind {
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Visit this node and all children in pre-order.
    pub fn walk(&self, f: &mut impl FnMut(&ExprKind)) {
        f(self);
        match self {
            ExprKind::Literal(_) | ExprKind::Var(_) => {}
            ExprKind::Member(base, _) => base.walk(f),
            ExprKind::Index(base, index) => {
                base.walk(f);
                index.walk(f);
            }
            ExprKind::Call { args, .. } => {
                for arg in args {
                    arg.walk(f);
                }
            }
            ExprKind::Unary { operand, .. } => operand.walk(f),
            ExprKind::Binary { left, right, .. } => {
                left.walk(f);
                right.walk(f);
            }
        }
    }

    /// The dotted variable path this node denotes, if it is a pure
    /// variable/member chain (`user.address.city`).
    pub fn var_path(&self) -> Option<String> {
        match self {
            ExprKind::Var(name) => Some(name.clone()),
            ExprKind::Member(base, field) => {
                base.var_path().map(|path| format!("{}.{}", path, field))
            }
            _ => None,
        }
    }
}

/// A unary operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// Logical negation `!`.
    Not,
    /// Arithmetic negation `-`.
    Neg,
}

/// A binary operator, in increasing precedence group order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

/// A literal constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
}
