//! Defines the Abstract Syntax Tree (AST) for report expressions.

use crate::functions::Function;
use banded_types::{FieldSlot, ParameterSlot, Value, VariableSlot};
use std::fmt;

/// The namespace a reference is written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    Field,
    Variable,
    Parameter,
    Builtin,
}

impl RefKind {
    pub fn name(self) -> &'static str {
        match self {
            RefKind::Field => "field",
            RefKind::Variable => "variable",
            RefKind::Parameter => "parameter",
            RefKind::Builtin => "builtin",
        }
    }
}

/// Values maintained by the engine rather than declared by the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    PageNumber,
    PageCount,
    ColumnNumber,
    RowCount,
}

impl Builtin {
    pub const ALL: [Builtin; 4] = [
        Builtin::PageNumber,
        Builtin::PageCount,
        Builtin::ColumnNumber,
        Builtin::RowCount,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::PageNumber => "PAGE_NUMBER",
            Builtin::PageCount => "PAGE_COUNT",
            Builtin::ColumnNumber => "COLUMN_NUMBER",
            Builtin::RowCount => "ROW_COUNT",
        }
    }

    /// `REPORT_COUNT` is accepted as an alias of `ROW_COUNT`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "PAGE_NUMBER" => Some(Builtin::PageNumber),
            "PAGE_COUNT" => Some(Builtin::PageCount),
            "COLUMN_NUMBER" => Some(Builtin::ColumnNumber),
            "ROW_COUNT" | "REPORT_COUNT" => Some(Builtin::RowCount),
            _ => None,
        }
    }
}

/// What a reference resolved to. Parsing produces `Unresolved`; the template
/// layer rewrites every reference into a slot before anything is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    Unresolved,
    Field(FieldSlot),
    Variable(VariableSlot),
    Parameter(ParameterSlot),
    Builtin(Builtin),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub kind: RefKind,
    pub name: String,
    pub binding: Binding,
}

impl Reference {
    pub fn new(kind: RefKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            binding: Binding::Unresolved,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.binding != Binding::Unresolved
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RefKind::Field => write!(f, "$F{{{}}}", self.name),
            RefKind::Variable => write!(f, "$V{{{}}}", self.name),
            RefKind::Parameter => write!(f, "$P{{{}}}", self.name),
            RefKind::Builtin => write!(f, "builtin:{}", self.name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Minus,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Or,
    And,
    Equals,
    NotEquals,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOperator {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Or => "or",
            BinaryOperator::And => "and",
            BinaryOperator::Equals => "==",
            BinaryOperator::NotEquals => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::Plus => "+",
            BinaryOperator::Minus => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    Reference(Reference),
    Unary {
        op: UnaryOperator,
        expr: Box<Expression>,
    },
    Binary {
        left: Box<Expression>,
        op: BinaryOperator,
        right: Box<Expression>,
    },
    Conditional {
        condition: Box<Expression>,
        then_branch: Box<Expression>,
        else_branch: Box<Expression>,
    },
    /// `function` is `None` when the name is not in the built-in table; the
    /// validator reports it and evaluation refuses it.
    Call {
        name: String,
        function: Option<Function>,
        args: Vec<Expression>,
    },
}

impl Expression {
    /// Visits every reference in evaluation order.
    pub fn for_each_reference<'a>(&'a self, f: &mut impl FnMut(&'a Reference)) {
        match self {
            Expression::Literal(_) => {}
            Expression::Reference(r) => f(r),
            Expression::Unary { expr, .. } => expr.for_each_reference(f),
            Expression::Binary { left, right, .. } => {
                left.for_each_reference(f);
                right.for_each_reference(f);
            }
            Expression::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.for_each_reference(f);
                then_branch.for_each_reference(f);
                else_branch.for_each_reference(f);
            }
            Expression::Call { args, .. } => {
                for arg in args {
                    arg.for_each_reference(f);
                }
            }
        }
    }

    pub fn for_each_reference_mut(&mut self, f: &mut impl FnMut(&mut Reference)) {
        match self {
            Expression::Literal(_) => {}
            Expression::Reference(r) => f(r),
            Expression::Unary { expr, .. } => expr.for_each_reference_mut(f),
            Expression::Binary { left, right, .. } => {
                left.for_each_reference_mut(f);
                right.for_each_reference_mut(f);
            }
            Expression::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.for_each_reference_mut(f);
                then_branch.for_each_reference_mut(f);
                else_branch.for_each_reference_mut(f);
            }
            Expression::Call { args, .. } => {
                for arg in args {
                    arg.for_each_reference_mut(f);
                }
            }
        }
    }

    /// Visits every function call, outermost first.
    pub fn for_each_call<'a>(&'a self, f: &mut impl FnMut(&'a Expression)) {
        match self {
            Expression::Literal(_) | Expression::Reference(_) => {}
            Expression::Unary { expr, .. } => expr.for_each_call(f),
            Expression::Binary { left, right, .. } => {
                left.for_each_call(f);
                right.for_each_call(f);
            }
            Expression::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                condition.for_each_call(f);
                then_branch.for_each_call(f);
                else_branch.for_each_call(f);
            }
            Expression::Call { args, .. } => {
                f(self);
                for arg in args {
                    arg.for_each_call(f);
                }
            }
        }
    }

    pub fn references_builtin(&self, builtin: Builtin) -> bool {
        let mut found = false;
        self.for_each_reference(&mut |r| {
            if (r.kind == RefKind::Builtin && Builtin::from_name(&r.name) == Some(builtin))
                || r.binding == Binding::Builtin(builtin)
            {
                found = true;
            }
        });
        found
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => f.write_str("null"),
        Value::String(s) => {
            f.write_str("\"")?;
            for c in s.chars() {
                match c {
                    '"' => f.write_str("\\\"")?,
                    '\\' => f.write_str("\\\\")?,
                    '\n' => f.write_str("\\n")?,
                    '\t' => f.write_str("\\t")?,
                    other => write!(f, "{}", other)?,
                }
            }
            f.write_str("\"")
        }
        Value::Date(d) => write!(f, "date(\"{}\")", d.format("%Y-%m-%d")),
        other => write!(f, "{}", other),
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Literal(v) => write_literal(f, v),
            Expression::Reference(r) => write!(f, "{}", r),
            Expression::Unary {
                op: UnaryOperator::Minus,
                expr,
            } => write!(f, "-{}", expr),
            Expression::Unary {
                op: UnaryOperator::Not,
                expr,
            } => write!(f, "!{}", expr),
            Expression::Binary { left, op, right } => {
                write!(f, "({} {} {})", left, op.symbol(), right)
            }
            Expression::Conditional {
                condition,
                then_branch,
                else_branch,
            } => write!(f, "({} ? {} : {})", condition, then_branch, else_branch),
            Expression::Call { name, args, .. } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}
