//! The statement tree the builder consumes. Front ends hand us this shape;
//! everything here is structural, there is no name resolution or typing.

use lumir_core::OpCode;

/// What a literal token carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Number,
    Str,
    Bool,
}

/// Binary operators the source language exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinaryOp {
    /// Map a source-level operator token to its AST operator. Unknown
    /// tokens are a front-end bug, so the caller gets `None` rather than a
    /// silent default.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        Some(match symbol {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Mod,
            "==" => Self::Eq,
            "!=" => Self::Ne,
            "<" => Self::Lt,
            "<=" => Self::Le,
            ">" => Self::Gt,
            ">=" => Self::Ge,
            "&&" => Self::And,
            "||" => Self::Or,
            "&" => Self::BitAnd,
            "|" => Self::BitOr,
            "^" => Self::BitXor,
            "<<" => Self::Shl,
            ">>" => Self::Shr,
            _ => return None,
        })
    }

    pub fn opcode(self) -> OpCode {
        match self {
            Self::Add => OpCode::Add,
            Self::Sub => OpCode::Sub,
            Self::Mul => OpCode::Mul,
            Self::Div => OpCode::Div,
            Self::Mod => OpCode::Mod,
            Self::Eq => OpCode::Eq,
            Self::Ne => OpCode::Ne,
            Self::Lt => OpCode::Lt,
            Self::Le => OpCode::Le,
            Self::Gt => OpCode::Gt,
            Self::Ge => OpCode::Ge,
            Self::And => OpCode::And,
            Self::Or => OpCode::Or,
            Self::BitAnd => OpCode::BitAnd,
            Self::BitOr => OpCode::BitOr,
            Self::BitXor => OpCode::BitXor,
            Self::Shl => OpCode::Shl,
            Self::Shr => OpCode::Shr,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

impl UnaryOp {
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "-" => Some(Self::Neg),
            "!" => Some(Self::Not),
            _ => None,
        }
    }

    /// Negation shares the `sub` tag; the backend emits `neg` for a unary
    /// instruction carrying it.
    pub fn opcode(self) -> OpCode {
        match self {
            Self::Neg => OpCode::Sub,
            Self::Not => OpCode::Not,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal {
        kind: LiteralKind,
        value: String,
    },
    Identifier {
        name: String,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Assign {
        name: String,
        value: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: String,
    },
    Grouping(Box<Expr>),
}

impl Expr {
    pub fn number(value: impl Into<String>) -> Self {
        Expr::Literal {
            kind: LiteralKind::Number,
            value: value.into(),
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Literal {
            kind: LiteralKind::Str,
            value: value.into(),
        }
    }

    pub fn boolean(value: bool) -> Self {
        Expr::Literal {
            kind: LiteralKind::Bool,
            value: if value { "1".into() } else { "0".into() },
        }
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Expr::Identifier { name: name.into() }
    }

    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            args,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression(Expr),
    Print(Expr),
    Var {
        name: String,
        ty: Option<String>,
        init: Option<Expr>,
    },
    Const {
        name: String,
        ty: Option<String>,
        init: Option<Expr>,
    },
    Function {
        name: String,
        params: Vec<String>,
        body: Box<Stmt>,
    },
    Return(Option<Expr>),
    Block(Vec<Stmt>),
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<Box<Stmt>>,
        condition: Expr,
        increment: Option<Expr>,
        body: Box<Stmt>,
    },
    Struct {
        name: String,
    },
    Class {
        name: String,
    },
}
