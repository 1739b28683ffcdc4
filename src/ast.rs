//! Syntax tree for Obsidian programs.
//!
//! One enum covers both expression and statement forms. Every node owns its
//! children, so dropping the root tears the whole tree down.

use std::fmt;

/// A non-empty type name, either a primitive keyword or a user type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeName(String);

pub const PRIMITIVE_TYPES: [&str; 14] = [
    "i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "f32", "f64", "bool", "char", "string",
    "void",
];

impl TypeName {
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        if name.is_empty() {
            None
        } else {
            Some(Self(name))
        }
    }

    pub fn void() -> Self {
        Self("void".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_primitive(&self) -> bool {
        PRIMITIVE_TYPES.contains(&self.0.as_str())
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    ShiftLeft,
    ShiftRight,
    BitAnd,
    BitOr,
    BitXor,
    LogicalAnd,
    LogicalOr,
    LogicalXor,
    Comma,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Power => "**",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::LogicalOr => "||",
            BinaryOp::LogicalXor => "^^",
            BinaryOp::Comma => ",",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Plus,
    Not,
    BitNot,
    PreIncrement,
    PreDecrement,
    AddressOf,
    Deref,
    PostIncrement,
    PostDecrement,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Negate => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
            UnaryOp::PreIncrement | UnaryOp::PostIncrement => "++",
            UnaryOp::PreDecrement | UnaryOp::PostDecrement => "--",
            UnaryOp::AddressOf => "&",
            UnaryOp::Deref => "*",
        }
    }

    pub fn is_postfix(&self) -> bool {
        matches!(self, UnaryOp::PostIncrement | UnaryOp::PostDecrement)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubtractAssign,
    MultiplyAssign,
    DivideAssign,
}

impl AssignOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubtractAssign => "-=",
            AssignOp::MultiplyAssign => "*=",
            AssignOp::DivideAssign => "/=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ty: TypeName,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    // Expressions
    IntLiteral(i64),
    FloatLiteral(f64),
    BoolLiteral(bool),
    CharLiteral(char),
    StringLiteral(String),
    Identifier(String),
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Assign {
        op: AssignOp,
        name: String,
        value: Box<Node>,
    },
    Ternary {
        condition: Box<Node>,
        then: Box<Node>,
        otherwise: Box<Node>,
    },
    Println(Box<Node>),
    Length(Box<Node>),
    TypeOf(Box<Node>),
    Alloc(Box<Node>),
    Dealloc(Box<Node>),
    SizeOf(TypeName),
    /// Body is always a `Block`.
    Unsafe(Box<Node>),
    Cast {
        expr: Box<Node>,
        ty: TypeName,
    },

    // Statements
    FunctionCall {
        name: String,
        args: Vec<Node>,
    },
    Block(Vec<Node>),
    FunctionDef {
        name: String,
        return_type: TypeName,
        params: Vec<Param>,
        body: Box<Node>,
    },
    Return(Option<Box<Node>>),
    VarDecl {
        ty: TypeName,
        name: String,
        value: Option<Box<Node>>,
    },
    If {
        condition: Box<Node>,
        then_branch: Box<Node>,
        else_branch: Option<Box<Node>>,
    },
    While {
        condition: Box<Node>,
        body: Box<Node>,
    },
    For {
        init: Option<Box<Node>>,
        condition: Option<Box<Node>>,
        increment: Option<Box<Node>>,
        body: Box<Node>,
    },
}

impl Node {
    pub fn int(value: i64) -> Self {
        Node::IntLiteral(value)
    }

    pub fn float(value: f64) -> Self {
        Node::FloatLiteral(value)
    }

    pub fn boolean(value: bool) -> Self {
        Node::BoolLiteral(value)
    }

    pub fn character(value: char) -> Self {
        Node::CharLiteral(value)
    }

    pub fn string(value: impl Into<String>) -> Self {
        Node::StringLiteral(value.into())
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Node::Identifier(name.into())
    }

    pub fn binary(op: BinaryOp, left: Node, right: Node) -> Self {
        Node::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Node) -> Self {
        Node::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn assign(op: AssignOp, name: impl Into<String>, value: Node) -> Self {
        Node::Assign {
            op,
            name: name.into(),
            value: Box::new(value),
        }
    }

    pub fn ternary(condition: Node, then: Node, otherwise: Node) -> Self {
        Node::Ternary {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        }
    }

    pub fn println(expr: Node) -> Self {
        Node::Println(Box::new(expr))
    }

    pub fn length(expr: Node) -> Self {
        Node::Length(Box::new(expr))
    }

    pub fn type_of(expr: Node) -> Self {
        Node::TypeOf(Box::new(expr))
    }

    pub fn alloc(size: Node) -> Self {
        Node::Alloc(Box::new(size))
    }

    pub fn dealloc(pointer: Node) -> Self {
        Node::Dealloc(Box::new(pointer))
    }

    pub fn size_of(ty: TypeName) -> Self {
        Node::SizeOf(ty)
    }

    pub fn unsafe_block(statements: Vec<Node>) -> Self {
        Node::Unsafe(Box::new(Node::Block(statements)))
    }

    pub fn cast(expr: Node, ty: TypeName) -> Self {
        Node::Cast {
            expr: Box::new(expr),
            ty,
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Node>) -> Self {
        Node::FunctionCall {
            name: name.into(),
            args,
        }
    }

    pub fn block(statements: Vec<Node>) -> Self {
        Node::Block(statements)
    }

    pub fn function_def(
        name: impl Into<String>,
        return_type: TypeName,
        params: Vec<Param>,
        body: Vec<Node>,
    ) -> Self {
        Node::FunctionDef {
            name: name.into(),
            return_type,
            params,
            body: Box::new(Node::Block(body)),
        }
    }

    pub fn return_stmt(value: Option<Node>) -> Self {
        Node::Return(value.map(Box::new))
    }

    pub fn var_decl(ty: TypeName, name: impl Into<String>, value: Option<Node>) -> Self {
        Node::VarDecl {
            ty,
            name: name.into(),
            value: value.map(Box::new),
        }
    }

    pub fn if_stmt(condition: Node, then_branch: Node, else_branch: Option<Node>) -> Self {
        Node::If {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        }
    }

    pub fn while_loop(condition: Node, body: Node) -> Self {
        Node::While {
            condition: Box::new(condition),
            body: Box::new(body),
        }
    }

    pub fn for_loop(
        init: Option<Node>,
        condition: Option<Node>,
        increment: Option<Node>,
        body: Node,
    ) -> Self {
        Node::For {
            init: init.map(Box::new),
            condition: condition.map(Box::new),
            increment: increment.map(Box::new),
            body: Box::new(body),
        }
    }

    pub fn is_statement(&self) -> bool {
        matches!(
            self,
            Node::FunctionCall { .. }
                | Node::Block(_)
                | Node::FunctionDef { .. }
                | Node::Return(_)
                | Node::VarDecl { .. }
                | Node::If { .. }
                | Node::While { .. }
                | Node::For { .. }
        )
    }

    /// Function calls count as both: they may stand alone or sit inside an expression.
    pub fn is_expression(&self) -> bool {
        !self.is_statement() || matches!(self, Node::FunctionCall { .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::IntLiteral(_) => "IntLiteral",
            Node::FloatLiteral(_) => "FloatLiteral",
            Node::BoolLiteral(_) => "BoolLiteral",
            Node::CharLiteral(_) => "CharLiteral",
            Node::StringLiteral(_) => "StringLiteral",
            Node::Identifier(_) => "Identifier",
            Node::Binary { .. } => "BinaryOp",
            Node::Unary { op, .. } if op.is_postfix() => "PostfixOp",
            Node::Unary { .. } => "UnaryOp",
            Node::Assign { .. } => "Assign",
            Node::Ternary { .. } => "Ternary",
            Node::Println(_) => "Println",
            Node::Length(_) => "Length",
            Node::TypeOf(_) => "TypeOf",
            Node::Alloc(_) => "Alloc",
            Node::Dealloc(_) => "Dealloc",
            Node::SizeOf(_) => "SizeOf",
            Node::Unsafe(_) => "Unsafe",
            Node::Cast { .. } => "Cast",
            Node::FunctionCall { .. } => "FunctionCall",
            Node::Block(_) => "Block",
            Node::FunctionDef { .. } => "FunctionDef",
            Node::Return(_) => "Return",
            Node::VarDecl { .. } => "VarDecl",
            Node::If { .. } => "If",
            Node::While { .. } => "While",
            Node::For { .. } => "For",
        }
    }

    /// The semantic type carried by literals, declarations and casts.
    pub fn type_tag(&self) -> Option<&str> {
        match self {
            Node::IntLiteral(_) => Some("i64"),
            Node::FloatLiteral(_) => Some("f64"),
            Node::BoolLiteral(_) => Some("bool"),
            Node::CharLiteral(_) => Some("char"),
            Node::StringLiteral(_) => Some("string"),
            Node::VarDecl { ty, .. } | Node::Cast { ty, .. } => Some(ty.as_str()),
            Node::FunctionDef { return_type, .. } => Some(return_type.as_str()),
            _ => None,
        }
    }

    /// Direct children in program order.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::IntLiteral(_)
            | Node::FloatLiteral(_)
            | Node::BoolLiteral(_)
            | Node::CharLiteral(_)
            | Node::StringLiteral(_)
            | Node::Identifier(_)
            | Node::SizeOf(_) => Vec::new(),
            Node::Binary { left, right, .. } => vec![&**left, &**right],
            Node::Unary { operand, .. } => vec![&**operand],
            Node::Assign { value, .. } => vec![&**value],
            Node::Ternary {
                condition,
                then,
                otherwise,
            } => vec![&**condition, &**then, &**otherwise],
            Node::Println(expr)
            | Node::Length(expr)
            | Node::TypeOf(expr)
            | Node::Alloc(expr)
            | Node::Dealloc(expr)
            | Node::Unsafe(expr)
            | Node::Cast { expr, .. } => vec![&**expr],
            Node::FunctionCall { args: nodes, .. } | Node::Block(nodes) => nodes.iter().collect(),
            Node::FunctionDef { body, .. } => vec![&**body],
            Node::While { condition, body } => vec![&**condition, &**body],
            Node::Return(value) => value.iter().map(|v| &**v).collect(),
            Node::VarDecl { value, .. } => value.iter().map(|v| &**v).collect(),
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let mut nodes = vec![&**condition, &**then_branch];
                nodes.extend(else_branch.as_deref());
                nodes
            }
            Node::For {
                init,
                condition,
                increment,
                body,
            } => {
                let mut nodes: Vec<&Node> = [init, condition, increment]
                    .into_iter()
                    .filter_map(|clause| clause.as_deref())
                    .collect();
                nodes.push(body);
                nodes
            }
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children().iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// Indented, one-node-per-line rendering of the subtree.
    pub fn tree(&self) -> Tree<'_> {
        Tree(self)
    }

    /// Compact single-line rendering, for embedding in a statement's line.
    pub fn inline(&self) -> Inline<'_> {
        Inline(self)
    }

    fn write_tree(&self, f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
        write_indent(f, depth)?;
        match self {
            Node::Binary { op, left, right } => {
                writeln!(f, "BinaryOp: '{}'", op.as_str())?;
                left.write_tree(f, depth + 1)?;
                right.write_tree(f, depth + 1)
            }
            Node::Unary { op, operand } => {
                writeln!(f, "{}: '{}'", self.kind_name(), op.as_str())?;
                operand.write_tree(f, depth + 1)
            }
            Node::Assign { op, name, value } => {
                writeln!(f, "Assign: {} '{}'", name, op.as_str())?;
                value.write_tree(f, depth + 1)
            }
            Node::Cast { expr, ty } => {
                writeln!(f, "Cast: {}", ty)?;
                expr.write_tree(f, depth + 1)
            }
            Node::FunctionCall { name, args } => {
                writeln!(f, "FunctionCall: {}", name)?;
                args.iter().try_for_each(|arg| arg.write_tree(f, depth + 1))
            }
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                writeln!(f, "If: {}", condition.inline())?;
                then_branch.write_tree(f, depth + 1)?;
                if let Some(else_branch) = else_branch {
                    write_indent(f, depth)?;
                    writeln!(f, "Else")?;
                    else_branch.write_tree(f, depth + 1)?;
                }
                Ok(())
            }
            Node::FunctionDef { body, .. } | Node::While { body, .. } | Node::For { body, .. } => {
                self.write_header(f)?;
                writeln!(f)?;
                body.write_tree(f, depth + 1)
            }
            Node::Ternary { .. }
            | Node::Println(_)
            | Node::Length(_)
            | Node::TypeOf(_)
            | Node::Alloc(_)
            | Node::Dealloc(_)
            | Node::Unsafe(_)
            | Node::Block(_) => {
                writeln!(f, "{}", self.kind_name())?;
                self.children()
                    .into_iter()
                    .try_for_each(|child| child.write_tree(f, depth + 1))
            }
            Node::IntLiteral(_)
            | Node::FloatLiteral(_)
            | Node::BoolLiteral(_)
            | Node::CharLiteral(_)
            | Node::StringLiteral(_)
            | Node::Identifier(_)
            | Node::SizeOf(_)
            | Node::Return(_)
            | Node::VarDecl { .. } => {
                self.write_header(f)?;
                writeln!(f)
            }
        }
    }

    /// The single-line part shared by the tree and inline forms.
    fn write_header(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Node::IntLiteral(value) => write!(f, "IntLiteral: {}", value),
            Node::FloatLiteral(value) => write!(f, "FloatLiteral: {:?}", value),
            Node::BoolLiteral(value) => write!(f, "BoolLiteral: {}", value),
            Node::CharLiteral(value) => write!(f, "CharLiteral: {:?}", value),
            Node::StringLiteral(value) => write!(f, "StringLiteral: {:?}", value),
            Node::Identifier(name) => write!(f, "Identifier: {}", name),
            Node::SizeOf(ty) => write!(f, "SizeOf: {}", ty),
            Node::Return(None) => write!(f, "Return"),
            Node::Return(Some(value)) => write!(f, "Return: {}", value.inline()),
            Node::VarDecl { ty, name, value } => {
                write!(f, "VarDecl: {} {}", ty, name)?;
                match value {
                    Some(value) => write!(f, " = {}", value.inline()),
                    None => Ok(()),
                }
            }
            Node::FunctionDef {
                name,
                return_type,
                params,
                ..
            } => {
                write!(f, "FunctionDef: {}(", name)?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", param.ty, param.name)?;
                }
                write!(f, ") -> {}", return_type)
            }
            Node::If { condition, .. } => write!(f, "If: {}", condition.inline()),
            Node::While { condition, .. } => write!(f, "While: {}", condition.inline()),
            Node::For {
                init,
                condition,
                increment,
                ..
            } => {
                let clause = |c: &Option<Box<Node>>| {
                    c.as_ref()
                        .map(|n| n.inline().to_string())
                        .unwrap_or_default()
                };
                let line = format!(
                    "For: {}; {}; {}",
                    clause(init),
                    clause(condition),
                    clause(increment)
                );
                f.write_str(line.trim_end())
            }
            _ => f.write_str(self.kind_name()),
        }
    }

    fn write_inline(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Node::Binary { op, left, right } => {
                write!(f, "BinaryOp('{}', {}, {})", op.as_str(), left.inline(), right.inline())
            }
            Node::Unary { op, operand } => {
                write!(f, "{}('{}', {})", self.kind_name(), op.as_str(), operand.inline())
            }
            Node::Assign { op, name, value } => {
                write!(f, "Assign('{}', {}, {})", op.as_str(), name, value.inline())
            }
            Node::Ternary {
                condition,
                then,
                otherwise,
            } => write!(
                f,
                "Ternary({}, {}, {})",
                condition.inline(),
                then.inline(),
                otherwise.inline()
            ),
            Node::Println(expr)
            | Node::Length(expr)
            | Node::TypeOf(expr)
            | Node::Alloc(expr)
            | Node::Dealloc(expr) => write!(f, "{}({})", self.kind_name(), expr.inline()),
            Node::SizeOf(ty) => write!(f, "SizeOf({})", ty),
            Node::Unsafe(body) => write!(f, "Unsafe({})", body.inline()),
            Node::Cast { expr, ty } => write!(f, "Cast({}, {})", ty, expr.inline()),
            Node::FunctionCall { name, args } => {
                write!(f, "FunctionCall: {}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg.inline())?;
                }
                write!(f, ")")
            }
            Node::Block(statements) => write!(f, "Block[{}]", statements.len()),
            _ => self.write_header(f),
        }
    }
}

fn write_indent(f: &mut fmt::Formatter, depth: usize) -> fmt::Result {
    write!(f, "{:width$}", "", width = depth * 2)
}

pub struct Tree<'a>(&'a Node);

impl fmt::Display for Tree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.write_tree(f, 0)
    }
}

pub struct Inline<'a>(&'a Node);

impl fmt::Display for Inline<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.write_inline(f)
    }
}
