use std::fmt::{self, Display, Formatter};

use crate::compiler::token::Token;

/// The closed set of node kinds, for dispatching on a node
/// without matching out its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Root,
    Func,
    Block,
    Return,
    Expr,
    Value,
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeKind::Root => "a root node",
            NodeKind::Func => "a function declaration",
            NodeKind::Block => "a block",
            NodeKind::Return => "a return statement",
            NodeKind::Expr => "an expression",
            NodeKind::Value => "a value",
        };

        write!(f, "{}", name)
    }
}

/// A compiled unit: top-level declarations in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Root {
    pub decls: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Func {
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
}

/// Statements in order. Grows one statement at a time while parsing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Return {
    pub expr: Expr,
}

/// An operator applied to owned operands.
/// A bare operand is an `Expr` with neither an operator
/// nor a right side.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub op: Option<Token>,
    pub left: Box<Node>,
    pub right: Option<Box<Node>>,
}

impl Expr {
    pub fn binary(left: Node, op: Token, right: Node) -> Expr {
        Expr {
            op: Some(op),
            left: Box::new(left),
            right: Some(Box::new(right)),
        }
    }

    /// Wraps a single operand, such as the `4` in `return 4;`.
    pub fn operand(left: Node) -> Expr {
        Expr {
            op: None,
            left: Box::new(left),
            right: None,
        }
    }
}

/// A numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Value(pub f64);

/// Every node owns its children outright,
/// so a tree has exactly one owner, the `Root`.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Root(Root),
    Func(Func),
    Block(Block),
    Return(Return),
    Expr(Expr),
    Value(Value),
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Root(_) => NodeKind::Root,
            Node::Func(_) => NodeKind::Func,
            Node::Block(_) => NodeKind::Block,
            Node::Return(_) => NodeKind::Return,
            Node::Expr(_) => NodeKind::Expr,
            Node::Value(_) => NodeKind::Value,
        }
    }

    fn display(&self, f: &mut Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self {
            Node::Root(root) => {
                writeln!(f, "{}Root", indent)?;
                for decl in root.decls.iter() {
                    decl.display(f, depth + 1)?;
                }
            },
            Node::Func(func) => {
                writeln!(f, "{}Func {}({})", indent, func.name, func.params.join(", "))?;
                func.body.display(f, depth + 1)?;
            },
            Node::Block(block) => block.display(f, depth)?,
            Node::Return(ret) => {
                writeln!(f, "{}Return", indent)?;
                ret.expr.display(f, depth + 1)?;
            },
            Node::Expr(expr) => expr.display(f, depth)?,
            Node::Value(Value(value)) => writeln!(f, "{}Value {}", indent, value)?,
        }
        Ok(())
    }
}

impl Block {
    fn display(&self, f: &mut Formatter<'_>, depth: usize) -> fmt::Result {
        writeln!(f, "{}Block", "  ".repeat(depth))?;
        for stmt in self.stmts.iter() {
            stmt.display(f, depth + 1)?;
        }
        Ok(())
    }
}

impl Expr {
    fn display(&self, f: &mut Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self.op.and_then(|op| op.kind.lexeme()) {
            Some(op) => writeln!(f, "{}Expr {}", indent, op)?,
            None => writeln!(f, "{}Expr", indent)?,
        }
        self.left.display(f, depth + 1)?;
        if let Some(right) = &self.right {
            right.display(f, depth + 1)?;
        }
        Ok(())
    }
}

impl Display for Node {
    /// Renders the tree one node per line, children indented:
    /// ```plain
    /// Root
    ///   Func f()
    ///     Block
    ///       Return
    ///         Expr
    ///           Value 4
    /// ```
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.display(f, 0)
    }
}
