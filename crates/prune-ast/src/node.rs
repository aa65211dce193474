//! Node definitions: one closed sum type over expression and statement kinds.

use crate::ops::{AssignOp, BinaryOp, UnaryOp};
use bitflags::bitflags;
use prune_common::Atom;
use smallvec::SmallVec;

/// Index of a node in its [`crate::Arena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Literal values. String contents are interned.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Atom),
    Null,
}

impl Literal {
    /// Structural equality: same kind and same value. Floats compare by
    /// bit pattern so that two `NaN` literals written identically match.
    pub fn same_value(self, other: Literal) -> bool {
        match (self, other) {
            (Literal::Bool(a), Literal::Bool(b)) => a == b,
            (Literal::Int(a), Literal::Int(b)) => a == b,
            (Literal::Float(a), Literal::Float(b)) => a.to_bits() == b.to_bits(),
            (Literal::Str(a), Literal::Str(b)) => a == b,
            (Literal::Null, Literal::Null) => true,
            _ => false,
        }
    }
}

/// Prefix/postfix increment or decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncDecOp {
    Inc,
    Dec,
}

bitflags! {
    /// Declaration modifiers relevant to equivalence checking.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        const FINAL = 1 << 0;
        const STATIC = 1 << 1;
    }
}

/// Operand storage for polyadic operator nodes (`a && b && c` is one node).
pub type OperandList = SmallVec<[NodeId; 2]>;

/// One node of the tree model.
///
/// Children are owned (tree ownership, no sharing); the only back-reference
/// is [`Node::VarRef::decl`], a non-owning pointer to the declaration a
/// variable read resolved to. `None` means the reference is unresolved and
/// every analysis must treat it conservatively.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    // ----- Expressions -----
    Literal(Literal),
    VarRef {
        name: Atom,
        decl: Option<NodeId>,
    },
    Unary {
        op: UnaryOp,
        operand: NodeId,
    },
    Binary {
        op: BinaryOp,
        operands: OperandList,
    },
    Assign {
        op: AssignOp,
        target: NodeId,
        value: NodeId,
    },
    IncDec {
        op: IncDecOp,
        prefix: bool,
        operand: NodeId,
    },
    Conditional {
        condition: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
    },
    Call {
        receiver: Option<NodeId>,
        callee: Atom,
        args: Vec<NodeId>,
    },
    New {
        type_name: Atom,
        args: Vec<NodeId>,
    },
    Paren(NodeId),
    Cast {
        type_name: Atom,
        operand: NodeId,
    },
    InstanceOf {
        operand: NodeId,
        type_name: Atom,
    },

    // ----- Statements -----
    If {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        condition: NodeId,
        body: NodeId,
    },
    DoWhile {
        body: NodeId,
        condition: NodeId,
    },
    For {
        init: Option<NodeId>,
        condition: Option<NodeId>,
        update: Option<NodeId>,
        body: NodeId,
    },
    ForEach {
        variable: NodeId,
        iterable: NodeId,
        body: NodeId,
    },
    Switch {
        selector: NodeId,
        cases: Vec<NodeId>,
        /// Set by the host when the selector is an enum and the labels
        /// cover every constant. The bundled parser only sets it when a
        /// `default` clause is present.
        exhaustive: bool,
    },
    Case {
        labels: Vec<NodeId>,
        is_default: bool,
        body: Vec<NodeId>,
    },
    Break {
        label: Option<Atom>,
    },
    Continue {
        label: Option<Atom>,
    },
    Return {
        value: Option<NodeId>,
    },
    Throw {
        value: NodeId,
    },
    Block {
        statements: Vec<NodeId>,
    },
    ExprStmt {
        expression: NodeId,
    },
    LocalDecl {
        modifiers: Modifiers,
        type_name: Atom,
        name: Atom,
        initializer: Option<NodeId>,
    },
    Assert {
        condition: NodeId,
        message: Option<NodeId>,
    },
    Labeled {
        label: Atom,
        statement: NodeId,
    },
    Empty,
}

impl Node {
    /// True for expression kinds. Partial-match diff pairs must be
    /// expressions on both sides.
    pub fn is_expression(&self) -> bool {
        matches!(
            self,
            Node::Literal(_)
                | Node::VarRef { .. }
                | Node::Unary { .. }
                | Node::Binary { .. }
                | Node::Assign { .. }
                | Node::IncDec { .. }
                | Node::Conditional { .. }
                | Node::Call { .. }
                | Node::New { .. }
                | Node::Paren(_)
                | Node::Cast { .. }
                | Node::InstanceOf { .. }
        )
    }

    pub fn is_statement(&self) -> bool {
        !self.is_expression()
    }

    /// True for the jump statements that can never complete normally.
    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            Node::Break { .. } | Node::Continue { .. } | Node::Return { .. } | Node::Throw { .. }
        )
    }

    /// True for loop statement kinds.
    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            Node::While { .. } | Node::DoWhile { .. } | Node::For { .. } | Node::ForEach { .. }
        )
    }

    /// The direct children of this node, in evaluation/source order.
    pub fn children(&self) -> SmallVec<[NodeId; 4]> {
        let mut out: SmallVec<[NodeId; 4]> = SmallVec::new();
        match self {
            Node::Literal(_)
            | Node::VarRef { .. }
            | Node::Break { .. }
            | Node::Continue { .. }
            | Node::Empty => {}
            Node::Unary { operand, .. }
            | Node::IncDec { operand, .. }
            | Node::Cast { operand, .. }
            | Node::InstanceOf { operand, .. }
            | Node::Paren(operand) => out.push(*operand),
            Node::Binary { operands, .. } => out.extend(operands.iter().copied()),
            Node::Assign { target, value, .. } => {
                out.push(*target);
                out.push(*value);
            }
            Node::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                out.push(*condition);
                out.push(*then_expr);
                out.push(*else_expr);
            }
            Node::Call { receiver, args, .. } => {
                out.extend(receiver.iter().copied());
                out.extend(args.iter().copied());
            }
            Node::New { args, .. } => out.extend(args.iter().copied()),
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push(*condition);
                out.push(*then_branch);
                out.extend(else_branch.iter().copied());
            }
            Node::While { condition, body } => {
                out.push(*condition);
                out.push(*body);
            }
            Node::DoWhile { body, condition } => {
                out.push(*body);
                out.push(*condition);
            }
            Node::For {
                init,
                condition,
                update,
                body,
            } => {
                out.extend(init.iter().copied());
                out.extend(condition.iter().copied());
                out.extend(update.iter().copied());
                out.push(*body);
            }
            Node::ForEach {
                variable,
                iterable,
                body,
            } => {
                out.push(*variable);
                out.push(*iterable);
                out.push(*body);
            }
            Node::Switch {
                selector, cases, ..
            } => {
                out.push(*selector);
                out.extend(cases.iter().copied());
            }
            Node::Case { labels, body, .. } => {
                out.extend(labels.iter().copied());
                out.extend(body.iter().copied());
            }
            Node::Return { value } => out.extend(value.iter().copied()),
            Node::Throw { value } => out.push(*value),
            Node::Block { statements } => out.extend(statements.iter().copied()),
            Node::ExprStmt { expression } => out.push(*expression),
            Node::LocalDecl { initializer, .. } => out.extend(initializer.iter().copied()),
            Node::Assert { condition, message } => {
                out.push(*condition);
                out.extend(message.iter().copied());
            }
            Node::Labeled { statement, .. } => out.push(*statement),
        }
        out
    }
}
