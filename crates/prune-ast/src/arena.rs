//! Append-only node storage.

use crate::node::{IncDecOp, Literal, Modifiers, Node, NodeId, OperandList};
use crate::ops::{AssignOp, BinaryOp, UnaryOp};
use prune_common::{Atom, Interner, Span};

/// Owns every node of one analyzed tree, plus the interner for the names
/// appearing in it.
///
/// Nodes are only ever appended; analyses hold `&Arena` and rewriters hold
/// `&mut Arena` purely to append replacement nodes. Existing nodes are
/// never modified, so a `NodeId` obtained before a rewrite remains valid
/// and unchanged after it.
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<Node>,
    spans: Vec<Span>,
    interner: Interner,
}

impl Arena {
    pub fn new() -> Arena {
        Arena::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Fetch a node. Out-of-range ids return `None`; every analysis treats
    /// that as "unknown" and answers conservatively.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.spans.get(id.index()).copied().unwrap_or(Span::SYNTHETIC)
    }

    pub fn interner(&self) -> &Interner {
        &self.interner
    }

    pub fn intern(&mut self, text: &str) -> Atom {
        self.interner.intern(text)
    }

    pub fn name(&self, atom: Atom) -> &str {
        self.interner.resolve(atom)
    }

    /// Append a node with an explicit source span.
    pub fn add_spanned(&mut self, node: Node, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        self.spans.push(span);
        id
    }

    /// Append a synthesized node (no source span).
    pub fn add(&mut self, node: Node) -> NodeId {
        self.add_spanned(node, Span::SYNTHETIC)
    }

    /// Strip any number of parenthesized wrappers.
    pub fn skip_parens(&self, mut id: NodeId) -> NodeId {
        while let Some(Node::Paren(inner)) = self.get(id) {
            id = *inner;
        }
        id
    }

    /// The boolean literal inside `expr`, looking through parentheses.
    pub fn as_bool_literal(&self, id: NodeId) -> Option<bool> {
        match self.get(self.skip_parens(id)) {
            Some(Node::Literal(Literal::Bool(b))) => Some(*b),
            _ => None,
        }
    }

    /// Is `target` equal to or somewhere below `root`?
    pub fn subtree_contains(&self, root: NodeId, target: NodeId) -> bool {
        if root == target {
            return true;
        }
        let Some(node) = self.get(root) else {
            return false;
        };
        node.children()
            .iter()
            .any(|&child| self.subtree_contains(child, target))
    }

    /// Copy of `root` with the subtree at `target` swapped for
    /// `replacement`. Subtrees not on the path to `target` are shared, not
    /// copied; the original tree is untouched.
    pub fn clone_with_replacement(
        &mut self,
        root: NodeId,
        target: NodeId,
        replacement: NodeId,
    ) -> NodeId {
        if root == target {
            return replacement;
        }
        if !self.subtree_contains(root, target) {
            return root;
        }
        let Some(node) = self.get(root).cloned() else {
            return root;
        };
        let rebuilt = match node {
            Node::Unary { op, operand } => Node::Unary {
                op,
                operand: self.clone_with_replacement(operand, target, replacement),
            },
            Node::Binary { op, operands } => Node::Binary {
                op,
                operands: operands
                    .into_iter()
                    .map(|o| self.clone_with_replacement(o, target, replacement))
                    .collect(),
            },
            Node::Assign { op, target: t, value } => Node::Assign {
                op,
                target: self.clone_with_replacement(t, target, replacement),
                value: self.clone_with_replacement(value, target, replacement),
            },
            Node::IncDec { op, prefix, operand } => Node::IncDec {
                op,
                prefix,
                operand: self.clone_with_replacement(operand, target, replacement),
            },
            Node::Conditional {
                condition,
                then_expr,
                else_expr,
            } => Node::Conditional {
                condition: self.clone_with_replacement(condition, target, replacement),
                then_expr: self.clone_with_replacement(then_expr, target, replacement),
                else_expr: self.clone_with_replacement(else_expr, target, replacement),
            },
            Node::Call {
                receiver,
                callee,
                args,
            } => Node::Call {
                receiver: receiver.map(|r| self.clone_with_replacement(r, target, replacement)),
                callee,
                args: args
                    .into_iter()
                    .map(|a| self.clone_with_replacement(a, target, replacement))
                    .collect(),
            },
            Node::New { type_name, args } => Node::New {
                type_name,
                args: args
                    .into_iter()
                    .map(|a| self.clone_with_replacement(a, target, replacement))
                    .collect(),
            },
            Node::Paren(inner) => Node::Paren(self.clone_with_replacement(inner, target, replacement)),
            Node::Cast { type_name, operand } => Node::Cast {
                type_name,
                operand: self.clone_with_replacement(operand, target, replacement),
            },
            Node::InstanceOf { operand, type_name } => Node::InstanceOf {
                operand: self.clone_with_replacement(operand, target, replacement),
                type_name,
            },
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => Node::If {
                condition: self.clone_with_replacement(condition, target, replacement),
                then_branch: self.clone_with_replacement(then_branch, target, replacement),
                else_branch: else_branch
                    .map(|e| self.clone_with_replacement(e, target, replacement)),
            },
            Node::While { condition, body } => Node::While {
                condition: self.clone_with_replacement(condition, target, replacement),
                body: self.clone_with_replacement(body, target, replacement),
            },
            Node::DoWhile { body, condition } => Node::DoWhile {
                body: self.clone_with_replacement(body, target, replacement),
                condition: self.clone_with_replacement(condition, target, replacement),
            },
            Node::Return { value } => Node::Return {
                value: value.map(|v| self.clone_with_replacement(v, target, replacement)),
            },
            Node::Throw { value } => Node::Throw {
                value: self.clone_with_replacement(value, target, replacement),
            },
            Node::Block { statements } => Node::Block {
                statements: statements
                    .into_iter()
                    .map(|s| self.clone_with_replacement(s, target, replacement))
                    .collect(),
            },
            Node::ExprStmt { expression } => Node::ExprStmt {
                expression: self.clone_with_replacement(expression, target, replacement),
            },
            Node::Assert { condition, message } => Node::Assert {
                condition: self.clone_with_replacement(condition, target, replacement),
                message: message.map(|m| self.clone_with_replacement(m, target, replacement)),
            },
            Node::Labeled { label, statement } => Node::Labeled {
                label,
                statement: self.clone_with_replacement(statement, target, replacement),
            },
            Node::LocalDecl {
                modifiers,
                type_name,
                name,
                initializer,
            } => Node::LocalDecl {
                modifiers,
                type_name,
                name,
                initializer: initializer.map(|i| self.clone_with_replacement(i, target, replacement)),
            },
            Node::For {
                init,
                condition,
                update,
                body,
            } => Node::For {
                init: init.map(|i| self.clone_with_replacement(i, target, replacement)),
                condition: condition.map(|c| self.clone_with_replacement(c, target, replacement)),
                update: update.map(|u| self.clone_with_replacement(u, target, replacement)),
                body: self.clone_with_replacement(body, target, replacement),
            },
            Node::ForEach {
                variable,
                iterable,
                body,
            } => Node::ForEach {
                variable: self.clone_with_replacement(variable, target, replacement),
                iterable: self.clone_with_replacement(iterable, target, replacement),
                body: self.clone_with_replacement(body, target, replacement),
            },
            Node::Switch {
                selector,
                cases,
                exhaustive,
            } => Node::Switch {
                selector: self.clone_with_replacement(selector, target, replacement),
                cases: cases
                    .into_iter()
                    .map(|c| self.clone_with_replacement(c, target, replacement))
                    .collect(),
                exhaustive,
            },
            Node::Case {
                labels,
                is_default,
                body,
            } => Node::Case {
                labels: labels
                    .into_iter()
                    .map(|l| self.clone_with_replacement(l, target, replacement))
                    .collect(),
                is_default,
                body: body
                    .into_iter()
                    .map(|s| self.clone_with_replacement(s, target, replacement))
                    .collect(),
            },
            // Leaf kinds (literals, references, jumps, empties) have no
            // children to rebuild; `subtree_contains` already ruled out a
            // hit below them.
            other => other,
        };
        self.add(rebuilt)
    }

    // =========================================================================
    // Builder conveniences (used by the parser, the simplifier, and tests)
    // =========================================================================

    pub fn add_bool(&mut self, value: bool) -> NodeId {
        self.add(Node::Literal(Literal::Bool(value)))
    }

    pub fn add_int(&mut self, value: i64) -> NodeId {
        self.add(Node::Literal(Literal::Int(value)))
    }

    pub fn add_var(&mut self, name: &str, decl: Option<NodeId>) -> NodeId {
        let name = self.intern(name);
        self.add(Node::VarRef { name, decl })
    }

    pub fn add_unary(&mut self, op: UnaryOp, operand: NodeId) -> NodeId {
        self.add(Node::Unary { op, operand })
    }

    pub fn add_not(&mut self, operand: NodeId) -> NodeId {
        self.add_unary(UnaryOp::Not, operand)
    }

    pub fn add_binary(&mut self, op: BinaryOp, operands: impl IntoIterator<Item = NodeId>) -> NodeId {
        let operands: OperandList = operands.into_iter().collect();
        debug_assert!(operands.len() >= 2);
        self.add(Node::Binary { op, operands })
    }

    pub fn add_assign(&mut self, op: AssignOp, target: NodeId, value: NodeId) -> NodeId {
        self.add(Node::Assign { op, target, value })
    }

    pub fn add_inc_dec(&mut self, op: IncDecOp, prefix: bool, operand: NodeId) -> NodeId {
        self.add(Node::IncDec { op, prefix, operand })
    }

    pub fn add_conditional(
        &mut self,
        condition: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
    ) -> NodeId {
        self.add(Node::Conditional {
            condition,
            then_expr,
            else_expr,
        })
    }

    pub fn add_call(&mut self, receiver: Option<NodeId>, callee: &str, args: Vec<NodeId>) -> NodeId {
        let callee = self.intern(callee);
        self.add(Node::Call {
            receiver,
            callee,
            args,
        })
    }

    pub fn add_block(&mut self, statements: Vec<NodeId>) -> NodeId {
        self.add(Node::Block { statements })
    }

    pub fn add_expr_stmt(&mut self, expression: NodeId) -> NodeId {
        self.add(Node::ExprStmt { expression })
    }

    pub fn add_local_decl(
        &mut self,
        modifiers: Modifiers,
        type_name: &str,
        name: &str,
        initializer: Option<NodeId>,
    ) -> NodeId {
        let type_name = self.intern(type_name);
        let name = self.intern(name);
        self.add(Node::LocalDecl {
            modifiers,
            type_name,
            name,
            initializer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_parens_unwraps_nesting() {
        let mut arena = Arena::new();
        let lit = arena.add_bool(true);
        let inner = arena.add(Node::Paren(lit));
        let outer = arena.add(Node::Paren(inner));
        assert_eq!(arena.skip_parens(outer), lit);
        assert_eq!(arena.as_bool_literal(outer), Some(true));
    }

    #[test]
    fn get_out_of_range_is_none() {
        let arena = Arena::new();
        assert!(arena.get(NodeId(7)).is_none());
    }

    #[test]
    fn replacement_reaches_declaration_initializers() {
        let mut arena = Arena::new();
        let one = arena.add_int(1);
        let call = arena.add_call(None, "f", vec![one]);
        let decl = arena.add_local_decl(Modifiers::empty(), "int", "x", Some(call));
        let two = arena.add_int(2);
        let rebuilt = arena.clone_with_replacement(decl, one, two);
        assert_ne!(rebuilt, decl);
        assert!(arena.subtree_contains(rebuilt, two));
        assert!(!arena.subtree_contains(rebuilt, one));
        // The original tree is untouched.
        assert!(arena.subtree_contains(decl, one));
    }

    #[test]
    fn replacement_descends_into_loop_and_switch_bodies() {
        let mut arena = Arena::new();
        let one = arena.add_int(1);
        let call = arena.add_call(None, "f", vec![one]);
        let body = arena.add_expr_stmt(call);
        let for_loop = arena.add(Node::For {
            init: None,
            condition: None,
            update: None,
            body,
        });
        let two = arena.add_int(2);
        let rebuilt = arena.clone_with_replacement(for_loop, one, two);
        assert!(arena.subtree_contains(rebuilt, two));
        assert!(!arena.subtree_contains(rebuilt, one));

        let label = arena.add_int(1);
        let case = arena.add(Node::Case {
            labels: vec![label],
            is_default: false,
            body: vec![body],
        });
        let selector = arena.add_var("x", None);
        let switch = arena.add(Node::Switch {
            selector,
            cases: vec![case],
            exhaustive: false,
        });
        let rebuilt = arena.clone_with_replacement(switch, one, two);
        assert!(arena.subtree_contains(rebuilt, two));
        assert!(!arena.subtree_contains(rebuilt, one));
    }
}
