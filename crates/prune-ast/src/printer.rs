//! Rendering nodes back to source text.
//!
//! Rewrite proposals are textual: a detector prints the replacement subtree
//! and the host splices the text. The printer inserts only the parentheses
//! that precedence requires, so printed output is minimal and stable
//! (printing a printed-then-reparsed tree yields the same text).

use crate::arena::Arena;
use crate::node::{IncDecOp, Literal, Node, NodeId};
use crate::ops::UnaryOp;
use std::fmt::Write as _;

// Precedence levels used for parenthesization decisions. Binary operators
// occupy 2..=11 (their table value plus one).
const PREC_ASSIGN: u8 = 0;
const PREC_CONDITIONAL: u8 = 1;
const PREC_RELATIONAL: u8 = 8;
const PREC_UNARY: u8 = 12;
const PREC_POSTFIX: u8 = 13;
const PREC_PRIMARY: u8 = 14;

pub struct Printer<'a> {
    arena: &'a Arena,
}

impl<'a> Printer<'a> {
    pub fn new(arena: &'a Arena) -> Printer<'a> {
        Printer { arena }
    }

    /// Render an expression with minimal parentheses.
    pub fn print_expr(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.expr(&mut out, id, 0);
        out
    }

    /// Render a statement (single line statements stay on one line, blocks
    /// indent by four spaces per level).
    pub fn print_stmt(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.stmt(&mut out, id, 0);
        out
    }

    fn precedence_of(&self, id: NodeId) -> u8 {
        match self.arena.get(id) {
            Some(Node::Assign { .. }) => PREC_ASSIGN,
            Some(Node::Conditional { .. }) => PREC_CONDITIONAL,
            Some(Node::Binary { op, .. }) => op.precedence() + 1,
            Some(Node::InstanceOf { .. }) => PREC_RELATIONAL,
            Some(Node::Unary { .. }) | Some(Node::Cast { .. }) => PREC_UNARY,
            Some(Node::IncDec { prefix, .. }) => {
                if *prefix {
                    PREC_UNARY
                } else {
                    PREC_POSTFIX
                }
            }
            Some(Node::Paren(inner)) => self.precedence_of(*inner),
            _ => PREC_PRIMARY,
        }
    }

    /// Render `id`, parenthesizing when its precedence is below `min_prec`.
    fn expr(&self, out: &mut String, id: NodeId, min_prec: u8) {
        // Source-level parens are dropped; we re-add only what is needed.
        let id = self.arena.skip_parens(id);
        if self.precedence_of(id) < min_prec {
            out.push('(');
            self.expr(out, id, 0);
            out.push(')');
            return;
        }
        let Some(node) = self.arena.get(id) else {
            return;
        };
        match node {
            Node::Literal(lit) => self.literal(out, *lit),
            Node::VarRef { name, .. } => out.push_str(self.arena.name(*name)),
            Node::Unary { op, operand } => {
                out.push_str(op.token());
                // `- -x` needs the space to avoid token gluing.
                if matches!(op, UnaryOp::Neg | UnaryOp::Plus)
                    && matches!(
                        self.arena.get(self.arena.skip_parens(*operand)),
                        Some(Node::Unary { .. }) | Some(Node::IncDec { prefix: true, .. })
                    )
                {
                    out.push(' ');
                }
                self.expr(out, *operand, PREC_UNARY);
            }
            Node::Binary { op, operands } => {
                let prec = op.precedence() + 1;
                for (i, &operand) in operands.iter().enumerate() {
                    if i > 0 {
                        let _ = write!(out, " {} ", op.token());
                    }
                    // Left-associative: later operands need strictly higher
                    // precedence to stay unparenthesized.
                    let min = if i == 0 { prec } else { prec + 1 };
                    self.expr(out, operand, min);
                }
            }
            Node::Assign { op, target, value } => {
                self.expr(out, *target, PREC_UNARY);
                let _ = write!(out, " {} ", op.token());
                self.expr(out, *value, PREC_ASSIGN);
            }
            Node::IncDec { op, prefix, operand } => {
                let token = match op {
                    IncDecOp::Inc => "++",
                    IncDecOp::Dec => "--",
                };
                if *prefix {
                    out.push_str(token);
                    self.expr(out, *operand, PREC_UNARY);
                } else {
                    self.expr(out, *operand, PREC_POSTFIX);
                    out.push_str(token);
                }
            }
            Node::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                self.expr(out, *condition, PREC_CONDITIONAL + 1);
                out.push_str(" ? ");
                self.expr(out, *then_expr, PREC_CONDITIONAL);
                out.push_str(" : ");
                self.expr(out, *else_expr, PREC_CONDITIONAL);
            }
            Node::Call {
                receiver,
                callee,
                args,
            } => {
                if let Some(receiver) = receiver {
                    self.expr(out, *receiver, PREC_POSTFIX);
                    out.push('.');
                }
                out.push_str(self.arena.name(*callee));
                self.arg_list(out, args);
            }
            Node::New { type_name, args } => {
                out.push_str("new ");
                out.push_str(self.arena.name(*type_name));
                self.arg_list(out, args);
            }
            Node::Paren(inner) => self.expr(out, *inner, min_prec),
            Node::Cast { type_name, operand } => {
                let _ = write!(out, "({}) ", self.arena.name(*type_name));
                self.expr(out, *operand, PREC_UNARY);
            }
            Node::InstanceOf { operand, type_name } => {
                self.expr(out, *operand, PREC_RELATIONAL);
                let _ = write!(out, " instanceof {}", self.arena.name(*type_name));
            }
            _ => {}
        }
    }

    fn literal(&self, out: &mut String, lit: Literal) {
        match lit {
            Literal::Bool(b) => {
                let _ = write!(out, "{b}");
            }
            Literal::Int(i) => {
                let _ = write!(out, "{i}");
            }
            Literal::Float(f) => {
                // Keep a decimal point so the text re-scans as a float.
                if f.is_finite() && f.fract() == 0.0 {
                    let _ = write!(out, "{f:.1}");
                } else {
                    let _ = write!(out, "{f}");
                }
            }
            Literal::Str(s) => {
                let _ = write!(out, "\"{}\"", self.arena.name(s));
            }
            Literal::Null => out.push_str("null"),
        }
    }

    fn arg_list(&self, out: &mut String, args: &[NodeId]) {
        out.push('(');
        for (i, &arg) in args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.expr(out, arg, PREC_ASSIGN);
        }
        out.push(')');
    }

    fn stmt(&self, out: &mut String, id: NodeId, depth: usize) {
        let indent = "    ".repeat(depth);
        let Some(node) = self.arena.get(id) else {
            return;
        };
        match node {
            Node::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let _ = write!(out, "{indent}if (");
                self.expr(out, *condition, 0);
                out.push_str(") ");
                self.branch(out, *then_branch, depth);
                if let Some(else_branch) = else_branch {
                    out.push_str(" else ");
                    self.branch(out, *else_branch, depth);
                }
            }
            Node::While { condition, body } => {
                let _ = write!(out, "{indent}while (");
                self.expr(out, *condition, 0);
                out.push_str(") ");
                self.branch(out, *body, depth);
            }
            Node::DoWhile { body, condition } => {
                let _ = write!(out, "{indent}do ");
                self.branch(out, *body, depth);
                out.push_str(" while (");
                self.expr(out, *condition, 0);
                out.push_str(");");
            }
            Node::For {
                init,
                condition,
                update,
                body,
            } => {
                let _ = write!(out, "{indent}for (");
                if let Some(init) = init {
                    let mut text = String::new();
                    self.stmt(&mut text, *init, 0);
                    out.push_str(text.trim_end_matches(';').trim());
                }
                out.push(';');
                if let Some(condition) = condition {
                    out.push(' ');
                    self.expr(out, *condition, 0);
                }
                out.push(';');
                if let Some(update) = update {
                    out.push(' ');
                    self.expr(out, *update, 0);
                }
                out.push_str(") ");
                self.branch(out, *body, depth);
            }
            Node::ForEach {
                variable,
                iterable,
                body,
            } => {
                let _ = write!(out, "{indent}for (");
                if let Some(Node::LocalDecl {
                    type_name, name, ..
                }) = self.arena.get(*variable)
                {
                    let _ = write!(
                        out,
                        "{} {}",
                        self.arena.name(*type_name),
                        self.arena.name(*name)
                    );
                }
                out.push_str(" : ");
                self.expr(out, *iterable, 0);
                out.push_str(") ");
                self.branch(out, *body, depth);
            }
            Node::Switch {
                selector, cases, ..
            } => {
                let _ = write!(out, "{indent}switch (");
                self.expr(out, *selector, 0);
                out.push_str(") {\n");
                for &case in cases {
                    self.stmt(out, case, depth + 1);
                }
                let _ = write!(out, "{indent}}}");
            }
            Node::Case {
                labels,
                is_default,
                body,
            } => {
                if *is_default {
                    let _ = write!(out, "{indent}default:\n");
                } else {
                    for &label in labels {
                        let _ = write!(out, "{indent}case ");
                        self.expr(out, label, 0);
                        out.push_str(":\n");
                    }
                }
                for &stmt in body {
                    self.stmt(out, stmt, depth + 1);
                    out.push('\n');
                }
            }
            Node::Break { label } => match label {
                Some(label) => {
                    let _ = write!(out, "{indent}break {};", self.arena.name(*label));
                }
                None => {
                    let _ = write!(out, "{indent}break;");
                }
            },
            Node::Continue { label } => match label {
                Some(label) => {
                    let _ = write!(out, "{indent}continue {};", self.arena.name(*label));
                }
                None => {
                    let _ = write!(out, "{indent}continue;");
                }
            },
            Node::Return { value } => {
                let _ = write!(out, "{indent}return");
                if let Some(value) = value {
                    out.push(' ');
                    self.expr(out, *value, 0);
                }
                out.push(';');
            }
            Node::Throw { value } => {
                let _ = write!(out, "{indent}throw ");
                self.expr(out, *value, 0);
                out.push(';');
            }
            Node::Block { statements } => {
                let _ = write!(out, "{indent}{{\n");
                for &stmt in statements {
                    self.stmt(out, stmt, depth + 1);
                    out.push('\n');
                }
                let _ = write!(out, "{indent}}}");
            }
            Node::ExprStmt { expression } => {
                out.push_str(&indent);
                self.expr(out, *expression, 0);
                out.push(';');
            }
            Node::LocalDecl {
                modifiers,
                type_name,
                name,
                initializer,
            } => {
                out.push_str(&indent);
                if modifiers.contains(crate::node::Modifiers::STATIC) {
                    out.push_str("static ");
                }
                if modifiers.contains(crate::node::Modifiers::FINAL) {
                    out.push_str("final ");
                }
                let _ = write!(
                    out,
                    "{} {}",
                    self.arena.name(*type_name),
                    self.arena.name(*name)
                );
                if let Some(initializer) = initializer {
                    out.push_str(" = ");
                    self.expr(out, *initializer, 0);
                }
                out.push(';');
            }
            Node::Assert { condition, message } => {
                let _ = write!(out, "{indent}assert ");
                self.expr(out, *condition, 0);
                if let Some(message) = message {
                    out.push_str(" : ");
                    self.expr(out, *message, 0);
                }
                out.push(';');
            }
            Node::Labeled { label, statement } => {
                let _ = write!(out, "{indent}{}: ", self.arena.name(*label));
                let mut text = String::new();
                self.stmt(&mut text, *statement, depth);
                out.push_str(text.trim_start());
            }
            Node::Empty => {
                let _ = write!(out, "{indent};");
            }
            _ => {
                // Expression node printed in statement position.
                out.push_str(&indent);
                self.expr(out, id, 0);
            }
        }
    }

    /// Print a branch body that follows a header on the same line. Blocks
    /// stay attached (`if (c) { ... }`); other statements are printed
    /// inline.
    fn branch(&self, out: &mut String, id: NodeId, depth: usize) {
        let mut text = String::new();
        self.stmt(&mut text, id, depth);
        out.push_str(text.trim_start());
    }
}
