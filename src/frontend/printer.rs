//! Source printer
//!
//! Renders an AST as canonical AgentLab source. Used by the decompiler and
//! by `fmt`. Attributes go one per line above their target; blocks open on
//! the declaring line and close on their own line.

use crate::frontend::parser::ast::*;
use crate::middle::catalogue;
use serde::{Deserialize, Serialize};

/// Indentation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintOptions {
    /// Indent with tabs; otherwise `indent_width` spaces
    pub use_tabs: bool,
    pub indent_width: usize,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            use_tabs: true,
            indent_width: 4,
        }
    }
}

/// Print a unit as source text
pub fn print_root(
    root: &Root,
    options: &PrintOptions,
) -> String {
    let mut printer = Printer::new(options);
    match root {
        Root::Library(library) => printer.library(library),
        Root::Behaviour(behaviour) => printer.behaviour(behaviour),
        Root::Sequence(sequence) => printer.sequence(sequence),
    }
    printer.out
}

/// Print an expression
pub fn print_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr);
    out
}

fn write_expr(
    out: &mut String,
    expr: &Expr,
) {
    match expr {
        Expr::Number(value, _) => out.push_str(&value.to_string()),
        Expr::Const(name, _) => out.push_str(name),
        Expr::Unary {
            op: UnOp::Neg,
            operand,
            ..
        } => {
            out.push('-');
            write_operand(out, operand);
        }
        Expr::Binary { op, lhs, rhs, .. } => {
            write_expr(out, lhs);
            out.push_str(match op {
                BinOp::Add => " + ",
                BinOp::Sub => " - ",
            });
            write_operand(out, rhs);
        }
    }
}

/// Operands that are themselves binary need parentheses
fn write_operand(
    out: &mut String,
    expr: &Expr,
) {
    if matches!(expr, Expr::Binary { .. }) {
        out.push('(');
        write_expr(out, expr);
        out.push(')');
    } else {
        write_expr(out, expr);
    }
}

struct Printer<'o> {
    options: &'o PrintOptions,
    out: String,
    depth: usize,
}

impl<'o> Printer<'o> {
    fn new(options: &'o PrintOptions) -> Self {
        Self {
            options,
            out: String::new(),
            depth: 0,
        }
    }

    fn line(
        &mut self,
        text: &str,
    ) {
        for _ in 0..self.depth {
            if self.options.use_tabs {
                self.out.push('\t');
            } else {
                self.out.extend(std::iter::repeat(' ').take(self.options.indent_width));
            }
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn open(
        &mut self,
        header: &str,
    ) {
        self.line(&format!("{} {{", header));
        self.depth += 1;
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);
        self.line("}");
    }

    fn attributes(
        &mut self,
        attributes: &[Attribute],
    ) {
        for attribute in attributes {
            let text = attribute_text(&attribute.kind);
            self.line(&text);
        }
    }

    fn consts(
        &mut self,
        consts: &ConstList,
    ) {
        for decl in &consts.decls {
            self.line(&format!("const {} = {};", decl.name, print_expr(&decl.value)));
        }
    }

    fn library(
        &mut self,
        library: &Library,
    ) {
        self.attributes(&library.attributes);
        self.open(&format!("library {}", library.name));
        self.consts(&library.consts);
        let mut first = library.consts.is_empty();
        for behaviour in &library.behaviours {
            if !first {
                self.blank();
            }
            first = false;
            self.behaviour(behaviour);
        }
        self.close();
    }

    fn behaviour(
        &mut self,
        behaviour: &Behaviour,
    ) {
        self.attributes(&behaviour.attributes);
        self.open(&format!("behaviour {}", behaviour.name));
        self.consts(&behaviour.consts);
        let mut first = behaviour.consts.is_empty();

        if let Some(starter) = &behaviour.starter {
            if !first {
                self.blank();
            }
            first = false;
            self.starter(starter);
        }

        for state in &behaviour.states {
            if !first {
                self.blank();
            }
            first = false;
            self.state(state);
        }
        self.close();
    }

    fn starter(
        &mut self,
        starter: &Starter,
    ) {
        self.open("starter");
        for assigner in &starter.assigners {
            let mut text = format!("assign {}", assigner.object);
            if !assigner.fields.is_empty() {
                text.push('(');
                text.push_str(&assign_list(&assigner.fields));
                text.push(')');
            }
            text.push(';');
            self.line(&text);
        }
        self.close();
    }

    fn state(
        &mut self,
        state: &State,
    ) {
        self.attributes(&state.attributes);
        let target = state.target.as_ref().map(ToString::to_string).unwrap_or_default();
        self.open(&format!("state {}({})", state.name, target));
        for body in &state.bodies {
            self.body(body);
        }
        self.close();
    }

    fn body(
        &mut self,
        body: &StateBody,
    ) {
        let header = match &body.condition {
            Some(condition) => {
                let parameter = condition.parameter.as_ref().map(print_expr).unwrap_or_default();
                format!(
                    "if {}{}({})",
                    if condition.negate { "not " } else { "" },
                    catalogue::condition_name(condition.id),
                    parameter
                )
            }
            None => "do".to_string(),
        };
        self.open(&header);
        self.commands(&body.commands);
        if let Some(jump) = &body.jump {
            self.line(&format!("goto {};", jump));
        }
        self.close();
    }

    fn commands(
        &mut self,
        commands: &[Command],
    ) {
        for command in commands {
            let args: Vec<_> = command.args.iter().map(print_expr).collect();
            self.line(&format!("{}({});", catalogue::command_name(command.id), args.join(", ")));
        }
    }

    fn sequence(
        &mut self,
        sequence: &Sequence,
    ) {
        self.attributes(&sequence.attributes);
        self.open(&format!("sequence {}", sequence.name));
        self.consts(&sequence.consts);
        for pack in &sequence.packs {
            self.open(&format!("pack({})", pack.script));
            self.commands(&pack.commands);
            self.close();
        }
        self.commands(&sequence.commands);
        self.close();
    }
}

fn assign_list(assigns: &[Assign]) -> String {
    assigns
        .iter()
        .map(|a| format!("{} = {}", a.name, print_expr(&a.value)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn attribute_text(kind: &AttributeKind) -> String {
    let args = match kind {
        AttributeKind::GlobalIndex(expr)
        | AttributeKind::Priority(expr)
        | AttributeKind::InstanceType(expr)
        | AttributeKind::UseObjectSlot(expr)
        | AttributeKind::Unknown(expr) => Some(print_expr(expr)),
        AttributeKind::StartFrom(state) => Some(state.clone()),
        AttributeKind::ControlPacket(body) => {
            let mut parts = Vec::new();
            if !body.settings.is_empty() {
                parts.push(assign_list(&body.settings));
            }
            parts.extend(body.data.iter().map(print_expr));
            Some(parts.join(", "))
        }
        AttributeKind::NonBlocking | AttributeKind::SkipFirstBody => None,
    };
    match args {
        Some(args) => format!("[{}({})]", kind.name(), args),
        None => format!("[{}]", kind.name()),
    }
}
