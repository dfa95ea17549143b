//! Circom text rendering of a [`CircuitProgram`].
//!
//! Output depends only on the program, so it is byte-identical across runs.

use std::fmt::Write as _;

use super::ir::{
    CircuitProgram, ComponentKind, Expr, Index, Module, Place, SignalKind, Stmt, Template,
};
use crate::config::CIRCOM_VERSION;
use crate::{Result, UniqueRowsError};

const INDENT: &str = "    ";

/// Render every module of `program`, in order, as `(file name, text)` pairs.
pub fn render_program(program: &CircuitProgram) -> Result<Vec<(String, String)>> {
    program
        .modules
        .iter()
        .map(|module| Ok((module.file_name.clone(), render_module(module)?)))
        .collect()
}

/// Render a single module.
pub fn render_module(module: &Module) -> Result<String> {
    let mut out = String::new();
    let _ = writeln!(out, "pragma circom {};", CIRCOM_VERSION);
    out.push('\n');
    for include in &module.includes {
        let _ = writeln!(out, "include \"{}\";", include);
    }
    out.push('\n');

    render_template(&mut out, &module.template)?;

    if let Some(main) = &module.main {
        out.push('\n');
        if main.public.is_empty() {
            let _ = writeln!(out, "component main = {}();", module.template.name);
        } else {
            let _ = writeln!(
                out,
                "component main {{public [{}]}} = {}();",
                main.public.join(", "),
                module.template.name
            );
        }
    }
    Ok(out)
}

fn render_template(out: &mut String, template: &Template) -> Result<()> {
    let _ = writeln!(out, "template {}() {{", template.name);

    for signal in &template.signals {
        let kind = match signal.kind {
            SignalKind::Input => "signal input",
            SignalKind::Output => "signal output",
            SignalKind::Intermediate => "signal",
        };
        let _ = writeln!(out, "{}{} {}{};", INDENT, kind, signal.name, array_suffix(signal.len));
    }

    if !template.components.is_empty() {
        out.push('\n');
        for component in &template.components {
            let _ = writeln!(
                out,
                "{}component {}{};",
                INDENT,
                component.name,
                array_suffix(component.len)
            );
        }
    }

    out.push('\n');
    for stmt in &template.body {
        render_stmt(out, template, stmt, 1)?;
    }
    out.push_str("}\n");
    Ok(())
}

fn array_suffix(len: Option<usize>) -> String {
    len.map(|n| format!("[{}]", n)).unwrap_or_default()
}

fn render_stmt(out: &mut String, template: &Template, stmt: &Stmt, depth: usize) -> Result<()> {
    let pad = INDENT.repeat(depth);
    match stmt {
        Stmt::For {
            var,
            from,
            to,
            body,
        } => {
            let _ = writeln!(
                out,
                "{}for (var {v} = {}; {v} < {}; {v}++) {{",
                pad,
                render_index(from),
                render_index(to),
                v = var
            );
            for inner in body {
                render_stmt(out, template, inner, depth + 1)?;
            }
            let _ = writeln!(out, "{}}}", pad);
        }
        Stmt::Instantiate { component } => {
            let decl = template.component(&component.name).ok_or_else(|| {
                UniqueRowsError::Circuit(format!(
                    "{}: instantiating undeclared component {}",
                    template.name, component.name
                ))
            })?;
            let call = match &decl.kind {
                ComponentKind::Gadget(gadget) => gadget.to_string(),
                ComponentKind::Template(name) => format!("{}()", name),
            };
            let _ = writeln!(out, "{}{} = {};", pad, render_place(component), call);
        }
        Stmt::Assign { target, value } => {
            let _ = writeln!(out, "{}{} <== {};", pad, render_place(target), render_expr(value));
        }
        Stmt::Assert { left, right } => {
            let _ = writeln!(out, "{}{} === {};", pad, render_expr(left), render_expr(right));
        }
        Stmt::Comment(text) => {
            let _ = writeln!(out, "{}// {}", pad, text);
        }
    }
    Ok(())
}

fn render_place(place: &Place) -> String {
    let mut s = place.name.clone();
    if let Some(index) = &place.index {
        let _ = write!(s, "[{}]", render_index(index));
    }
    if let Some(port) = &place.port {
        let _ = write!(s, ".{}", port.name);
        if let Some(index) = &port.index {
            let _ = write!(s, "[{}]", render_index(index));
        }
    }
    s
}

fn index_precedence(index: &Index) -> u8 {
    match index {
        Index::Add(..) | Index::Sub(..) => 1,
        Index::Mul(..) => 2,
        Index::Const(_) | Index::Var(_) => 3,
    }
}

fn render_index(index: &Index) -> String {
    match index {
        Index::Const(k) => k.to_string(),
        Index::Var(v) => v.clone(),
        Index::Add(a, b) => format!("{} + {}", render_index(a), wrap_index(b, 2)),
        Index::Sub(a, b) => format!("{} - {}", render_index(a), wrap_index(b, 2)),
        Index::Mul(k, inner) => format!("{} * {}", k, wrap_index(inner, 2)),
    }
}

fn wrap_index(index: &Index, min_precedence: u8) -> String {
    if index_precedence(index) < min_precedence {
        format!("({})", render_index(index))
    } else {
        render_index(index)
    }
}

fn expr_precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::Add(..) | Expr::Sub(..) => 1,
        Expr::Mul(..) | Expr::IntDiv(..) => 2,
        Expr::Const(_) | Expr::Place(_) => 3,
    }
}

fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Const(k) => k.to_string(),
        Expr::Place(place) => render_place(place),
        Expr::Add(a, b) => format!("{} + {}", wrap_expr(a, 1), wrap_expr(b, 2)),
        Expr::Sub(a, b) => format!("{} - {}", wrap_expr(a, 1), wrap_expr(b, 2)),
        Expr::Mul(a, b) => format!("{} * {}", wrap_expr(a, 2), wrap_expr(b, 3)),
        // Parenthesize products on the left as well; `\` binds like `*` in circom
        Expr::IntDiv(a, b) => format!("{} \\ {}", wrap_expr(a, 3), wrap_expr(b, 3)),
    }
}

fn wrap_expr(expr: &Expr, min_precedence: u8) -> String {
    if expr_precedence(expr) < min_precedence {
        format!("({})", render_expr(expr))
    } else {
        render_expr(expr)
    }
}
