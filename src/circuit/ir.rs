//! Structured description of the generated circuit.
//!
//! The synthesizer builds a [`CircuitProgram`]; the renderer turns it into circom text
//! and the lowering turns it into R1CS constraints. Neither consumer ever sees a
//! string template.

use std::fmt;

/// Whole circuit: one module per emitted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitProgram {
    pub modules: Vec<Module>,
}

impl CircuitProgram {
    /// Find the module defining `template`.
    pub fn template(&self, name: &str) -> Option<&Template> {
        self.modules
            .iter()
            .map(|m| &m.template)
            .find(|t| t.name == name)
    }

    /// The module instantiating the main component.
    pub fn main_module(&self) -> Option<&Module> {
        self.modules.iter().find(|m| m.main.is_some())
    }
}

/// A single emitted file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub file_name: String,
    /// Files pulled in with `include`, resolved against the compiler's library path
    pub includes: Vec<String>,
    pub template: Template,
    pub main: Option<MainComponent>,
}

/// `component main {public [...]} = Template();`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainComponent {
    /// Input signals exposed as public inputs
    pub public: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub signals: Vec<SignalDecl>,
    pub components: Vec<ComponentDecl>,
    pub body: Vec<Stmt>,
}

impl Template {
    pub fn signal(&self, name: &str) -> Option<&SignalDecl> {
        self.signals.iter().find(|s| s.name == name)
    }

    pub fn component(&self, name: &str) -> Option<&ComponentDecl> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Signals of the given kind, in declaration order.
    pub fn signals_of(&self, kind: SignalKind) -> impl Iterator<Item = &SignalDecl> {
        self.signals.iter().filter(move |s| s.kind == kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    Input,
    Output,
    Intermediate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignalDecl {
    pub name: String,
    pub kind: SignalKind,
    /// Array length; `None` for a scalar signal
    pub len: Option<usize>,
}

impl SignalDecl {
    pub fn input(name: &str, len: Option<usize>) -> Self {
        Self::new(name, SignalKind::Input, len)
    }

    pub fn output(name: &str) -> Self {
        Self::new(name, SignalKind::Output, None)
    }

    pub fn intermediate(name: &str, len: Option<usize>) -> Self {
        Self::new(name, SignalKind::Intermediate, len)
    }

    fn new(name: &str, kind: SignalKind, len: Option<usize>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            len,
        }
    }

    pub fn width(&self) -> usize {
        self.len.unwrap_or(1)
    }
}

/// Library gadgets the circuit instantiates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gadget {
    /// `Poseidon(2)`: ports `inputs[0]`, `inputs[1]`, `out`
    Poseidon2,
    /// `IsZero()`: ports `in`, `out`
    IsZero,
    /// `LessThan(bits)`: ports `in[0]`, `in[1]`, `out`
    LessThan { bits: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentKind {
    Gadget(Gadget),
    /// Another template of the program
    Template(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDecl {
    pub name: String,
    pub len: Option<usize>,
    pub kind: ComponentKind,
}

impl ComponentDecl {
    pub fn gadget(name: &str, len: Option<usize>, gadget: Gadget) -> Self {
        Self {
            name: name.to_string(),
            len,
            kind: ComponentKind::Gadget(gadget),
        }
    }

    pub fn template(name: &str, template: &str) -> Self {
        Self {
            name: name.to_string(),
            len: None,
            kind: ComponentKind::Template(template.to_string()),
        }
    }
}

/// Affine index expression over loop variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Index {
    Const(usize),
    Var(String),
    Add(Box<Index>, Box<Index>),
    Sub(Box<Index>, Box<Index>),
    /// Constant multiple
    Mul(usize, Box<Index>),
}

impl Index {
    pub fn var(name: &str) -> Self {
        Index::Var(name.to_string())
    }

    pub fn plus(self, k: usize) -> Self {
        Index::Add(Box::new(self), Box::new(Index::Const(k)))
    }

    pub fn minus(self, k: usize) -> Self {
        Index::Sub(Box::new(self), Box::new(Index::Const(k)))
    }

    pub fn times(self, k: usize) -> Self {
        Index::Mul(k, Box::new(self))
    }
}

impl From<usize> for Index {
    fn from(value: usize) -> Self {
        Index::Const(value)
    }
}

/// A named port of a component, optionally indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub name: String,
    pub index: Option<Index>,
}

/// A signal, or a port of a component, optionally indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Place {
    pub name: String,
    pub index: Option<Index>,
    pub port: Option<Port>,
}

impl Place {
    pub fn signal(name: &str) -> Self {
        Self {
            name: name.to_string(),
            index: None,
            port: None,
        }
    }

    pub fn at(mut self, index: impl Into<Index>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn port(mut self, name: &str) -> Self {
        self.port = Some(Port {
            name: name.to_string(),
            index: None,
        });
        self
    }

    pub fn port_at(mut self, name: &str, index: impl Into<Index>) -> Self {
        self.port = Some(Port {
            name: name.to_string(),
            index: Some(index.into()),
        });
        self
    }
}

/// Arithmetic expression over field elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Const(u64),
    Place(Place),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    /// Integer division; only defined on constants
    IntDiv(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn add(a: Expr, b: Expr) -> Self {
        Expr::Add(Box::new(a), Box::new(b))
    }

    pub fn sub(a: Expr, b: Expr) -> Self {
        Expr::Sub(Box::new(a), Box::new(b))
    }

    pub fn mul(a: Expr, b: Expr) -> Self {
        Expr::Mul(Box::new(a), Box::new(b))
    }

    pub fn int_div(a: Expr, b: Expr) -> Self {
        Expr::IntDiv(Box::new(a), Box::new(b))
    }
}

impl From<Place> for Expr {
    fn from(place: Place) -> Self {
        Expr::Place(place)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// `for (var v = from; v < to; v++) { body }`
    For {
        var: String,
        from: Index,
        to: Index,
        body: Vec<Stmt>,
    },
    /// `name[index] = Kind(...);`
    Instantiate { component: Place },
    /// `target <== value;`
    Assign { target: Place, value: Expr },
    /// `left === right;`
    Assert { left: Expr, right: Expr },
    Comment(String),
}

impl Stmt {
    pub fn for_range(var: &str, from: usize, to: usize, body: Vec<Stmt>) -> Self {
        Stmt::For {
            var: var.to_string(),
            from: Index::Const(from),
            to: Index::Const(to),
            body,
        }
    }

    pub fn instantiate(component: Place) -> Self {
        Stmt::Instantiate { component }
    }

    pub fn assign(target: Place, value: impl Into<Expr>) -> Self {
        Stmt::Assign {
            target,
            value: value.into(),
        }
    }

    pub fn assert_eq(left: impl Into<Expr>, right: impl Into<Expr>) -> Self {
        Stmt::Assert {
            left: left.into(),
            right: right.into(),
        }
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Stmt::Comment(text.into())
    }
}

impl fmt::Display for Gadget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gadget::Poseidon2 => write!(f, "Poseidon(2)"),
            Gadget::IsZero => write!(f, "IsZero()"),
            Gadget::LessThan { bits } => write!(f, "LessThan({})", bits),
        }
    }
}
