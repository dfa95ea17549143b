//! In-process R1CS lowering of a [`CircuitProgram`].
//!
//! Walks the same IR the renderer prints and emits constraints through the nova-snark
//! frontend, using the gadgets in [`super::gadgets`] for `Poseidon(2)`, `IsZero()` and
//! `LessThan(n)`. Running it on a [`TestConstraintSystem`] gives the public outputs, a
//! constraint count and a satisfiability check without the external toolchain.
//!
//! Signals assigned with `<==` are bound to the operand's variable rather than copied,
//! so the constraint count is close to, not equal to, what circom reports.

use ff::PrimeFieldBits;
use nova_snark::frontend::{
    gadgets::num::AllocatedNum, util_cs::test_cs::TestConstraintSystem, ConstraintSystem,
    SynthesisError, Variable,
};
use num_bigint::BigUint;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, debug_span};

use super::gadgets::{is_zero, less_than, poseidon_hash2_gadget};
use super::ir::{
    CircuitProgram, ComponentKind, Expr, Gadget, Index, Place, SignalKind, Stmt, Template,
};
use crate::poseidon::PoseidonContext;
use crate::utils::{field_from_be_bytes_mod_order, field_to_biguint};
use crate::{Result, UniqueRowsError};

/// Values for the main template's input signals, by signal name.
pub type SignalValues<F> = BTreeMap<String, Vec<F>>;

/// Outcome of evaluating the lowered circuit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation<F> {
    /// Main outputs in declaration order
    pub outputs: Vec<(String, F)>,
    /// Public inputs in declaration order
    pub public_inputs: Vec<(String, F)>,
    pub num_constraints: usize,
    pub satisfied: bool,
}

impl<F: Copy> Evaluation<F> {
    pub fn output(&self, name: &str) -> Option<F> {
        self.outputs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    /// Public signals in the order a Groth16 verifier sees them: outputs, then public
    /// inputs.
    pub fn public_signals(&self) -> Vec<F> {
        self.outputs
            .iter()
            .chain(self.public_inputs.iter())
            .map(|(_, v)| *v)
            .collect()
    }
}

/// Allocated main-template public signals.
pub struct LoweredMain<F: PrimeFieldBits> {
    pub outputs: Vec<(String, AllocatedNum<F>)>,
    pub public_inputs: Vec<(String, AllocatedNum<F>)>,
}

/// Lower `program` into a fresh [`TestConstraintSystem`] and read back the results.
pub fn evaluate<F: PrimeFieldBits>(
    program: &CircuitProgram,
    ctx: &PoseidonContext<F>,
    inputs: &SignalValues<F>,
) -> Result<Evaluation<F>> {
    let _span = debug_span!("evaluate_circuit").entered();
    let mut cs = TestConstraintSystem::<F>::new();
    let lowered = lower_program(&mut cs, program, ctx, inputs)?;

    let read = |signals: Vec<(String, AllocatedNum<F>)>| -> Result<Vec<(String, F)>> {
        signals
            .into_iter()
            .map(|(name, num)| {
                let value = num.get_value().ok_or(SynthesisError::AssignmentMissing)?;
                Ok((name, value))
            })
            .collect()
    };

    let evaluation = Evaluation {
        outputs: read(lowered.outputs)?,
        public_inputs: read(lowered.public_inputs)?,
        num_constraints: cs.num_constraints(),
        satisfied: cs.is_satisfied(),
    };
    debug!(
        "Lowered circuit: {} constraints, satisfied={}",
        evaluation.num_constraints, evaluation.satisfied
    );
    Ok(evaluation)
}

/// Lower `program` into `cs`, allocating the main template's inputs from `inputs`.
pub fn lower_program<F: PrimeFieldBits, CS: ConstraintSystem<F>>(
    cs: &mut CS,
    program: &CircuitProgram,
    ctx: &PoseidonContext<F>,
    inputs: &SignalValues<F>,
) -> Result<LoweredMain<F>> {
    let module = program
        .main_module()
        .ok_or_else(|| UniqueRowsError::Circuit("program has no main component".to_string()))?;
    let public: &[String] = module
        .main
        .as_ref()
        .map(|m| m.public.as_slice())
        .unwrap_or(&[]);
    let template = &module.template;

    let mut lowering = Lowering {
        program,
        ctx,
        next_id: 0,
    };

    let mut frame = Frame::new(template);
    let mut public_inputs = Vec::new();
    for decl in template.signals_of(SignalKind::Input) {
        let values = inputs.get(&decl.name).ok_or_else(|| {
            UniqueRowsError::Circuit(format!("missing value for input {}", decl.name))
        })?;
        if values.len() != decl.width() {
            return Err(UniqueRowsError::Circuit(format!(
                "input {} expects {} value(s), got {}",
                decl.name,
                decl.width(),
                values.len()
            )));
        }
        let is_public = public.contains(&decl.name);
        for (i, value) in values.iter().enumerate() {
            let name = lowering.fresh(&decl.name);
            let num = if is_public {
                AllocatedNum::alloc_input(cs.namespace(|| name), || Ok(*value))?
            } else {
                AllocatedNum::alloc(cs.namespace(|| name), || Ok(*value))?
            };
            if is_public {
                public_inputs.push((decl.name.clone(), num.clone()));
            }
            frame.bind(&decl.name, i, num)?;
        }
    }

    let outputs = lowering.run(cs, template, frame, true)?;
    Ok(LoweredMain {
        outputs,
        public_inputs,
    })
}

#[derive(Clone)]
enum Operand<F: PrimeFieldBits> {
    Constant(F),
    Allocated(AllocatedNum<F>),
}

impl<F: PrimeFieldBits> Operand<F> {
    fn value(&self) -> Option<F> {
        match self {
            Operand::Constant(c) => Some(*c),
            Operand::Allocated(num) => num.get_value(),
        }
    }

    fn term<CS: ConstraintSystem<F>>(&self) -> (F, Variable) {
        match self {
            Operand::Constant(c) => (*c, CS::one()),
            Operand::Allocated(num) => (F::ONE, num.get_variable()),
        }
    }
}

type PortKey = (String, Option<usize>);

struct Instance<F: PrimeFieldBits> {
    kind: ComponentKind,
    inputs: HashMap<PortKey, AllocatedNum<F>>,
    outputs: Option<HashMap<PortKey, AllocatedNum<F>>>,
}

struct Frame<'t, F: PrimeFieldBits> {
    template: &'t Template,
    signals: HashMap<String, Vec<Option<AllocatedNum<F>>>>,
    components: HashMap<String, Vec<Option<Instance<F>>>>,
    vars: HashMap<String, usize>,
}

impl<'t, F: PrimeFieldBits> Frame<'t, F> {
    fn new(template: &'t Template) -> Self {
        let signals = template
            .signals
            .iter()
            .map(|s| (s.name.clone(), vec![None; s.width()]))
            .collect();
        let components = template
            .components
            .iter()
            .map(|c| {
                let slots = (0..c.len.unwrap_or(1)).map(|_| None).collect();
                (c.name.clone(), slots)
            })
            .collect();
        Self {
            template,
            signals,
            components,
            vars: HashMap::new(),
        }
    }

    fn error(&self, msg: impl std::fmt::Display) -> UniqueRowsError {
        UniqueRowsError::Circuit(format!("{}: {}", self.template.name, msg))
    }

    fn bind(&mut self, name: &str, slot: usize, num: AllocatedNum<F>) -> Result<()> {
        let template = self.template.name.clone();
        let entry = self
            .signals
            .get_mut(name)
            .and_then(|slots| slots.get_mut(slot))
            .ok_or_else(|| {
                UniqueRowsError::Circuit(format!("{}: no signal {}[{}]", template, name, slot))
            })?;
        if entry.is_some() {
            return Err(UniqueRowsError::Circuit(format!(
                "{}: signal {}[{}] assigned twice",
                template, name, slot
            )));
        }
        *entry = Some(num);
        Ok(())
    }

    fn eval_index(&self, index: &Index) -> Result<usize> {
        match index {
            Index::Const(k) => Ok(*k),
            Index::Var(v) => self
                .vars
                .get(v)
                .copied()
                .ok_or_else(|| self.error(format!("unbound loop variable {}", v))),
            Index::Add(a, b) => Ok(self.eval_index(a)? + self.eval_index(b)?),
            Index::Sub(a, b) => self
                .eval_index(a)?
                .checked_sub(self.eval_index(b)?)
                .ok_or_else(|| self.error("negative index")),
            Index::Mul(k, inner) => Ok(k * self.eval_index(inner)?),
        }
    }

    /// Resolve an optional index against a declared length.
    fn slot(&self, name: &str, len: Option<usize>, index: Option<&Index>) -> Result<usize> {
        match (len, index) {
            (None, None) => Ok(0),
            (Some(len), Some(index)) => {
                let i = self.eval_index(index)?;
                if i >= len {
                    return Err(self.error(format!("{}[{}] out of bounds ({})", name, i, len)));
                }
                Ok(i)
            }
            (None, Some(_)) => Err(self.error(format!("{} is not an array", name))),
            (Some(_), None) => Err(self.error(format!("{} needs an index", name))),
        }
    }

    fn port_key(&self, place: &Place) -> Result<Option<PortKey>> {
        place
            .port
            .as_ref()
            .map(|port| {
                let index = port.index.as_ref().map(|i| self.eval_index(i)).transpose()?;
                Ok((port.name.clone(), index))
            })
            .transpose()
    }
}

fn port_input<'i, F: PrimeFieldBits>(
    inputs: &'i HashMap<PortKey, AllocatedNum<F>>,
    component: &str,
    slot: usize,
    port: &str,
    index: Option<usize>,
) -> Result<&'i AllocatedNum<F>> {
    inputs.get(&(port.to_string(), index)).ok_or_else(|| {
        UniqueRowsError::Circuit(format!(
            "{}[{}].{}{} not assigned",
            component,
            slot,
            port,
            index.map(|i| format!("[{}]", i)).unwrap_or_default()
        ))
    })
}

struct Lowering<'a, F: PrimeFieldBits> {
    program: &'a CircuitProgram,
    ctx: &'a PoseidonContext<F>,
    next_id: usize,
}

impl<'a, F: PrimeFieldBits> Lowering<'a, F> {
    /// Unique constraint-system name.
    fn fresh(&mut self, label: &str) -> String {
        self.next_id += 1;
        format!("{}_{}", label, self.next_id)
    }

    /// Execute `template` in `frame` and return its outputs in declaration order.
    ///
    /// In the main template, outputs are allocated as public inputs.
    fn run<CS: ConstraintSystem<F>>(
        &mut self,
        cs: &mut CS,
        template: &'a Template,
        mut frame: Frame<'a, F>,
        is_main: bool,
    ) -> Result<Vec<(String, AllocatedNum<F>)>> {
        for stmt in &template.body {
            self.exec(cs, &mut frame, stmt, is_main)?;
        }

        // Components whose outputs nobody read still contribute constraints
        for decl in &template.components {
            for slot in 0..decl.len.unwrap_or(1) {
                self.ensure_evaluated(cs, &mut frame, &decl.name, slot)?;
            }
        }

        let mut outputs = Vec::new();
        for decl in template.signals_of(SignalKind::Output) {
            let num = frame
                .signals
                .get(&decl.name)
                .and_then(|slots| slots.first().cloned().flatten())
                .ok_or_else(|| frame.error(format!("output {} never assigned", decl.name)))?;
            outputs.push((decl.name.clone(), num));
        }
        Ok(outputs)
    }

    fn exec<CS: ConstraintSystem<F>>(
        &mut self,
        cs: &mut CS,
        frame: &mut Frame<'a, F>,
        stmt: &Stmt,
        is_main: bool,
    ) -> Result<()> {
        match stmt {
            Stmt::Comment(_) => Ok(()),
            Stmt::For {
                var,
                from,
                to,
                body,
            } => {
                let (from, to) = (frame.eval_index(from)?, frame.eval_index(to)?);
                let shadowed = frame.vars.get(var).copied();
                for value in from..to {
                    frame.vars.insert(var.clone(), value);
                    for inner in body {
                        self.exec(cs, frame, inner, is_main)?;
                    }
                }
                match shadowed {
                    Some(previous) => frame.vars.insert(var.clone(), previous),
                    None => frame.vars.remove(var),
                };
                Ok(())
            }
            Stmt::Instantiate { component } => {
                let decl = frame.template.component(&component.name).ok_or_else(|| {
                    frame.error(format!("undeclared component {}", component.name))
                })?;
                let slot = frame.slot(&decl.name, decl.len, component.index.as_ref())?;
                let kind = decl.kind.clone();
                let entry = frame
                    .components
                    .get_mut(&component.name)
                    .and_then(|slots| slots.get_mut(slot))
                    .ok_or_else(|| UniqueRowsError::Circuit(format!("no component slot {}", slot)))?;
                *entry = Some(Instance {
                    kind,
                    inputs: HashMap::new(),
                    outputs: None,
                });
                Ok(())
            }
            Stmt::Assign { target, value } => {
                let operand = self.eval_expr(cs, frame, value)?;
                self.assign(cs, frame, target, operand, is_main)
            }
            Stmt::Assert { left, right } => {
                let left = self.eval_expr(cs, frame, left)?;
                let right = self.eval_expr(cs, frame, right)?;
                let name = self.fresh("assert_eq");
                let (cl, vl) = left.term::<CS>();
                let (cr, vr) = right.term::<CS>();
                cs.enforce(
                    || name,
                    |lc| lc + (cl, vl) - (cr, vr),
                    |lc| lc + CS::one(),
                    |lc| lc,
                );
                Ok(())
            }
        }
    }

    fn assign<CS: ConstraintSystem<F>>(
        &mut self,
        cs: &mut CS,
        frame: &mut Frame<'a, F>,
        target: &Place,
        operand: Operand<F>,
        is_main: bool,
    ) -> Result<()> {
        match frame.port_key(target)? {
            None => {
                let decl = frame
                    .template
                    .signal(&target.name)
                    .ok_or_else(|| frame.error(format!("undeclared signal {}", target.name)))?;
                let slot = frame.slot(&decl.name, decl.len, target.index.as_ref())?;
                let num = if is_main && decl.kind == SignalKind::Output {
                    self.alloc_public_copy(cs, &decl.name, &operand)?
                } else {
                    self.materialize(cs, &decl.name, operand)?
                };
                frame.bind(&target.name, slot, num)
            }
            Some(port) => {
                let decl = frame.template.component(&target.name).ok_or_else(|| {
                    frame.error(format!("undeclared component {}", target.name))
                })?;
                let slot = frame.slot(&decl.name, decl.len, target.index.as_ref())?;
                let num = self.materialize(cs, &port.0, operand)?;
                let template_name = frame.template.name.clone();
                let instance = frame
                    .components
                    .get_mut(&target.name)
                    .and_then(|slots| slots.get_mut(slot))
                    .and_then(Option::as_mut)
                    .ok_or_else(|| {
                        UniqueRowsError::Circuit(format!(
                            "{}: {}[{}] used before instantiation",
                            template_name, target.name, slot
                        ))
                    })?;
                if instance.outputs.is_some() {
                    return Err(UniqueRowsError::Circuit(format!(
                        "{}: input {:?} of {}[{}] assigned after its outputs were read",
                        template_name, port, target.name, slot
                    )));
                }
                instance.inputs.insert(port, num);
                Ok(())
            }
        }
    }

    /// Turn an operand into a variable, constraining constants.
    fn materialize<CS: ConstraintSystem<F>>(
        &mut self,
        cs: &mut CS,
        label: &str,
        operand: Operand<F>,
    ) -> Result<AllocatedNum<F>> {
        match operand {
            Operand::Allocated(num) => Ok(num),
            Operand::Constant(c) => {
                let name = self.fresh(label);
                let num = AllocatedNum::alloc(cs.namespace(|| name.clone()), || Ok(c))?;
                cs.enforce(
                    || format!("{}_is_constant", name),
                    |lc| lc + num.get_variable(),
                    |lc| lc + CS::one(),
                    |lc| lc + (c, CS::one()),
                );
                Ok(num)
            }
        }
    }

    fn alloc_public_copy<CS: ConstraintSystem<F>>(
        &mut self,
        cs: &mut CS,
        label: &str,
        operand: &Operand<F>,
    ) -> Result<AllocatedNum<F>> {
        let name = self.fresh(label);
        let value = operand.value();
        let num = AllocatedNum::alloc_input(cs.namespace(|| name.clone()), || {
            value.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let (c, v) = operand.term::<CS>();
        cs.enforce(
            || format!("{}_copy", name),
            |lc| lc + num.get_variable(),
            |lc| lc + CS::one(),
            |lc| lc + (c, v),
        );
        Ok(num)
    }

    fn read<CS: ConstraintSystem<F>>(
        &mut self,
        cs: &mut CS,
        frame: &mut Frame<'a, F>,
        place: &Place,
    ) -> Result<Operand<F>> {
        match frame.port_key(place)? {
            None => {
                let decl = frame
                    .template
                    .signal(&place.name)
                    .ok_or_else(|| frame.error(format!("undeclared signal {}", place.name)))?;
                let slot = frame.slot(&decl.name, decl.len, place.index.as_ref())?;
                frame
                    .signals
                    .get(&place.name)
                    .and_then(|slots| slots.get(slot).cloned().flatten())
                    .map(Operand::Allocated)
                    .ok_or_else(|| {
                        frame.error(format!("{}[{}] read before assignment", place.name, slot))
                    })
            }
            Some(port) => {
                let decl = frame.template.component(&place.name).ok_or_else(|| {
                    frame.error(format!("undeclared component {}", place.name))
                })?;
                let slot = frame.slot(&decl.name, decl.len, place.index.as_ref())?;
                self.ensure_evaluated(cs, frame, &place.name, slot)?;
                frame
                    .components
                    .get(&place.name)
                    .and_then(|slots| slots.get(slot))
                    .and_then(Option::as_ref)
                    .and_then(|instance| instance.outputs.as_ref())
                    .and_then(|outputs| outputs.get(&port).cloned())
                    .map(Operand::Allocated)
                    .ok_or_else(|| {
                        frame.error(format!("{}[{}] has no output {:?}", place.name, slot, port))
                    })
            }
        }
    }

    /// Evaluate a component once all of its inputs are assigned.
    fn ensure_evaluated<CS: ConstraintSystem<F>>(
        &mut self,
        cs: &mut CS,
        frame: &mut Frame<'a, F>,
        name: &str,
        slot: usize,
    ) -> Result<()> {
        let (kind, inputs) = match frame
            .components
            .get(name)
            .and_then(|slots| slots.get(slot))
            .and_then(Option::as_ref)
        {
            None => {
                return Err(frame.error(format!("{}[{}] never instantiated", name, slot)));
            }
            Some(instance) if instance.outputs.is_some() => return Ok(()),
            Some(instance) => (instance.kind.clone(), instance.inputs.clone()),
        };

        let input = |port: &str, index: Option<usize>| port_input(&inputs, name, slot, port, index);

        let outputs: HashMap<PortKey, AllocatedNum<F>> = match kind {
            ComponentKind::Gadget(Gadget::Poseidon2) => {
                let ns = self.fresh(name);
                let out = poseidon_hash2_gadget(
                    cs.namespace(|| ns),
                    self.ctx,
                    input("inputs", Some(0))?,
                    input("inputs", Some(1))?,
                )?;
                HashMap::from([(("out".to_string(), None), out)])
            }
            ComponentKind::Gadget(Gadget::IsZero) => {
                let ns = self.fresh(name);
                let out = is_zero(cs.namespace(|| ns), input("in", None)?)?;
                HashMap::from([(("out".to_string(), None), out)])
            }
            ComponentKind::Gadget(Gadget::LessThan { bits }) => {
                let ns = self.fresh(name);
                let out = less_than(
                    cs.namespace(|| ns),
                    bits,
                    input("in", Some(0))?,
                    input("in", Some(1))?,
                )?;
                HashMap::from([(("out".to_string(), None), out)])
            }
            ComponentKind::Template(template_name) => {
                let program = self.program;
                let template = program.template(&template_name).ok_or_else(|| {
                    UniqueRowsError::Circuit(format!("unknown template {}", template_name))
                })?;
                let mut sub = Frame::new(template);
                for decl in template.signals_of(SignalKind::Input) {
                    for i in 0..decl.width() {
                        let index = decl.len.map(|_| i);
                        sub.bind(&decl.name, i, input(&decl.name, index)?.clone())?;
                    }
                }
                self.run(cs, template, sub, false)?
                    .into_iter()
                    .map(|(port, num)| ((port, None), num))
                    .collect()
            }
        };

        if let Some(instance) = frame
            .components
            .get_mut(name)
            .and_then(|slots| slots.get_mut(slot))
            .and_then(Option::as_mut)
        {
            instance.outputs = Some(outputs);
        }
        Ok(())
    }

    fn eval_expr<CS: ConstraintSystem<F>>(
        &mut self,
        cs: &mut CS,
        frame: &mut Frame<'a, F>,
        expr: &Expr,
    ) -> Result<Operand<F>> {
        match expr {
            Expr::Const(k) => Ok(Operand::Constant(F::from(*k))),
            Expr::Place(place) => self.read(cs, frame, place),
            Expr::Add(a, b) => {
                let (a, b) = (self.eval_expr(cs, frame, a)?, self.eval_expr(cs, frame, b)?);
                self.linear(cs, "add", &a, &b, F::ONE)
            }
            Expr::Sub(a, b) => {
                let (a, b) = (self.eval_expr(cs, frame, a)?, self.eval_expr(cs, frame, b)?);
                self.linear(cs, "sub", &a, &b, -F::ONE)
            }
            Expr::Mul(a, b) => {
                let (a, b) = (self.eval_expr(cs, frame, a)?, self.eval_expr(cs, frame, b)?);
                self.product(cs, &a, &b)
            }
            Expr::IntDiv(a, b) => {
                let (a, b) = (self.eval_expr(cs, frame, a)?, self.eval_expr(cs, frame, b)?);
                match (a, b) {
                    (Operand::Constant(a), Operand::Constant(b)) => {
                        let divisor = field_to_biguint(&b);
                        if divisor == BigUint::from(0u32) {
                            return Err(frame.error("integer division by zero"));
                        }
                        let quotient = field_to_biguint(&a) / divisor;
                        Ok(Operand::Constant(field_from_be_bytes_mod_order(
                            &quotient.to_bytes_be(),
                        )))
                    }
                    _ => Err(frame.error("integer division of a signal")),
                }
            }
        }
    }

    /// `a + sign * b`.
    fn linear<CS: ConstraintSystem<F>>(
        &mut self,
        cs: &mut CS,
        label: &str,
        a: &Operand<F>,
        b: &Operand<F>,
        sign: F,
    ) -> Result<Operand<F>> {
        if let (Operand::Constant(x), Operand::Constant(y)) = (a, b) {
            return Ok(Operand::Constant(*x + sign * *y));
        }
        let value = match (a.value(), b.value()) {
            (Some(x), Some(y)) => Some(x + sign * y),
            _ => None,
        };
        let name = self.fresh(label);
        let result = AllocatedNum::alloc(cs.namespace(|| name.clone()), || {
            value.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let (ca, va) = a.term::<CS>();
        let (cb, vb) = b.term::<CS>();
        cs.enforce(
            || format!("{}_constraint", name),
            |lc| lc + (ca, va) + (sign * cb, vb),
            |lc| lc + CS::one(),
            |lc| lc + result.get_variable(),
        );
        Ok(Operand::Allocated(result))
    }

    fn product<CS: ConstraintSystem<F>>(
        &mut self,
        cs: &mut CS,
        a: &Operand<F>,
        b: &Operand<F>,
    ) -> Result<Operand<F>> {
        if let (Operand::Constant(x), Operand::Constant(y)) = (a, b) {
            return Ok(Operand::Constant(*x * *y));
        }
        let value = match (a.value(), b.value()) {
            (Some(x), Some(y)) => Some(x * y),
            _ => None,
        };
        let name = self.fresh("mul");
        let result = AllocatedNum::alloc(cs.namespace(|| name.clone()), || {
            value.ok_or(SynthesisError::AssignmentMissing)
        })?;
        let (ca, va) = a.term::<CS>();
        let (cb, vb) = b.term::<CS>();
        cs.enforce(
            || format!("{}_constraint", name),
            |lc| lc + (ca, va),
            |lc| lc + (cb, vb),
            |lc| lc + result.get_variable(),
        );
        Ok(Operand::Allocated(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{synthesize, CircuitSpec};
    use crate::commit::sorted_hashes;
    use crate::merkle::build_tree;
    use crate::FieldElement;
    use ff::Field;

    fn inputs_for(
        ctx: &PoseidonContext<FieldElement>,
        rows: &[FieldElement],
    ) -> (SignalValues<FieldElement>, FieldElement, FieldElement) {
        let original = build_tree(ctx, rows).unwrap();
        let sorted = build_tree(ctx, &sorted_hashes(rows)).unwrap();
        let mut inputs = SignalValues::new();
        inputs.insert("leaves_original".into(), original.padded_leaves().to_vec());
        inputs.insert("leaves_sorted".into(), sorted.padded_leaves().to_vec());
        inputs.insert("expectedRoot_original".into(), vec![original.root()]);
        inputs.insert("expectedRoot_sorted".into(), vec![sorted.root()]);
        (inputs, original.root(), sorted.root())
    }

    fn fe(v: u64) -> FieldElement {
        FieldElement::from(v)
    }

    #[test]
    fn test_lowered_roots_match_native_tree() {
        let ctx = PoseidonContext::new().unwrap();
        for n in [2u64, 3, 5] {
            let rows: Vec<_> = (1..=n).map(|v| fe(v * 1000 + 7)).collect();
            let (inputs, root_original, root_sorted) = inputs_for(&ctx, &rows);
            let program = synthesize(&CircuitSpec::new(rows.len(), None).unwrap());
            let eval = evaluate(&program, &ctx, &inputs).unwrap();

            assert!(eval.satisfied, "n={}", n);
            assert_eq!(eval.output("root_original"), Some(root_original));
            assert_eq!(eval.output("root_sorted"), Some(root_sorted));
            assert_eq!(eval.output("is_unique"), Some(FieldElement::ONE));
        }
    }

    #[test]
    fn test_duplicate_detected_and_threshold() {
        let ctx = PoseidonContext::new().unwrap();
        let rows = vec![fe(10), fe(20), fe(30), fe(10)];
        let (inputs, _, _) = inputs_for(&ctx, &rows);

        let program = synthesize(&CircuitSpec::new(4, Some(25)).unwrap());
        let eval = evaluate(&program, &ctx, &inputs).unwrap();
        assert!(eval.satisfied);
        assert_eq!(eval.output("is_unique"), Some(FieldElement::ZERO));
        // One duplicate, threshold floor(25 * 4 / 100) = 1, and 1 < 1 is false
        assert_eq!(eval.output("is_below_threshold"), Some(FieldElement::ZERO));

        let program = synthesize(&CircuitSpec::new(4, Some(50)).unwrap());
        let eval = evaluate(&program, &ctx, &inputs).unwrap();
        assert_eq!(eval.output("is_below_threshold"), Some(FieldElement::ONE));
    }

    #[test]
    fn test_public_signal_order() {
        let ctx = PoseidonContext::new().unwrap();
        let rows = vec![fe(1), fe(2), fe(3)];
        let (inputs, root_original, root_sorted) = inputs_for(&ctx, &rows);
        let program = synthesize(&CircuitSpec::new(3, None).unwrap());
        let eval = evaluate(&program, &ctx, &inputs).unwrap();

        assert_eq!(
            eval.public_signals(),
            vec![root_original, root_sorted, FieldElement::ONE, root_original, root_sorted]
        );
    }

    #[test]
    fn test_missing_input_is_an_error() {
        let ctx = PoseidonContext::new().unwrap();
        let program = synthesize(&CircuitSpec::new(2, None).unwrap());
        let result = evaluate(&program, &ctx, &SignalValues::new());
        assert!(matches!(result, Err(UniqueRowsError::Circuit(_))));
    }
}
