// Compilation of expressions into stack bytecode
use std::collections::HashMap;

use super::error::SymbolicError;
use super::expr::{Expr, Node, Symbol};

/// Opcode set of the expression VM.
#[derive(Debug, Clone, PartialEq)]
pub enum Opcode {
    PushConst(f64),
    LoadArg(usize),
    LoadLocal(usize),
    StoreLocal(usize),
    // Pop `n` values and push their sum
    Add(usize),
    // Pop `n` values and push their product
    Mul(usize),
    Powi(i32),
    Powf(f64),
}

/// A numeric function of a fixed list of symbols.
///
/// Built by [`lambdify`]. Subexpressions shared in the DAG are computed once
/// per call and cached in local slots.
#[derive(Debug, Clone)]
pub struct CompiledFn {
    args: Vec<Symbol>,
    code: Vec<Opcode>,
    n_locals: usize,
}

/// Compile `expr` into a callable taking `args` in the given order.
///
/// Every free symbol of `expr` must be listed in `args`.
pub fn lambdify(expr: &Expr, args: &[Symbol]) -> Result<CompiledFn, SymbolicError> {
    let arg_slots: HashMap<Symbol, usize> = args
        .iter()
        .enumerate()
        .map(|(i, s)| (s.clone(), i))
        .collect();

    let mut parents = HashMap::new();
    count_parents(expr, &mut parents);

    let mut compiler = Compiler {
        arg_slots,
        parents,
        slots: HashMap::new(),
        code: Vec::new(),
    };
    compiler.emit(expr)?;

    Ok(CompiledFn {
        args: args.to_vec(),
        n_locals: compiler.slots.len(),
        code: compiler.code,
    })
}

impl CompiledFn {
    pub fn args(&self) -> &[Symbol] {
        &self.args
    }

    pub fn code(&self) -> &[Opcode] {
        &self.code
    }

    /// Evaluate at `values`, given in the order of [`CompiledFn::args`].
    pub fn call(&self, values: &[f64]) -> Result<f64, SymbolicError> {
        if values.len() != self.args.len() {
            return Err(SymbolicError::Arity {
                expected: self.args.len(),
                found: values.len(),
            });
        }
        let mut locals = vec![0.0; self.n_locals];
        Ok(run_bytecode(&self.code, values, &mut locals))
    }
}

/// Execute compiled opcodes.
///
/// Code produced by [`lambdify`] is balanced, so the stack never underflows.
fn run_bytecode(code: &[Opcode], args: &[f64], locals: &mut [f64]) -> f64 {
    let mut stack: Vec<f64> = Vec::with_capacity(16);
    for op in code {
        match op {
            Opcode::PushConst(v) => stack.push(*v),
            Opcode::LoadArg(i) => stack.push(args[*i]),
            Opcode::LoadLocal(i) => stack.push(locals[*i]),
            Opcode::StoreLocal(i) => {
                locals[*i] = stack.pop().unwrap_or(f64::NAN);
            }
            Opcode::Add(n) => {
                let at = stack.len() - n;
                let v: f64 = stack.drain(at..).sum();
                stack.push(v);
            }
            Opcode::Mul(n) => {
                let at = stack.len() - n;
                let v: f64 = stack.drain(at..).product();
                stack.push(v);
            }
            Opcode::Powi(e) => {
                let b = stack.pop().unwrap_or(f64::NAN);
                stack.push(b.powi(*e));
            }
            Opcode::Powf(e) => {
                let b = stack.pop().unwrap_or(f64::NAN);
                stack.push(b.powf(*e));
            }
        }
    }
    stack.pop().unwrap_or(f64::NAN)
}

struct Compiler {
    arg_slots: HashMap<Symbol, usize>,
    parents: HashMap<*const Node, usize>,
    slots: HashMap<*const Node, usize>,
    code: Vec<Opcode>,
}

impl Compiler {
    fn emit(&mut self, expr: &Expr) -> Result<(), SymbolicError> {
        match expr.node() {
            Node::Const(v) => {
                self.code.push(Opcode::PushConst(*v));
                return Ok(());
            }
            Node::Symbol(s) => {
                let slot = self
                    .arg_slots
                    .get(s)
                    .ok_or_else(|| SymbolicError::UnboundSymbol {
                        symbol: s.name().to_string(),
                    })?;
                self.code.push(Opcode::LoadArg(*slot));
                return Ok(());
            }
            _ => {}
        }

        if let Some(slot) = self.slots.get(&expr.id()) {
            self.code.push(Opcode::LoadLocal(*slot));
            return Ok(());
        }

        match expr.node() {
            Node::Add(terms) => {
                for t in terms {
                    self.emit(t)?;
                }
                self.code.push(Opcode::Add(terms.len()));
            }
            Node::Mul(factors) => {
                for f in factors {
                    self.emit(f)?;
                }
                self.code.push(Opcode::Mul(factors.len()));
            }
            Node::Pow(base, exponent) => {
                self.emit(base)?;
                if exponent.fract() == 0.0 && exponent.abs() <= f64::from(i32::MAX) {
                    self.code.push(Opcode::Powi(*exponent as i32));
                } else {
                    self.code.push(Opcode::Powf(*exponent));
                }
            }
            Node::Const(_) | Node::Symbol(_) => {}
        }

        if self.parents.get(&expr.id()).copied().unwrap_or(0) > 1 {
            let slot = self.slots.len();
            self.slots.insert(expr.id(), slot);
            self.code.push(Opcode::StoreLocal(slot));
            self.code.push(Opcode::LoadLocal(slot));
        }
        Ok(())
    }
}

fn count_parents(expr: &Expr, parents: &mut HashMap<*const Node, usize>) {
    let seen = parents.entry(expr.id()).or_insert(0);
    *seen += 1;
    if *seen > 1 {
        return;
    }
    match expr.node() {
        Node::Const(_) | Node::Symbol(_) => {}
        Node::Add(children) | Node::Mul(children) => {
            for child in children {
                count_parents(child, parents);
            }
        }
        Node::Pow(base, _) => count_parents(base, parents),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::Bindings;

    #[test]
    fn compiled_matches_tree_evaluation() {
        let k = Symbol::new("k");
        let s = Symbol::new("sigma");
        let ke = Expr::symbol(&k);
        let shared = (&ke - 1.0).powi(2);
        let e = &shared * &shared + Expr::symbol(&s) * ke.powf(0.25) + 0.5;

        let f = lambdify(&e, &[k.clone(), s.clone()]).unwrap();
        let mut values = Bindings::new();
        values.insert(k, 1.7);
        values.insert(s, 0.3);
        let expected = e.eval(&values).unwrap();
        assert!((f.call(&[1.7, 0.3]).unwrap() - expected).abs() < 1e-14);
    }

    #[test]
    fn shared_nodes_use_locals() {
        let x = Symbol::new("x");
        let inner = Expr::symbol(&x) + 2.0;
        let e = Expr::sum([inner.powi(3), inner.powf(0.5)]);
        let f = lambdify(&e, &[x]).unwrap();
        assert!(f.code().iter().any(|op| matches!(op, Opcode::StoreLocal(_))));
        let expected = 27.0 + 3.0_f64.sqrt();
        assert!((f.call(&[1.0]).unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn undeclared_symbol_fails_to_compile() {
        let x = Symbol::new("x");
        let e = Expr::symbol(&x) * 2.0;
        assert!(matches!(
            lambdify(&e, &[]),
            Err(SymbolicError::UnboundSymbol { .. })
        ));
    }

    #[test]
    fn arity_is_checked() {
        let x = Symbol::new("x");
        let f = lambdify(&Expr::symbol(&x), &[x]).unwrap();
        assert!(matches!(
            f.call(&[1.0, 2.0]),
            Err(SymbolicError::Arity {
                expected: 1,
                found: 2
            })
        ));
    }
}
