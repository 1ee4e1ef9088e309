//! Minimal computer-algebra engine
//!
//! Provides exactly the capabilities the perturbation pipeline relies on:
//!
//! - [`Symbol`] declaration and [`Expr`] construction with `+ - * /`,
//!   constant powers and locally simplifying constructors
//! - partial differentiation ([`Expr::diff`], [`Expr::diff_n`])
//! - exact symbol replacement ([`Expr::xreplace`]) and numeric substitution
//!   ([`Expr::subs`])
//! - numeric evaluation ([`Expr::eval`])
//! - solving a polynomial equation of degree at most two in one unknown
//!   ([`solve`])
//! - compilation into a numeric callable ([`lambdify`])
//!
//! Expressions are immutable and reference counted; rewrites share untouched
//! subtrees, and every traversal is memoized on node identity so repeated
//! derivatives stay tractable.
//!
//! ```rust
//! use pertsol::symbolic::{lambdify, Expr, Symbol};
//!
//! let k = Symbol::new("k");
//! let f = Expr::symbol(&k).powf(0.25).scale(0.2);
//! let df = lambdify(&f.diff(&k), &[k]).unwrap();
//! assert!((df.call(&[1.0]).unwrap() - 0.05).abs() < 1e-15);
//! ```

mod diff;
mod error;
mod eval;
mod expr;
mod lambdify;
mod solve;
mod subs;

pub use error::SymbolicError;
pub use expr::{Expr, Node, Symbol};
pub use lambdify::{lambdify, CompiledFn, Opcode};
pub use solve::{polynomial_coefficients, solve, Solutions};
pub use subs::{Bindings, Substitution};
