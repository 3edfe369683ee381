//! Signature matcher
//!
//! Decides whether a parameter list accepts a sequence of argument values and,
//! among several compatible candidates at one level, which one is the most
//! specific. Distances are measured per argument:
//!
//! - `0` for an exact type, a primitive vs its boxed form, or a null reference
//! - `n` for a class `n` inheritance steps above the argument's class
//! - the depth of the argument's hierarchy for a parameter of type `Object`
//!
//! One candidate beats another when it is no farther on every argument and
//! strictly closer on at least one. Spread candidates left tied by their
//! distances are ordered by their declared parameter types.

use whitebox_runtime::{class_distance, TypeEnv, TypeRef, Value};

use crate::hierarchy::chain_of;
use crate::resolution::Resolution;

/// How a candidate consumes the supplied arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallForm {
    /// One argument per parameter
    Direct,
    /// Fixed parameters first, the remaining arguments packed into the
    /// trailing variable-arity array
    Spread,
}

/// A successful match of arguments against a parameter list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentMatch {
    /// How the arguments are passed
    pub form: CallForm,
    /// Per-argument distance
    pub distances: Vec<u32>,
}

/// Distance from type `from` to type `to`, or `None` when not assignable
pub fn type_distance(env: &dyn TypeEnv, from: &TypeRef, to: &TypeRef) -> Option<u32> {
    if from == to {
        return Some(0);
    }
    match (from, to) {
        (TypeRef::Primitive(a), TypeRef::Boxed(b)) | (TypeRef::Boxed(a), TypeRef::Primitive(b)) => {
            (a == b).then_some(0)
        }
        (TypeRef::Primitive(_), _) | (_, TypeRef::Primitive(_)) => None,
        (TypeRef::Class(sub), TypeRef::Class(sup)) => class_distance(env, *sub, *sup),
        (TypeRef::Class(sub), TypeRef::Object) => Some(chain_of(env, *sub).len().max(1) as u32),
        (_, TypeRef::Object) => Some(1),
        (TypeRef::Array(a), TypeRef::Array(b)) => {
            if a.is_primitive() || b.is_primitive() {
                (a == b).then_some(0)
            } else {
                type_distance(env, a, b)
            }
        }
        _ => None,
    }
}

/// Distance from an argument value to a parameter type
pub fn value_distance(env: &dyn TypeEnv, param: &TypeRef, arg: &Value) -> Option<u32> {
    match arg.runtime_type() {
        None => (!param.is_primitive()).then_some(0),
        Some(actual) => type_distance(env, &actual, param),
    }
}

/// Match arguments one-to-one against the parameters
pub fn match_direct(env: &dyn TypeEnv, params: &[TypeRef], args: &[Value]) -> Option<Vec<u32>> {
    if params.len() != args.len() {
        return None;
    }
    params
        .iter()
        .zip(args)
        .map(|(param, arg)| value_distance(env, param, arg))
        .collect()
}

/// Match arguments against a variable-arity parameter list, spreading the
/// trailing arguments over the element type of the last parameter
pub fn match_spread(env: &dyn TypeEnv, params: &[TypeRef], args: &[Value]) -> Option<Vec<u32>> {
    let (last, fixed) = params.split_last()?;
    let element = last.element_type()?;
    if args.len() < fixed.len() {
        return None;
    }
    let (head, tail) = args.split_at(fixed.len());

    let mut distances = match_direct(env, fixed, head)?;
    for arg in tail {
        distances.push(value_distance(env, element, arg)?);
    }
    Some(distances)
}

/// Match arguments against a member, trying the fixed-arity form first
pub fn match_arguments(
    env: &dyn TypeEnv,
    params: &[TypeRef],
    is_varargs: bool,
    args: &[Value],
) -> Option<ArgumentMatch> {
    if let Some(distances) = match_direct(env, params, args) {
        return Some(ArgumentMatch {
            form: CallForm::Direct,
            distances,
        });
    }
    if is_varargs {
        if let Some(distances) = match_spread(env, params, args) {
            return Some(ArgumentMatch {
                form: CallForm::Spread,
                distances,
            });
        }
    }
    None
}

/// Check whether a member accepts the arguments in any form
pub fn is_compatible(env: &dyn TypeEnv, params: &[TypeRef], is_varargs: bool, args: &[Value]) -> bool {
    match_arguments(env, params, is_varargs, args).is_some()
}

/// Whether distance vector `a` dominates `b`
pub fn dominates(a: &[u32], b: &[u32]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x <= y) && a.iter().zip(b).any(|(x, y)| x < y)
}

/// Pick the most specific candidate among the compatible ones of one level.
///
/// With `tie_break` off, more than one candidate is always ambiguous. With it
/// on, the candidate dominating every other wins; otherwise the candidates
/// that no one dominates are reported as ambiguous.
pub fn select_most_specific<T>(candidates: Vec<(T, Vec<u32>)>, tie_break: bool) -> Resolution<T> {
    if candidates.len() <= 1 || !tie_break {
        return Resolution::from_level(candidates.into_iter().map(|(c, _)| c).collect());
    }

    let winner = (0..candidates.len()).find(|&i| {
        candidates
            .iter()
            .enumerate()
            .all(|(j, (_, d))| i == j || dominates(&candidates[i].1, d))
    });
    if let Some(index) = winner {
        let mut candidates = candidates;
        return Resolution::Unique(candidates.swap_remove(index).0);
    }

    let undominated: Vec<bool> = candidates
        .iter()
        .enumerate()
        .map(|(i, (_, d))| {
            !candidates
                .iter()
                .enumerate()
                .any(|(j, (_, other))| i != j && dominates(other, d))
        })
        .collect();
    Resolution::Ambiguous(
        candidates
            .into_iter()
            .zip(undominated)
            .filter_map(|((c, _), keep)| keep.then_some(c))
            .collect(),
    )
}

/// Whether variable-arity parameter list `a` is at least as specific as `b`:
/// each fixed parameter and the trailing element type of `a` is assignable to
/// its counterpart in `b`
pub fn spread_subsumes(env: &dyn TypeEnv, a: &[TypeRef], b: &[TypeRef]) -> bool {
    let (Some((last_a, fixed_a)), Some((last_b, fixed_b))) = (a.split_last(), b.split_last()) else {
        return false;
    };
    let (Some(elem_a), Some(elem_b)) = (last_a.element_type(), last_b.element_type()) else {
        return false;
    };
    fixed_a.len() == fixed_b.len()
        && fixed_a
            .iter()
            .zip(fixed_b)
            .chain(std::iter::once((elem_a, elem_b)))
            .all(|(x, y)| type_distance(env, x, y).is_some())
}

/// Order spread candidates that their argument distances left tied: the one
/// strictly subsuming every other wins, otherwise all stay ambiguous
pub fn most_specific_spread<T>(env: &dyn TypeEnv, tied: Vec<(T, &[TypeRef])>) -> Resolution<T> {
    let winner = (0..tied.len()).find(|&i| {
        tied.iter().enumerate().all(|(j, (_, other))| {
            i == j
                || (spread_subsumes(env, tied[i].1, other) && !spread_subsumes(env, other, tied[i].1))
        })
    });
    match winner {
        Some(index) => {
            let mut tied = tied;
            Resolution::Unique(tied.swap_remove(index).0)
        }
        None => Resolution::from_level(tied.into_iter().map(|(c, _)| c).collect()),
    }
}
