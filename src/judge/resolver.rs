//! Entry-point resolution.
//!
//! Only crate-root functions are inspected, and only the shapes below are ever
//! invoked:
//!
//! | first parameter      | shape                    |
//! |----------------------|--------------------------|
//! | `&mut [i32]`         | [`ParamShape::Slice`]      |
//! | `&mut Box<[i32]>`    | [`ParamShape::BoxedSlice`] |
//! | `&mut Vec<i32>`      | [`ParamShape::Vec`]        |
//!
//! optionally followed by two integer bounds (`i32`, `i64`, `isize` or
//! `usize`). Candidates are enumerated in declaration order.

use crate::config::types::{AlgorithmHint, Result, SortboxError};
use crate::judge::loader::LoadedArtifact;
use serde::{Deserialize, Serialize};
use std::fmt;
use syn::{FnArg, GenericArgument, GenericParam, Item, ItemFn, PathArguments, ReturnType, Type};

/// The operation name that outranks every other.
pub const CANONICAL_NAME: &str = "sort";

pub const ACCEPTED_SHAPES: &str = "pub fn <name>(arr: &mut [i32] | &mut Box<[i32]> | &mut Vec<i32>) \
or pub fn <name>(arr: <same>, low: <int>, high: <int>) with <int> one of i32, i64, isize, usize, \
returning nothing";

/// Accepted first-parameter shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamShape {
    /// `&mut [i32]`
    Slice,
    /// `&mut Box<[i32]>`
    BoxedSlice,
    /// `&mut Vec<i32>`; the callee may replace the vector wholesale
    Vec,
}

impl fmt::Display for ParamShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamShape::Slice => write!(f, "&mut [i32]"),
            ParamShape::BoxedSlice => write!(f, "&mut Box<[i32]>"),
            ParamShape::Vec => write!(f, "&mut Vec<i32>"),
        }
    }
}

/// Integer types accepted for the `low`/`high` bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundType {
    I32,
    I64,
    Isize,
    Usize,
}

impl BoundType {
    fn from_ident(ident: &str) -> Option<Self> {
        match ident {
            "i32" => Some(BoundType::I32),
            "i64" => Some(BoundType::I64),
            "isize" => Some(BoundType::Isize),
            "usize" => Some(BoundType::Usize),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BoundType::I32 => "i32",
            BoundType::I64 => "i64",
            BoundType::Isize => "isize",
            BoundType::Usize => "usize",
        }
    }

    pub fn is_unsigned(self) -> bool {
        self == BoundType::Usize
    }
}

/// A crate-root function matching one of the accepted shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateEntryPoint {
    pub name: String,
    pub shape: ParamShape,
    /// `(low, high)` types for the three-argument form
    pub bounds: Option<(BoundType, BoundType)>,
}

impl CandidateEntryPoint {
    pub fn arity(&self) -> usize {
        if self.bounds.is_some() {
            3
        } else {
            1
        }
    }

    pub fn is_ranged(&self) -> bool {
        self.bounds.is_some()
    }
}

impl fmt::Display for CandidateEntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bounds {
            None => write!(f, "{}({})", self.name, self.shape),
            Some((low, high)) => write!(
                f,
                "{}({}, {}, {})",
                self.name,
                self.shape,
                low.as_str(),
                high.as_str()
            ),
        }
    }
}

pub struct EntryPointResolver;

impl EntryPointResolver {
    /// Pick the operation to run on `unit`.
    pub fn resolve(
        unit: &LoadedArtifact<'_>,
        hint: Option<AlgorithmHint>,
    ) -> Result<CandidateEntryPoint> {
        let candidates = enumerate(unit.items());
        log::debug!(
            "{}: {} candidate entry point(s): [{}]",
            unit.crate_name(),
            candidates.len(),
            candidates
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        );

        select(&candidates, hint).cloned().ok_or_else(|| {
            SortboxError::Resolution(format!(
                "no invocable entry point found; expected {}",
                ACCEPTED_SHAPES
            ))
        })
    }
}

/// Candidates among `items`, in declaration order.
pub fn enumerate(items: &[Item]) -> Vec<CandidateEntryPoint> {
    items
        .iter()
        .filter_map(|item| match item {
            Item::Fn(function) => candidate_from_fn(function),
            _ => None,
        })
        .collect()
}

/// Deterministic choice: canonical name first, then the arity the hint
/// prefers, then declaration order.
pub fn select(
    candidates: &[CandidateEntryPoint],
    hint: Option<AlgorithmHint>,
) -> Option<&CandidateEntryPoint> {
    let prefer_ranged = hint.map(AlgorithmHint::is_partitioning).unwrap_or(false);
    candidates
        .iter()
        .min_by_key(|c| (c.name != CANONICAL_NAME, c.is_ranged() != prefer_ranged))
}

pub fn candidate_from_fn(function: &ItemFn) -> Option<CandidateEntryPoint> {
    if !is_invocable(function) {
        return None;
    }

    let params: Vec<&Type> = function
        .sig
        .inputs
        .iter()
        .map(|arg| match arg {
            FnArg::Typed(pat) => Some(pat.ty.as_ref()),
            FnArg::Receiver(_) => None,
        })
        .collect::<Option<Vec<_>>>()?;

    let (first, rest) = params.split_first()?;
    let shape = param_shape(first)?;
    let bounds = match rest {
        [] => None,
        [low, high] => Some((bound_type(low)?, bound_type(high)?)),
        _ => return None,
    };

    Some(CandidateEntryPoint {
        name: function.sig.ident.to_string(),
        shape,
        bounds,
    })
}

/// Public, safe, synchronous, non-generic, returns nothing, not cfg-gated.
fn is_invocable(function: &ItemFn) -> bool {
    let sig = &function.sig;
    let public = matches!(function.vis, syn::Visibility::Public(_));
    let cfg_gated = function.attrs.iter().any(|attr| attr.path().is_ident("cfg"));
    let type_generic = sig
        .generics
        .params
        .iter()
        .any(|param| !matches!(param, GenericParam::Lifetime(_)));
    let returns_nothing = match &sig.output {
        ReturnType::Default => true,
        ReturnType::Type(_, ty) => matches!(strip(ty), Type::Tuple(t) if t.elems.is_empty()),
    };

    public
        && !cfg_gated
        && !type_generic
        && returns_nothing
        && sig.asyncness.is_none()
        && sig.unsafety.is_none()
        && sig.variadic.is_none()
}

fn param_shape(ty: &Type) -> Option<ParamShape> {
    let Type::Reference(reference) = strip(ty) else {
        return None;
    };
    reference.mutability?;

    match strip(&reference.elem) {
        Type::Slice(slice) if is_i32(&slice.elem) => Some(ParamShape::Slice),
        Type::Path(_) => {
            let (container, inner) = single_type_argument(&reference.elem)?;
            match (container.as_str(), strip(inner)) {
                ("Box", Type::Slice(slice)) if is_i32(&slice.elem) => Some(ParamShape::BoxedSlice),
                ("Vec", elem) if is_i32(elem) => Some(ParamShape::Vec),
                _ => None,
            }
        }
        _ => None,
    }
}

fn bound_type(ty: &Type) -> Option<BoundType> {
    plain_ident(ty).and_then(|ident| BoundType::from_ident(&ident))
}

fn is_i32(ty: &Type) -> bool {
    plain_ident(ty).as_deref() == Some("i32")
}

/// Last path segment of a type without generic arguments, e.g. `i32`.
fn plain_ident(ty: &Type) -> Option<String> {
    let Type::Path(path) = strip(ty) else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    matches!(segment.arguments, PathArguments::None).then(|| segment.ident.to_string())
}

/// `Container<T>` -> (`"Container"`, `T`)
fn single_type_argument(ty: &Type) -> Option<(String, &Type)> {
    let Type::Path(path) = strip(ty) else {
        return None;
    };
    if path.qself.is_some() {
        return None;
    }
    let segment = path.path.segments.last()?;
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    match args.args.first()? {
        GenericArgument::Type(inner) => Some((segment.ident.to_string(), inner)),
        _ => None,
    }
}

fn strip(ty: &Type) -> &Type {
    match ty {
        Type::Paren(inner) => strip(&inner.elem),
        Type::Group(inner) => strip(&inner.elem),
        other => other,
    }
}
