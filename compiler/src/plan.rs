use alon_schema::{Field, FieldType, ScalarKind};
use serde::Serialize;

use crate::{
    error::CompileError,
    layout::{Access, LayoutState, MAX_LITERAL},
    scope::Scope,
};

/// A field's place in the generated struct.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Target {
    scope: Scope,
    name:  String,
}

impl Target {
    pub fn new(scope: Scope, name: impl Into<String>) -> Target {
        Target { scope, name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// C lvalue naming the field.
    pub fn place(&self) -> String {
        self.scope.resolve(&self.name)
    }

    /// C lvalue naming `member` of the field, e.g. `out->m.is_some`.
    pub fn member(&self, member: &str) -> String {
        self.scope.enter(&self.name).resolve(member)
    }

    /// Member names from the record root down to this field.
    pub fn path(&self) -> Vec<String> {
        let mut path = self.scope.members().to_vec();
        path.push(self.name.clone());
        path
    }

    pub fn dotted(&self) -> String {
        self.path().join(".")
    }
}

/// One unit of generated work, in wire order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// Declares the runtime cursor. Emitted once, right before the first
    /// variable-width field.
    SeedCursor { offset: usize },
    Scalar {
        target: Target,
        kind:   ScalarKind,
        access: Access,
    },
    /// Opaque fixed-width copy: fixed byte runs and arrays of fixed-width
    /// elements.
    Block {
        target: Target,
        ty:     FieldType,
        len:    usize,
        access: Access,
    },
    Text { target: Target },
    TextArray { target: Target, count: usize },
    OptionalText { target: Target },
    OptionalScalar { target: Target, kind: ScalarKind },
}

impl Step {
    pub fn target(&self) -> Option<&Target> {
        match self {
            Step::SeedCursor { .. } => None,
            Step::Scalar { target, .. }
            | Step::Block { target, .. }
            | Step::Text { target }
            | Step::TextArray { target, .. }
            | Step::OptionalText { target }
            | Step::OptionalScalar { target, .. } => Some(target),
        }
    }
}

/// The resolved layout of a record as seen from one base pointer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plan {
    base:   String,
    prefix: usize,
    steps:  Vec<Step>,
}

impl Plan {
    pub fn build(fields: &[Field], base: &str) -> Result<Plan, CompileError> {
        let mut steps = vec![];
        let state = walk(fields, LayoutState::new(base), &mut steps)?;
        Ok(Plan {
            base:   base.to_string(),
            prefix: state.static_offset(),
            steps,
        })
    }

    /// Bytes covered by the single upfront length check: everything before
    /// the first variable-width field.
    pub fn prefix(&self) -> usize {
        self.prefix
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn is_dynamic(&self) -> bool {
        self.steps.iter().any(|s| matches!(s, Step::SeedCursor { .. }))
    }
}

fn walk(fields: &[Field], state: LayoutState, steps: &mut Vec<Step>) -> Result<LayoutState, CompileError> {
    fields.iter().try_fold(state, |state, field| walk_field(field, state, steps))
}

fn walk_field(field: &Field, state: LayoutState, steps: &mut Vec<Step>) -> Result<LayoutState, CompileError> {
    let target = Target::new(state.scope().clone(), &field.name);

    match &field.ty {
        FieldType::Scalar(kind) => {
            let (access, state) = place(state, kind.width(), &target)?;
            steps.push(Step::Scalar { target, kind: *kind, access });
            Ok(state)
        }

        FieldType::FixedBytes(len) => {
            let (access, state) = place(state, *len, &target)?;
            steps.push(Step::Block { target, ty: field.ty.clone(), len: *len, access });
            Ok(state)
        }

        FieldType::FixedArray(element, count) => match element.as_ref() {
            FieldType::Text => {
                if *count as u64 > MAX_LITERAL {
                    return Err(CompileError::LayoutOverflow(target.dotted()));
                }
                let state = cursor(state, steps);
                steps.push(Step::TextArray { target, count: *count });
                Ok(state)
            }
            FieldType::Enum(_) => Err(CompileError::NestedComposite { field: target.dotted(), kind: "enum" }),
            element => {
                let width = element
                    .fixed_width()
                    .ok_or_else(|| CompileError::UnsupportedArrayElement(target.dotted()))?;
                let len = width.checked_mul(*count).ok_or_else(|| CompileError::LayoutOverflow(target.dotted()))?;
                let (access, state) = place(state, len, &target)?;
                steps.push(Step::Block { target, ty: field.ty.clone(), len, access });
                Ok(state)
            }
        },

        FieldType::Text => {
            let state = cursor(state, steps);
            steps.push(Step::Text { target });
            Ok(state)
        }

        FieldType::Optional(inner) => {
            let step = match inner.as_ref() {
                FieldType::Text => Step::OptionalText { target },
                FieldType::Scalar(kind) => Step::OptionalScalar { target, kind: *kind },
                _ => return Err(CompileError::UnsupportedOptional(target.dotted())),
            };
            let state = cursor(state, steps);
            steps.push(step);
            Ok(state)
        }

        FieldType::Struct(fields) => {
            let state = walk(fields, state.descend(&field.name), steps)?;
            Ok(state.ascend())
        }

        FieldType::Enum(_) => Err(CompileError::NestedComposite { field: target.dotted(), kind: "enum" }),
    }
}

fn place(state: LayoutState, width: usize, target: &Target) -> Result<(Access, LayoutState), CompileError> {
    state.advance(width).ok_or_else(|| CompileError::LayoutOverflow(target.dotted()))
}

fn cursor(state: LayoutState, steps: &mut Vec<Step>) -> LayoutState {
    let (seed, state) = state.go_dynamic();
    if let Some(offset) = seed {
        steps.push(Step::SeedCursor { offset });
    }
    state
}
