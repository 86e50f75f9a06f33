use serde::Serialize;
use tracing::debug;

use crate::scope::Scope;

/// Largest offset or width the emitters print as an unsuffixed C integer
/// literal (`LLONG_MAX`).
pub const MAX_LITERAL: u64 = i64::MAX as u64;

/// Where a fixed-width field's bytes live in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    /// A literal offset, known while generating code.
    Static(usize),
    /// The runtime `offset` cursor.
    Cursor,
}

/// Layout state threaded through the field walk. Once `dynamic` flips it
/// never flips back, and `static_offset` stops moving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutState {
    static_offset: usize,
    dynamic:       bool,
    scope:         Scope,
}

impl LayoutState {
    pub fn new(base: &str) -> LayoutState {
        LayoutState {
            static_offset: 0,
            dynamic:       false,
            scope:         Scope::new(base),
        }
    }

    pub fn static_offset(&self) -> usize {
        self.static_offset
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Places a fixed-width field. Returns `None` if the width or the static
    /// offset would exceed [`MAX_LITERAL`].
    pub fn advance(self, width: usize) -> Option<(Access, LayoutState)> {
        if width as u64 > MAX_LITERAL {
            return None;
        }
        if self.dynamic {
            return Some((Access::Cursor, self));
        }
        let next = self.static_offset.checked_add(width).filter(|next| *next as u64 <= MAX_LITERAL)?;
        let access = Access::Static(self.static_offset);
        Some((access, LayoutState { static_offset: next, ..self }))
    }

    /// Switches to the runtime cursor. The first call yields the seed value
    /// for `offset`; later calls yield `None`.
    pub fn go_dynamic(self) -> (Option<usize>, LayoutState) {
        if self.dynamic {
            return (None, self);
        }
        debug!(seed = self.static_offset, scope = ?self.scope.members(), "switching to runtime cursor");
        (Some(self.static_offset), LayoutState { dynamic: true, ..self })
    }

    pub fn descend(self, name: &str) -> LayoutState {
        let scope = self.scope.enter(name);
        LayoutState { scope, ..self }
    }

    pub fn ascend(self) -> LayoutState {
        let scope = self.scope.parent();
        LayoutState { scope, ..self }
    }
}
