use serde::Serialize;

/// Path from the function's base pointer down to the struct currently being
/// laid out. The first segment is always the base parameter (`out`, `in` or
/// `x`); the rest are member names of enclosing nested structs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scope {
    segments: Vec<String>,
}

impl Scope {
    pub fn new(base: impl Into<String>) -> Scope {
        Scope { segments: vec![base.into()] }
    }

    pub fn base(&self) -> &str {
        &self.segments[0]
    }

    /// Member names below the base, outermost first.
    pub fn members(&self) -> &[String] {
        &self.segments[1..]
    }

    pub fn depth(&self) -> usize {
        self.segments.len() - 1
    }

    pub fn enter(&self, name: &str) -> Scope {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Scope { segments }
    }

    /// Drops the innermost member. The base is never popped.
    pub fn parent(&self) -> Scope {
        let mut segments = self.segments.clone();
        if segments.len() > 1 {
            segments.pop();
        }
        Scope { segments }
    }

    /// C lvalue for `field` in this scope. The base is a pointer, so the
    /// first hop is `->` and the rest are `.`.
    pub fn resolve(&self, field: &str) -> String {
        match self.members() {
            [] => format!("{}->{}", self.base(), field),
            members => format!("{}->{}.{}", self.base(), members.join("."), field),
        }
    }
}
