use alon_schema::{PRESENCE_FLAG, TEXT_LENGTH_PREFIX};

use crate::{
    decls::{deserialize_signature, serialize_signature, PRESENCE_MEMBER, VALUE_MEMBER},
    error::{Fault, OK_STATUS},
    layout::Access,
    plan::{Plan, Step},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Deserialize,
    Serialize,
}

/// Emits `<symbol>_deserialize` for a plan built against the `out` base.
pub fn emit_deserialize(symbol: &str, plan: &Plan) -> String {
    emit_function(deserialize_signature(symbol), plan, Direction::Deserialize)
}

/// Emits `<symbol>_serialize` for a plan built against the `in` base.
pub fn emit_serialize(symbol: &str, plan: &Plan) -> String {
    emit_function(serialize_signature(symbol), plan, Direction::Serialize)
}

fn emit_function(signature: String, plan: &Plan, direction: Direction) -> String {
    let mut emitter = FieldEmitter::new(direction);
    emitter.open(format!("{} {{", signature));
    if plan.prefix() > 0 {
        emitter.line(format!("if (length < {}) return {};", plan.prefix(), Fault::BufferTooShort.c_name()));
    }
    for step in plan.steps() {
        emitter.step(step);
    }
    emitter.line(format!("return {};", OK_STATUS.0));
    emitter.close("}");
    emitter.finish()
}

struct FieldEmitter {
    direction: Direction,
    lines:     Vec<String>,
    depth:     usize,
}

impl FieldEmitter {
    fn new(direction: Direction) -> FieldEmitter {
        FieldEmitter { direction, lines: vec![], depth: 0 }
    }

    fn finish(self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }

    fn line(&mut self, text: impl AsRef<str>) {
        self.lines.push(format!("{}{}", "  ".repeat(self.depth), text.as_ref()));
    }

    fn open(&mut self, text: impl AsRef<str>) {
        self.line(text);
        self.depth += 1;
    }

    fn close(&mut self, text: impl AsRef<str>) {
        self.depth = self.depth.saturating_sub(1);
        self.line(text);
    }

    fn guard(&mut self, width: impl std::fmt::Display) {
        self.line(format!("if (length - offset < {}) return {};", width, Fault::BufferTooShort.c_name()));
    }

    /// Copies `width` bytes between `place` and `buffer + at`, in the
    /// emitter's direction.
    fn copy(&mut self, place: &str, at: impl std::fmt::Display, width: impl std::fmt::Display) {
        match self.direction {
            Direction::Deserialize => self.line(format!("alon_memcpy(&{}, buffer + {}, {});", place, at, width)),
            Direction::Serialize => self.line(format!("alon_memcpy(buffer + {}, &{}, {});", at, place, width)),
        }
    }

    fn step(&mut self, step: &Step) {
        match step {
            Step::SeedCursor { offset } => self.line(format!("uint64_t offset = {};", offset)),
            Step::Scalar { target, kind, access } => self.fixed(&target.place(), kind.width(), *access),
            Step::Block { target, len, access, .. } => self.fixed(&target.place(), *len, *access),
            Step::Text { target } => {
                self.open("{");
                self.text(&target.place());
                self.close("}");
            }
            Step::TextArray { target, count } => {
                self.open(format!("for (uint64_t i = 0; i < {}; i++) {{", count));
                self.text(&format!("{}[i]", target.place()));
                self.close("}");
            }
            Step::OptionalText { target } => {
                let place = target.place();
                self.presence(format!("{} != NULL", place), format!("{} = NULL;", place));
                self.text(&place);
                self.close("}");
                self.close("}");
            }
            Step::OptionalScalar { target, kind } => {
                let flag = target.member(PRESENCE_MEMBER);
                self.presence(format!("{} != 0", flag), format!("{} = 0;", flag));
                self.fixed(&target.member(VALUE_MEMBER), kind.width(), Access::Cursor);
                if self.direction == Direction::Deserialize {
                    self.line(format!("{} = 1;", flag));
                }
                self.close("}");
                self.close("}");
            }
        }
    }

    fn fixed(&mut self, place: &str, width: usize, access: Access) {
        match access {
            Access::Static(at) => self.copy(place, at, width),
            Access::Cursor => {
                self.guard(width);
                self.copy(place, "offset", width);
                self.line(format!("offset += {};", width));
            }
        }
    }

    /// Opens a block holding the presence byte, transfers it, and opens
    /// the present branch. When deserializing, the absent branch is emitted
    /// first as an early `else`, so the caller only fills the present
    /// branch and closes two scopes.
    fn presence(&mut self, present: String, absent: String) {
        self.open("{");
        match self.direction {
            Direction::Deserialize => self.line("uint8_t flag;"),
            Direction::Serialize => self.line(format!("uint8_t flag = {};", present)),
        }
        self.fixed("flag", PRESENCE_FLAG, Access::Cursor);
        match self.direction {
            Direction::Deserialize => {
                self.open("if (!flag) {");
                self.line(absent);
                self.close("} else {");
                self.depth += 1;
            }
            Direction::Serialize => self.open("if (flag) {"),
        }
    }

    /// Length-prefixed string transfer at the cursor. Expects to be inside
    /// its own C scope, since it declares `len` (and `size` when writing).
    fn text(&mut self, place: &str) {
        let too_short = Fault::BufferTooShort.c_name();
        match self.direction {
            Direction::Deserialize => {
                self.line("uint32_t len;");
                self.fixed("len", TEXT_LENGTH_PREFIX, Access::Cursor);
                self.line(format!("if (length - offset < len) return {};", too_short));
                self.line(format!("{} = alon_alloc((uint64_t)len + 1);", place));
                self.line(format!("if ({} == NULL) return {};", place, Fault::AllocationFailure.c_name()));
                self.line(format!("alon_memcpy({}, buffer + offset, len);", place));
                self.line(format!("{}[len] = '\\0';", place));
            }
            Direction::Serialize => {
                self.line(format!("uint64_t size = (uint64_t)alon_strlen({});", place));
                self.line(format!("if (size > {:#X}u) return {};", u32::MAX, too_short));
                self.line("uint32_t len = (uint32_t)size;");
                self.fixed("len", TEXT_LENGTH_PREFIX, Access::Cursor);
                self.line(format!("if (length - offset < len) return {};", too_short));
                self.line(format!("alon_memcpy(buffer + offset, {}, len);", place));
            }
        }
        self.line("offset += len;");
    }
}
