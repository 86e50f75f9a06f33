use alon_schema::{Field, FieldType};

use crate::{
    decls::{release_signature, RELEASE_BASE},
    scope::Scope,
};

/// Emits `<symbol>_release`, which frees every string the deserializer
/// allocated. Absent optional strings are NULL, and freeing NULL is a no-op.
pub fn emit_release(symbol: &str, fields: &[Field]) -> String {
    let mut frees = vec![];
    collect_frees(fields, &Scope::new(RELEASE_BASE), &mut frees);

    let body = if frees.is_empty() {
        format!("  (void){};", RELEASE_BASE)
    } else {
        frees.iter().map(|place| format!("  alon_free({});", place)).collect::<Vec<_>>().join("\n")
    };

    format!("{} {{\n{}\n}}\n", release_signature(symbol), body)
}

fn collect_frees(fields: &[Field], scope: &Scope, frees: &mut Vec<String>) {
    for field in fields {
        let place = scope.resolve(&field.name);
        match &field.ty {
            FieldType::Text => frees.push(place),
            FieldType::Optional(inner) if **inner == FieldType::Text => frees.push(place),
            FieldType::FixedArray(element, count) if **element == FieldType::Text => {
                frees.extend((0..*count).map(|i| format!("{}[{}]", place, i)));
            }
            FieldType::Struct(inner) => collect_frees(inner, &scope.enter(&field.name), frees),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alon_schema::ScalarKind::*;
    use indoc::indoc;

    #[test]
    fn frees_every_string() {
        let fields = vec![
            Field::new("a", FieldType::Scalar(U8)),
            Field::new("s", FieldType::Text),
            Field::new("names", FieldType::array(FieldType::Text, 2)),
            Field::new("m", FieldType::optional(FieldType::Text)),
            Field::new("n", FieldType::optional(FieldType::Scalar(U16))),
        ];
        assert_eq!(
            emit_release("alon_t", &fields),
            indoc! {"
                void alon_t_release(struct alon_t *x) {
                  alon_free(x->s);
                  alon_free(x->names[0]);
                  alon_free(x->names[1]);
                  alon_free(x->m);
                }
            "}
        );
    }

    #[test]
    fn recurses_into_nested_structs() {
        let inner = FieldType::Struct(vec![Field::new("label", FieldType::Text)]);
        let release = emit_release("alon_t", &[Field::new("inner", inner)]);
        assert!(release.contains("  alon_free(x->inner.label);\n"));
    }

    #[test]
    fn fixed_records_release_nothing() {
        let release = emit_release("alon_t", &[Field::new("x", FieldType::Scalar(U32))]);
        assert_eq!(release, "void alon_t_release(struct alon_t *x) {\n  (void)x;\n}\n");
    }
}
