use std::collections::HashSet;

use alon_schema::{Field, FieldType, Schema, SchemaKind};

use crate::{
    error::CompileError,
    utils::{is_c_identifier, quote},
};

/// Returns `Ok(())` if `schema` can be compiled under `name`, or the first
/// reason it can't.
pub fn verify_schema(name: &str, schema: &Schema) -> Result<(), CompileError> {
    check_identifier(name)?;

    if schema.kind == SchemaKind::Enum {
        return Err(CompileError::TopLevelEnum(quote(name)));
    }

    verify_fields(&schema.fields, None, name)
}

pub fn check_identifier(name: &str) -> Result<(), CompileError> {
    if is_c_identifier(name) {
        Ok(())
    } else {
        Err(CompileError::InvalidIdentifier(quote(name)))
    }
}

fn verify_fields(fields: &[Field], parent: Option<&str>, owner: &str) -> Result<(), CompileError> {
    if fields.is_empty() {
        return Err(CompileError::EmptyStruct(quote(owner)));
    }

    let mut seen = HashSet::new();
    for field in fields {
        check_identifier(&field.name)?;

        let path = match parent {
            Some(parent) => format!("{}.{}", parent, field.name),
            None => field.name.clone(),
        };
        if !seen.insert(field.name.as_str()) {
            return Err(CompileError::DuplicateField(quote(&path)));
        }

        verify_type(&field.ty, &path)?;
    }

    Ok(())
}

fn verify_type(ty: &FieldType, path: &str) -> Result<(), CompileError> {
    match ty {
        FieldType::Scalar(_) | FieldType::Text => Ok(()),

        FieldType::FixedBytes(0) | FieldType::FixedArray(_, 0) => Err(CompileError::ZeroLength(path.to_string())),
        FieldType::FixedBytes(_) => Ok(()),

        FieldType::FixedArray(element, _) => {
            match element.as_ref() {
                FieldType::Text => return Ok(()),
                FieldType::Scalar(_) | FieldType::FixedBytes(_) | FieldType::Struct(_) | FieldType::Enum(_) => {
                    verify_type(element, path)?
                }
                FieldType::FixedArray(..) if !element.forces_dynamic() => verify_type(element, path)?,
                _ => return Err(CompileError::UnsupportedArrayElement(path.to_string())),
            }
            match ty.fixed_width() {
                Some(_) => Ok(()),
                None => Err(CompileError::LayoutOverflow(path.to_string())),
            }
        }

        FieldType::Optional(inner) => match inner.as_ref() {
            FieldType::Text | FieldType::Scalar(_) => Ok(()),
            _ => Err(CompileError::UnsupportedOptional(path.to_string())),
        },

        FieldType::Struct(_) => Err(CompileError::NestedComposite { field: path.to_string(), kind: "struct" }),
        FieldType::Enum(_) => Err(CompileError::NestedComposite { field: path.to_string(), kind: "enum" }),
    }
}
