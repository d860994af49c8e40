//! Field paths into a model type
//!
//! A path such as `lists[0].field_refs[0].id` names one field reachable from a
//! root type. `[0]` stands for the representative element of an ordered
//! sequence: a mapping declared on it applies to every element.

use std::fmt;
use std::str::FromStr;

use logos::Logos;

use crate::model::{FieldType, TypeKey};

use super::error::PathError;
use super::registry::TypeRegistry;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t]+")]
enum PathToken {
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<usize>().ok())]
    Index(usize),

    #[token(".")]
    Dot,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
}

/// One step of a [`FieldPath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Field(String),
    /// The representative element of a sequence
    Element,
}

/// Address of a field inside an object graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

/// What a [`FieldPath`] points at, resolved against a registry
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPath {
    /// Type that declares the last named field
    pub declaring_type: TypeKey,
    pub field: String,
    pub field_type: FieldType,
    /// Element type when the path ends on a sequence or its element
    pub element_type: Option<FieldType>,
}

impl FieldPath {
    /// The empty path addressing the root object itself
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(input: &str) -> Result<Self, PathError> {
        let mut segments = Vec::new();
        let mut lexer = PathToken::lexer(input).spanned();
        let mut expect_field = true;

        while let Some((token, span)) = lexer.next() {
            let token = token.map_err(|_| {
                PathError::syntax(input, span.clone(), "unexpected character")
            })?;
            match token {
                PathToken::Ident(name) if expect_field => {
                    segments.push(Segment::Field(name));
                    expect_field = false;
                }
                PathToken::Dot if !expect_field => expect_field = true,
                PathToken::BracketOpen if !expect_field => {
                    let index = match lexer.next() {
                        Some((Ok(PathToken::Index(i)), _)) => i,
                        Some((_, span)) => {
                            return Err(PathError::syntax(input, span, "expected an index"))
                        }
                        None => {
                            return Err(PathError::syntax(
                                input,
                                input.len()..input.len(),
                                "unterminated index",
                            ))
                        }
                    };
                    match lexer.next() {
                        Some((Ok(PathToken::BracketClose), _)) => {}
                        Some((_, span)) => {
                            return Err(PathError::syntax(input, span, "expected ']'"))
                        }
                        None => {
                            return Err(PathError::syntax(
                                input,
                                input.len()..input.len(),
                                "unterminated index",
                            ))
                        }
                    }
                    if index != 0 {
                        return Err(PathError::UnsupportedIndex {
                            path: input.to_string(),
                            index,
                        });
                    }
                    segments.push(Segment::Element);
                }
                _ => {
                    let reason = if expect_field {
                        "expected a field name"
                    } else {
                        "expected '.' or '['"
                    };
                    return Err(PathError::syntax(input, span, reason));
                }
            }
        }

        if segments.is_empty() || expect_field {
            return Err(PathError::syntax(
                input,
                input.len()..input.len(),
                "path must end with a field name or index",
            ));
        }
        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// This path extended by a named field
    pub fn child(&self, field: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Field(field.to_string()));
        Self { segments }
    }

    /// This path extended by the representative element `[0]`
    pub fn element(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Element);
        Self { segments }
    }

    /// Resolve the path on `root`, failing if any step does not exist
    pub fn resolve(&self, registry: &TypeRegistry, root: &TypeKey) -> Result<ResolvedPath, PathError> {
        let path = self.to_string();
        let mut current: Option<FieldType> = None;
        let mut resolved: Option<ResolvedPath> = None;
        let mut last_segment = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Field(name) => {
                    let owner = match &current {
                        None => root.clone(),
                        Some(FieldType::Object(entity)) => TypeKey::new(root.namespace, entity.clone()),
                        Some(_) => {
                            return Err(PathError::NotAnObject {
                                path,
                                segment: last_segment,
                            })
                        }
                    };
                    let desc = registry.describe(&owner).map_err(|_| PathError::UnknownType {
                        path: path.clone(),
                        key: owner.clone(),
                    })?;
                    let field = desc.field_named(name).ok_or_else(|| PathError::UnknownField {
                        path: path.clone(),
                        entity: owner.entity.clone(),
                        field: name.clone(),
                    })?;
                    current = Some(field.ty.clone());
                    resolved = Some(ResolvedPath {
                        declaring_type: owner,
                        field: name.clone(),
                        field_type: field.ty.clone(),
                        element_type: field.ty.element().cloned(),
                    });
                    last_segment = name.clone();
                }
                Segment::Element => match current.take() {
                    Some(FieldType::List(inner)) => {
                        current = Some(*inner);
                        last_segment.push_str("[0]");
                    }
                    _ => {
                        return Err(PathError::NotASequence {
                            path,
                            segment: last_segment,
                        })
                    }
                },
            }
        }

        resolved.ok_or_else(|| PathError::syntax(path, 0..0, "empty path"))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => write!(f, "{}", name)?,
                Segment::Field(name) => write!(f, ".{}", name)?,
                Segment::Element => write!(f, "[0]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{register_model_types, Template, ModelObject};

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        register_model_types(&mut registry).expect("models register");
        registry
    }

    #[test]
    fn test_parse_and_display() {
        let path = FieldPath::parse("lists[0].field_refs[0].id").unwrap();
        assert_eq!(path.segments().len(), 5);
        assert_eq!(path.to_string(), "lists[0].field_refs[0].id");
    }

    #[test]
    fn test_child_and_element_build_canonical_paths() {
        let path = FieldPath::root().child("lists").element().child("views");
        assert_eq!(path, FieldPath::parse("lists[0].views").unwrap());
    }

    #[test]
    fn test_parse_rejects_non_representative_index() {
        let err = FieldPath::parse("lists[2].title").unwrap_err();
        assert!(matches!(err, PathError::UnsupportedIndex { index: 2, .. }));
    }

    #[test]
    fn test_parse_rejects_bad_syntax() {
        assert!(matches!(FieldPath::parse("lists.").unwrap_err(), PathError::Syntax { .. }));
        assert!(matches!(FieldPath::parse("[0]").unwrap_err(), PathError::Syntax { .. }));
        assert!(matches!(FieldPath::parse("lists[").unwrap_err(), PathError::Syntax { .. }));
        assert!(matches!(FieldPath::parse("a..b").unwrap_err(), PathError::Syntax { .. }));
    }

    #[test]
    fn test_resolve_nested_element_field() {
        let registry = registry();
        let root = Template::descriptor().key().clone();
        let resolved = FieldPath::parse("lists[0].data_rows[0].values")
            .unwrap()
            .resolve(&registry, &root)
            .unwrap();
        assert_eq!(resolved.declaring_type, TypeKey::model("DataRow"));
        assert_eq!(resolved.field, "values");
        assert_eq!(resolved.field_type, FieldType::Map);
        assert_eq!(resolved.element_type, None);
    }

    #[test]
    fn test_resolve_sequence_reports_element_type() {
        let registry = registry();
        let resolved = FieldPath::parse("lists[0].folders")
            .unwrap()
            .resolve(&registry, &TypeKey::model("Template"))
            .unwrap();
        assert_eq!(resolved.element_type, Some(FieldType::Object("Folder".to_string())));
    }

    #[test]
    fn test_resolve_unknown_field_fails_early() {
        let registry = registry();
        let err = FieldPath::parse("lists[0].colour")
            .unwrap()
            .resolve(&registry, &TypeKey::model("Template"))
            .unwrap_err();
        assert_eq!(
            err,
            PathError::UnknownField {
                path: "lists[0].colour".to_string(),
                entity: "ListInstance".to_string(),
                field: "colour".to_string(),
            }
        );
    }

    #[test]
    fn test_resolve_index_on_scalar_fails() {
        let registry = registry();
        let err = FieldPath::parse("id[0]")
            .unwrap()
            .resolve(&registry, &TypeKey::model("Template"))
            .unwrap_err();
        assert!(matches!(err, PathError::NotASequence { .. }));
    }

    #[test]
    fn test_resolve_through_scalar_fails() {
        let registry = registry();
        let err = FieldPath::parse("description.length")
            .unwrap()
            .resolve(&registry, &TypeKey::model("Template"))
            .unwrap_err();
        assert!(matches!(err, PathError::NotAnObject { .. }));
    }
}
