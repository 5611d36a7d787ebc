use serde::{Deserialize, Serialize};

/// Declared accessibility of a class member.
///
/// `Implicit` is a member written without any accessibility keyword; it is public for every
/// purpose except rendering, where the synthesized stub keeps the declaration keyword-free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    #[default]
    Implicit,
    Protected,
    Internal,
    Private,
}

impl Visibility {
    pub fn is_private(self) -> bool {
        matches!(self, Visibility::Private)
    }

    /// Keyword to emit in front of a synthesized declaration.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Visibility::Public => Some("public"),
            Visibility::Implicit => None,
            Visibility::Protected => Some("protected"),
            Visibility::Internal => Some("internal"),
            Visibility::Private => Some("private"),
        }
    }
}

/// A generic type parameter, e.g. `T extends object = {}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParam {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl TypeParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraint: None,
            default: None,
        }
    }
}

/// A single parameter of a method or setter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,

    #[serde(default)]
    pub optional: bool,

    #[serde(default)]
    pub rest: bool,
}

impl Param {
    pub fn typed(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty.into()),
            optional: false,
            rest: false,
        }
    }
}

/// Declared shape of a member. Signatures are kept as source text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MemberShape {
    Method {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        type_params: Vec<TypeParam>,

        #[serde(default)]
        params: Vec<Param>,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        return_type: Option<String>,
    },
    Property {
        #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
        ty: Option<String>,
    },
    GetAccessor {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        return_type: Option<String>,
    },
    SetAccessor {
        param: Param,
    },
    /// A `get` and a `set` accessor declared under one name.
    AccessorPair {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        return_type: Option<String>,

        param: Param,
    },
    /// Any member kind this version of absfix does not know how to stub
    /// (index signatures, constructors, ...).
    #[serde(other)]
    Unknown,
}

impl MemberShape {
    pub fn label(&self) -> &'static str {
        match self {
            MemberShape::Method { .. } => "method",
            MemberShape::Property { .. } => "property",
            MemberShape::GetAccessor { .. } => "get_accessor",
            MemberShape::SetAccessor { .. } => "set_accessor",
            MemberShape::AccessorPair { .. } => "accessor_pair",
            MemberShape::Unknown => "unknown",
        }
    }
}

/// One member of a class-like type as declared in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    pub name: String,

    pub shape: MemberShape,

    #[serde(default)]
    pub visibility: Visibility,

    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,

    #[serde(default)]
    pub readonly: bool,

    #[serde(default)]
    pub optional: bool,
}

impl MemberDescriptor {
    pub fn new(name: impl Into<String>, shape: MemberShape) -> Self {
        Self {
            name: name.into(),
            shape,
            visibility: Visibility::default(),
            is_abstract: false,
            readonly: false,
            optional: false,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn abstract_member(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Fold the complementary half of an accessor into `self`.
    ///
    /// A getter plus a setter of the same name become one [`MemberShape::AccessorPair`] that
    /// keeps the getter's visibility and is abstract if either half is. Any other combination
    /// leaves `self` untouched and returns `false`.
    pub fn merge_accessor(&mut self, other: &MemberDescriptor) -> bool {
        if self.name != other.name {
            return false;
        }
        let (getter, return_type, param) = match (&self.shape, &other.shape) {
            (MemberShape::GetAccessor { return_type }, MemberShape::SetAccessor { param }) => {
                (true, return_type.clone(), param.clone())
            }
            (MemberShape::SetAccessor { param }, MemberShape::GetAccessor { return_type }) => {
                (false, return_type.clone(), param.clone())
            }
            _ => return false,
        };
        if !getter {
            self.visibility = other.visibility;
        }
        self.shape = MemberShape::AccessorPair { return_type, param };
        self.is_abstract |= other.is_abstract;
        true
    }

    /// True for members a concrete subclass is contractually obliged to supply.
    pub fn is_owed(&self) -> bool {
        self.is_abstract && !self.visibility.is_private()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_member_kind_deserializes_to_unknown() {
        let m: MemberDescriptor = serde_json::from_value(serde_json::json!({
            "name": "index",
            "shape": { "kind": "index_signature", "key_type": "string" },
            "abstract": true
        }))
        .expect("parse");
        assert_eq!(m.shape, MemberShape::Unknown);
        assert!(m.is_abstract);
        assert_eq!(m.visibility, Visibility::Implicit);
    }

    #[test]
    fn private_abstract_member_is_not_owed() {
        let m = MemberDescriptor::new("_cache", MemberShape::Property { ty: None })
            .with_visibility(Visibility::Private)
            .abstract_member();
        assert!(!m.is_owed());

        let m = m.with_visibility(Visibility::Protected);
        assert!(m.is_owed());
    }

    #[test]
    fn getter_and_setter_merge_into_a_pair() {
        let getter = MemberDescriptor::new(
            "label",
            MemberShape::GetAccessor {
                return_type: Some("string".to_string()),
            },
        )
        .with_visibility(Visibility::Protected)
        .abstract_member();
        let setter = MemberDescriptor::new(
            "label",
            MemberShape::SetAccessor {
                param: Param::typed("v", "string"),
            },
        );

        let mut from_setter = setter.clone();
        assert!(from_setter.merge_accessor(&getter));
        let mut from_getter = getter.clone();
        assert!(from_getter.merge_accessor(&setter));
        assert_eq!(from_getter, from_setter);
        assert_eq!(from_getter.visibility, Visibility::Protected);
        assert!(from_getter.is_abstract);
        assert_eq!(
            from_getter.shape,
            MemberShape::AccessorPair {
                return_type: Some("string".to_string()),
                param: Param::typed("v", "string"),
            }
        );

        let mut twice = getter.clone();
        assert!(!twice.merge_accessor(&getter));
        assert_eq!(twice, getter);
    }

    #[test]
    fn visibility_keywords() {
        assert_eq!(Visibility::Implicit.keyword(), None);
        assert_eq!(Visibility::Protected.keyword(), Some("protected"));
        assert_eq!(Visibility::Internal.keyword(), Some("internal"));
    }
}
