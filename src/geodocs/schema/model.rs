//! Compiled form of an XML Schema, reduced to what instance checking needs.

use regex::Regex;
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};

pub const XS_NS: &str = "http://www.w3.org/2001/XMLSchema";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// `minOccurs`/`maxOccurs`; `max: None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    pub min: u32,
    pub max: Option<u32>,
}

impl Occurs {
    pub const ONCE: Occurs = Occurs {
        min: 1,
        max: Some(1),
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteSpace {
    Preserve,
    Replace,
    Collapse,
}

impl WhiteSpace {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "preserve" => Some(WhiteSpace::Preserve),
            "replace" => Some(WhiteSpace::Replace),
            "collapse" => Some(WhiteSpace::Collapse),
            _ => None,
        }
    }

    pub fn apply(self, value: &str) -> Cow<'_, str> {
        match self {
            WhiteSpace::Preserve => Cow::Borrowed(value),
            WhiteSpace::Replace => Cow::Owned(
                value
                    .chars()
                    .map(|c| if matches!(c, '\t' | '\n' | '\r') { ' ' } else { c })
                    .collect(),
            ),
            WhiteSpace::Collapse => Cow::Owned(value.split_ascii_whitespace().collect::<Vec<_>>().join(" ")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    String,
    NormalizedString,
    Token,
    Name,
    NcName,
    QName,
    NmToken,
    /// `xs:NMTOKENS`
    NmTokens,
    /// `xs:IDREFS` and `xs:ENTITIES`
    NcNames,
    Language,
    Boolean,
    /// `xs:integer` and its derived types, with their value range.
    Integer {
        min: Option<i128>,
        max: Option<i128>,
    },
    Decimal,
    Double,
    AnyUri,
    DateTime,
    Date,
    Time,
    Duration,
    GYear,
    GYearMonth,
    GMonth,
    GDay,
    GMonthDay,
    HexBinary,
    Base64Binary,
    AnySimple,
}

impl Builtin {
    /// The builtin named `name` in the XML Schema namespace, if this validator knows it.
    pub fn from_local(name: &str) -> Option<Builtin> {
        let integer = |min: Option<i128>, max: Option<i128>| Builtin::Integer { min, max };
        let b = match name {
            "string" => Builtin::String,
            "normalizedString" => Builtin::NormalizedString,
            "token" => Builtin::Token,
            "Name" => Builtin::Name,
            "NCName" | "ID" | "IDREF" | "ENTITY" => Builtin::NcName,
            "QName" => Builtin::QName,
            "NMTOKEN" => Builtin::NmToken,
            "NMTOKENS" => Builtin::NmTokens,
            "IDREFS" | "ENTITIES" => Builtin::NcNames,
            "language" => Builtin::Language,
            "boolean" => Builtin::Boolean,
            "integer" => integer(None, None),
            "long" => integer(Some(i64::MIN.into()), Some(i64::MAX.into())),
            "int" => integer(Some(i32::MIN.into()), Some(i32::MAX.into())),
            "short" => integer(Some(i16::MIN.into()), Some(i16::MAX.into())),
            "byte" => integer(Some(i8::MIN.into()), Some(i8::MAX.into())),
            "nonNegativeInteger" => integer(Some(0), None),
            "positiveInteger" => integer(Some(1), None),
            "nonPositiveInteger" => integer(None, Some(0)),
            "negativeInteger" => integer(None, Some(-1)),
            "unsignedLong" => integer(Some(0), Some(u64::MAX.into())),
            "unsignedInt" => integer(Some(0), Some(u32::MAX.into())),
            "unsignedShort" => integer(Some(0), Some(u16::MAX.into())),
            "unsignedByte" => integer(Some(0), Some(u8::MAX.into())),
            "decimal" => Builtin::Decimal,
            "double" | "float" => Builtin::Double,
            "anyURI" => Builtin::AnyUri,
            "dateTime" => Builtin::DateTime,
            "date" => Builtin::Date,
            "time" => Builtin::Time,
            "duration" => Builtin::Duration,
            "gYear" => Builtin::GYear,
            "gYearMonth" => Builtin::GYearMonth,
            "gMonth" => Builtin::GMonth,
            "gDay" => Builtin::GDay,
            "gMonthDay" => Builtin::GMonthDay,
            "hexBinary" => Builtin::HexBinary,
            "base64Binary" => Builtin::Base64Binary,
            "anySimpleType" => Builtin::AnySimple,
            _ => return None,
        };
        Some(b)
    }

    pub fn white_space(self) -> WhiteSpace {
        match self {
            Builtin::String | Builtin::AnySimple => WhiteSpace::Preserve,
            Builtin::NormalizedString => WhiteSpace::Replace,
            _ => WhiteSpace::Collapse,
        }
    }
}

/// A reference to a type by QName, classified by namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Builtin(Builtin),
    /// Type declared in the schema's own namespace.
    Named(String),
    /// Type from an imported namespace; accepted without checking.
    Foreign,
    AnyType,
}

#[derive(Debug, Clone)]
pub enum ElementType {
    Ref(TypeRef),
    Complex(Box<ComplexType>),
    Simple(SimpleType),
}

#[derive(Debug, Clone)]
pub struct ElementDecl {
    pub name: String,
    /// Namespace instances of this declaration must use.
    pub namespace: Option<String>,
    pub ty: ElementType,
    pub nillable: bool,
    pub is_abstract: bool,
    pub fixed: Option<String>,
    pub constraints: Vec<IdentityConstraint>,
}

/// Which namespaces an `xs:any` or `xs:anyAttribute` wildcard admits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NamespaceConstraint {
    Any,
    /// Any namespace other than the target one; unqualified names are excluded.
    Other(Option<String>),
    /// Listed namespaces; `None` stands for unqualified names.
    List(Vec<Option<String>>),
}

impl NamespaceConstraint {
    pub fn admits(&self, namespace: Option<&str>) -> bool {
        match self {
            NamespaceConstraint::Any => true,
            NamespaceConstraint::Other(target) => {
                namespace.is_some() && namespace != target.as_deref()
            }
            NamespaceConstraint::List(list) => list.iter().any(|ns| ns.as_deref() == namespace),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessContents {
    Strict,
    Lax,
    Skip,
}

#[derive(Debug, Clone)]
pub enum Particle {
    Element { decl: ElementDecl, occurs: Occurs },
    /// Reference to a global element of this schema (or its substitution group).
    ElementRef { name: String, occurs: Occurs },
    /// Reference to an element of an imported namespace, matched by local name.
    ForeignElement { name: String, occurs: Occurs },
    Sequence { items: Vec<Particle>, occurs: Occurs },
    Choice { items: Vec<Particle>, occurs: Occurs },
    All { items: Vec<Particle>, occurs: Occurs },
    Group { name: String, occurs: Occurs },
    Any {
        occurs: Occurs,
        namespaces: NamespaceConstraint,
        process: ProcessContents,
    },
}

impl Particle {
    pub fn occurs(&self) -> Occurs {
        match self {
            Particle::Element { occurs, .. }
            | Particle::ElementRef { occurs, .. }
            | Particle::ForeignElement { occurs, .. }
            | Particle::Sequence { occurs, .. }
            | Particle::Choice { occurs, .. }
            | Particle::All { occurs, .. }
            | Particle::Group { occurs, .. }
            | Particle::Any { occurs, .. } => *occurs,
        }
    }
}

#[derive(Debug, Clone)]
pub enum SimpleRef {
    Ref(TypeRef),
    Inline(Box<SimpleType>),
}

impl SimpleRef {
    pub fn builtin(b: Builtin) -> Self {
        SimpleRef::Ref(TypeRef::Builtin(b))
    }
}

#[derive(Debug, Clone)]
pub struct AttributeDecl {
    pub name: String,
    /// `None` for unqualified attributes.
    pub namespace: Option<String>,
    pub required: bool,
    pub fixed: Option<String>,
    /// `None` when the type lives in an imported namespace.
    pub ty: Option<SimpleRef>,
}

#[derive(Debug, Clone)]
pub enum AttrUse {
    Decl(AttributeDecl),
    /// Use of a global attribute of this schema.
    Ref {
        name: String,
        required: bool,
        fixed: Option<String>,
    },
    Group(String),
    /// `use="prohibited"`: removes an attribute inherited from the base type.
    Prohibited(String),
}

#[derive(Debug, Clone, Default)]
pub struct ComplexType {
    /// Base of a `complexContent` or `simpleContent` derivation.
    pub base: Option<TypeRef>,
    /// Derived by restriction: only the base's attributes are inherited.
    pub restriction: bool,
    pub particle: Option<Particle>,
    pub attributes: Vec<AttrUse>,
    pub any_attribute: Option<NamespaceConstraint>,
    pub mixed: bool,
    pub simple_content: bool,
    /// Facets of a `simpleContent` restriction, checked on top of the base.
    pub content_facets: Option<Facets>,
}

/// A compiled `xs:pattern` facet; the source is kept for messages.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub source: String,
    pub regex: Regex,
}

#[derive(Debug, Clone, Default)]
pub struct Facets {
    pub enumeration: Vec<String>,
    /// The `pattern` facets of one derivation step, which are alternatives.
    pub pattern: Option<Pattern>,
    pub length: Option<usize>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min_inclusive: Option<String>,
    pub max_inclusive: Option<String>,
    pub min_exclusive: Option<String>,
    pub max_exclusive: Option<String>,
    pub total_digits: Option<usize>,
    pub fraction_digits: Option<usize>,
    pub white_space: Option<WhiteSpace>,
}

#[derive(Debug, Clone)]
pub enum Variety {
    /// Restriction of a single base type.
    Atomic(SimpleRef),
    /// Whitespace-separated list of item values.
    List(SimpleRef),
    Union(Vec<SimpleRef>),
}

#[derive(Debug, Clone)]
pub struct SimpleType {
    pub variety: Variety,
    pub facets: Facets,
}

impl SimpleType {
    pub fn any() -> Self {
        Self {
            variety: Variety::Atomic(SimpleRef::builtin(Builtin::AnySimple)),
            facets: Facets::default(),
        }
    }
}

/// One step of a restricted identity-constraint path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameTest {
    /// `.`
    Current,
    /// `*`
    Any,
    Local(String),
}

/// A path of child steps, optionally starting with `.//`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPath {
    pub descendants: bool,
    pub steps: Vec<NameTest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    pub path: StepPath,
    /// Final `@name` step.
    pub attribute: Option<NameTest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    Key,
    /// Refers to a key or unique constraint declared on the same element.
    KeyRef { refer: String },
}

#[derive(Debug, Clone)]
pub struct IdentityConstraint {
    pub name: String,
    pub kind: ConstraintKind,
    /// Alternatives of the selector (`a | b`).
    pub selector: Vec<StepPath>,
    /// Each field with its alternatives.
    pub fields: Vec<Vec<FieldPath>>,
}

#[derive(Debug, Clone, Default)]
pub struct Schema {
    pub target_namespace: Option<String>,
    pub elements: HashMap<String, ElementDecl>,
    pub attributes: HashMap<String, AttributeDecl>,
    pub complex_types: HashMap<String, ComplexType>,
    pub simple_types: HashMap<String, SimpleType>,
    pub groups: HashMap<String, Particle>,
    pub attribute_groups: HashMap<String, (Vec<AttrUse>, Option<NamespaceConstraint>)>,
    /// Substitution group head -> direct members.
    pub substitutions: HashMap<String, Vec<String>>,
    pub imported_namespaces: HashSet<String>,
}

impl Schema {
    /// Whether `candidate` is `name` or, transitively, a member of its substitution group.
    pub fn substitutes_for(&self, name: &str, candidate: &str) -> bool {
        let mut pending = vec![name];
        let mut seen = HashSet::new();
        while let Some(head) = pending.pop() {
            if head == candidate {
                return true;
            }
            if !seen.insert(head) {
                continue;
            }
            if let Some(members) = self.substitutions.get(head) {
                pending.extend(members.iter().map(String::as_str));
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_names_map_to_families() {
        assert_eq!(
            Builtin::from_local("unsignedByte"),
            Some(Builtin::Integer {
                min: Some(0),
                max: Some(255)
            })
        );
        assert_eq!(Builtin::from_local("float"), Some(Builtin::Double));
        assert_eq!(Builtin::from_local("ID"), Some(Builtin::NcName));
        assert_eq!(Builtin::from_local("NOTATION"), None);
    }

    #[test]
    fn white_space_normalisation() {
        assert_eq!(WhiteSpace::Preserve.apply(" a\tb "), " a\tb ");
        assert_eq!(WhiteSpace::Replace.apply(" a\tb\n"), " a b ");
        assert_eq!(WhiteSpace::Collapse.apply("  a \n\t b  "), "a b");
        assert_eq!(Builtin::Token.white_space(), WhiteSpace::Collapse);
        assert_eq!(Builtin::String.white_space(), WhiteSpace::Preserve);
    }

    #[test]
    fn namespace_wildcards() {
        let other = NamespaceConstraint::Other(Some("urn:t".into()));
        assert!(other.admits(Some("urn:x")));
        assert!(!other.admits(Some("urn:t")));
        assert!(!other.admits(None));

        let list = NamespaceConstraint::List(vec![None, Some("urn:t".into())]);
        assert!(list.admits(None));
        assert!(list.admits(Some("urn:t")));
        assert!(!list.admits(Some("urn:x")));
    }

    #[test]
    fn substitution_is_transitive() {
        let mut schema = Schema::default();
        schema
            .substitutions
            .insert("AbstractFeature".into(), vec!["Container".into()]);
        schema
            .substitutions
            .insert("Container".into(), vec!["Folder".into(), "Document".into()]);

        assert!(schema.substitutes_for("AbstractFeature", "Folder"));
        assert!(schema.substitutes_for("Folder", "Folder"));
        assert!(!schema.substitutes_for("Folder", "Document"));
    }
}
