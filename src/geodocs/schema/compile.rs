//! Turns XSD documents into a [`Schema`].
//!
//! `xs:include` is followed through the loader; imported namespaces are only
//! recorded, so their content is later accepted without checking. Any construct
//! the checker cannot enforce (`xs:redefine`, XSD 1.1 assertions, Unicode block
//! escapes in patterns, unknown facets, dangling references) fails compilation
//! so that a schema is never applied partially.

use super::identity;
use super::lexical::translate_pattern;
use super::model::*;
use crate::error::{GeodocError, Result};
use regex::Regex;
use roxmltree::Node;
use std::collections::HashSet;
use tracing::debug;

/// Fetches the text of a schema document given its absolute location.
pub type Loader<'a> = dyn Fn(&str) -> Result<String> + 'a;

type Compiled<T> = std::result::Result<T, String>;

const MODEL_GROUP_CHILDREN: &[&str] = &["annotation", "element", "group", "choice", "sequence", "any"];
const FACETS: &[&str] = &[
    "enumeration",
    "pattern",
    "length",
    "minLength",
    "maxLength",
    "minInclusive",
    "maxInclusive",
    "minExclusive",
    "maxExclusive",
    "totalDigits",
    "fractionDigits",
    "whiteSpace",
];

pub struct SchemaCompiler<'a> {
    schema: Schema,
    visited: HashSet<String>,
    loader: &'a Loader<'a>,
    resolve: fn(&str, &str) -> String,
}

impl<'a> SchemaCompiler<'a> {
    pub fn new(loader: &'a Loader<'a>, resolve: fn(&str, &str) -> String) -> Self {
        Self {
            schema: Schema::default(),
            visited: HashSet::new(),
            loader,
            resolve,
        }
    }

    pub fn compile(mut self, location: &str, text: &str) -> Result<Schema> {
        self.add_document(location, text, None)?;
        verify(&self.schema).map_err(|reason| GeodocError::SchemaUnavailable {
            location: location.to_string(),
            reason,
        })?;
        Ok(self.schema)
    }

    fn add_document(
        &mut self,
        location: &str,
        text: &str,
        inherited_ns: Option<&str>,
    ) -> Result<()> {
        if !self.visited.insert(location.to_string()) {
            return Ok(());
        }
        debug!(location, "compiling schema document");
        let unavailable = |reason: String| GeodocError::SchemaUnavailable {
            location: location.to_string(),
            reason,
        };

        let doc = crate::xml::parse(text)
            .map_err(|e| unavailable(format!("schema is not well-formed: {}", e)))?;
        let root = doc.root_element();
        if root.tag_name().namespace() != Some(XS_NS) || root.tag_name().name() != "schema" {
            return Err(unavailable("document is not an XML Schema".to_string()));
        }

        // Chameleon includes adopt the including schema's namespace.
        let target = root
            .attribute("targetNamespace")
            .or(inherited_ns)
            .map(str::to_string);
        if self.schema.target_namespace.is_none() {
            self.schema.target_namespace = target.clone();
        }
        let ctx = Ctx {
            target: target.as_deref(),
            qualified_elements: root.attribute("elementFormDefault") == Some("qualified"),
            qualified_attributes: root.attribute("attributeFormDefault") == Some("qualified"),
        };

        for node in xs_children(root) {
            match node.tag_name().name() {
                "include" => {
                    if let Some(rel) = node.attribute("schemaLocation") {
                        let included = (self.resolve)(location, rel);
                        let body = (self.loader)(&included)?;
                        self.add_document(&included, &body, target.as_deref())?;
                    }
                }
                "import" => {
                    if let Some(ns) = node.attribute("namespace") {
                        self.schema.imported_namespaces.insert(ns.to_string());
                    }
                }
                "annotation" | "notation" => {}
                _ => self.add_definition(&ctx, node).map_err(unavailable)?,
            }
        }
        Ok(())
    }

    fn add_definition(&mut self, ctx: &Ctx, node: Node) -> Compiled<()> {
        let kind = node.tag_name().name();
        let named = || {
            node.attribute("name")
                .map(str::to_string)
                .ok_or_else(|| format!("top-level xs:{} has no name", kind))
        };
        match kind {
            "element" => {
                let name = named()?;
                if let Some(head) = node.attribute("substitutionGroup") {
                    if ctx.is_own(node, head) {
                        self.schema
                            .substitutions
                            .entry(local_name(head).to_string())
                            .or_default()
                            .push(name.clone());
                    }
                }
                let decl = ctx.element_decl(node, &name, true)?;
                self.schema.elements.insert(name, decl);
            }
            "attribute" => {
                let name = named()?;
                let decl = ctx.attribute_decl(node, &name, true)?;
                self.schema.attributes.insert(name, decl);
            }
            "complexType" => {
                let name = named()?;
                let ct = ctx.complex_type(node)?;
                self.schema.complex_types.insert(name, ct);
            }
            "simpleType" => {
                let name = named()?;
                let st = ctx.simple_type(node)?;
                self.schema.simple_types.insert(name, st);
            }
            "group" => {
                let name = named()?;
                expect_children(node, MODEL_GROUP_CHILDREN)?;
                let particle = xs_children(node)
                    .filter(|n| n.tag_name().name() != "annotation")
                    .map(|n| ctx.particle(n))
                    .next()
                    .transpose()?
                    .flatten()
                    .ok_or_else(|| format!("group '{}' has no model group", name))?;
                self.schema.groups.insert(name, particle);
            }
            "attributeGroup" => {
                let name = named()?;
                let uses = ctx.attributes(node)?;
                self.schema.attribute_groups.insert(name, uses);
            }
            other => return Err(format!("'xs:{}' is not supported", other)),
        }
        Ok(())
    }
}

/// Per-document context: the namespace that unqualified references resolve
/// into and the form defaults.
struct Ctx<'t> {
    target: Option<&'t str>,
    qualified_elements: bool,
    qualified_attributes: bool,
}

impl Ctx<'_> {
    fn type_ref(&self, node: Node, qname: &str) -> Compiled<TypeRef> {
        let (prefix, local) = split_qname(qname);
        match node.lookup_namespace_uri(prefix) {
            Some(XS_NS) if local == "anyType" => Ok(TypeRef::AnyType),
            Some(XS_NS) => Builtin::from_local(local)
                .map(TypeRef::Builtin)
                .ok_or_else(|| format!("builtin type 'xs:{}' is not supported", local)),
            None => Ok(TypeRef::Named(local.to_string())),
            Some(ns) if Some(ns) == self.target => Ok(TypeRef::Named(local.to_string())),
            Some(_) => Ok(TypeRef::Foreign),
        }
    }

    /// Whether `qname` names a component of this schema rather than an imported one.
    fn is_own(&self, node: Node, qname: &str) -> bool {
        let (prefix, _) = split_qname(qname);
        match node.lookup_namespace_uri(prefix) {
            None => true,
            Some(ns) => Some(ns) == self.target,
        }
    }

    fn form(&self, node: Node, default_qualified: bool) -> Option<String> {
        let qualified = match node.attribute("form") {
            Some("qualified") => true,
            Some("unqualified") => false,
            _ => default_qualified,
        };
        qualified.then(|| self.target.map(str::to_string)).flatten()
    }

    fn element_decl(&self, node: Node, name: &str, global: bool) -> Compiled<ElementDecl> {
        expect_children(
            node,
            &["annotation", "complexType", "simpleType", "unique", "key", "keyref"],
        )?;
        let ty = if let Some(t) = node.attribute("type") {
            ElementType::Ref(self.type_ref(node, t)?)
        } else if let Some(ct) = xs_child(node, "complexType") {
            ElementType::Complex(Box::new(self.complex_type(ct)?))
        } else if let Some(st) = xs_child(node, "simpleType") {
            ElementType::Simple(self.simple_type(st)?)
        } else {
            ElementType::Ref(TypeRef::AnyType)
        };

        let constraints = xs_children(node)
            .filter(|n| matches!(n.tag_name().name(), "unique" | "key" | "keyref"))
            .map(identity::parse_constraint)
            .collect::<Compiled<Vec<_>>>()?;
        identity::check_references(&constraints)?;

        let namespace = if global {
            self.target.map(str::to_string)
        } else {
            self.form(node, self.qualified_elements)
        };
        Ok(ElementDecl {
            name: name.to_string(),
            namespace,
            ty,
            nillable: node.attribute("nillable") == Some("true"),
            is_abstract: node.attribute("abstract") == Some("true"),
            fixed: node.attribute("fixed").map(str::to_string),
            constraints,
        })
    }

    fn particle(&self, node: Node) -> Compiled<Option<Particle>> {
        let occurs = occurs(node)?;
        let particle = match node.tag_name().name() {
            "annotation" => return Ok(None),
            "element" => {
                if let Some(r) = node.attribute("ref") {
                    let name = local_name(r).to_string();
                    if self.is_own(node, r) {
                        Particle::ElementRef { name, occurs }
                    } else {
                        Particle::ForeignElement { name, occurs }
                    }
                } else {
                    let name = node
                        .attribute("name")
                        .ok_or("local element without name or ref")?;
                    Particle::Element {
                        decl: self.element_decl(node, name, false)?,
                        occurs,
                    }
                }
            }
            kind @ ("sequence" | "choice" | "all") => {
                expect_children(node, MODEL_GROUP_CHILDREN)?;
                let mut items = Vec::new();
                for child in xs_children(node) {
                    items.extend(self.particle(child)?);
                }
                match kind {
                    "sequence" => Particle::Sequence { items, occurs },
                    "choice" => Particle::Choice { items, occurs },
                    _ => Particle::All { items, occurs },
                }
            }
            "group" => Particle::Group {
                name: local_name(node.attribute("ref").ok_or("group reference without ref")?)
                    .to_string(),
                occurs,
            },
            "any" => Particle::Any {
                occurs,
                namespaces: self.namespace_constraint(node)?,
                process: match node.attribute("processContents") {
                    None | Some("strict") => ProcessContents::Strict,
                    Some("lax") => ProcessContents::Lax,
                    Some("skip") => ProcessContents::Skip,
                    Some(other) => return Err(format!("invalid processContents '{}'", other)),
                },
            },
            other => return Err(format!("'xs:{}' is not supported in a content model", other)),
        };
        Ok(Some(particle))
    }

    fn namespace_constraint(&self, node: Node) -> Compiled<NamespaceConstraint> {
        let target = self.target.map(str::to_string);
        match node.attribute("namespace").unwrap_or("##any").trim() {
            "##any" => Ok(NamespaceConstraint::Any),
            "##other" => Ok(NamespaceConstraint::Other(target)),
            list => Ok(NamespaceConstraint::List(
                list.split_whitespace()
                    .map(|ns| match ns {
                        "##local" => None,
                        "##targetNamespace" => target.clone(),
                        uri => Some(uri.to_string()),
                    })
                    .collect(),
            )),
        }
    }

    fn attribute_decl(&self, node: Node, name: &str, global: bool) -> Compiled<AttributeDecl> {
        expect_children(node, &["annotation", "simpleType"])?;
        let ty = if let Some(t) = node.attribute("type") {
            SimpleRef::Ref(self.type_ref(node, t)?)
        } else if let Some(st) = xs_child(node, "simpleType") {
            SimpleRef::Inline(Box::new(self.simple_type(st)?))
        } else {
            SimpleRef::builtin(Builtin::AnySimple)
        };
        let namespace = if global {
            self.target.map(str::to_string)
        } else {
            self.form(node, self.qualified_attributes)
        };
        Ok(AttributeDecl {
            name: name.to_string(),
            namespace,
            required: node.attribute("use") == Some("required"),
            fixed: node.attribute("fixed").map(str::to_string),
            ty: Some(ty),
        })
    }

    /// Attribute uses declared directly under `node`, and its `anyAttribute` wildcard.
    fn attributes(&self, node: Node) -> Compiled<(Vec<AttrUse>, Option<NamespaceConstraint>)> {
        let mut uses = Vec::new();
        let mut any = None;
        for child in xs_children(node) {
            match child.tag_name().name() {
                "attribute" => {
                    let prohibited = child.attribute("use") == Some("prohibited");
                    if let Some(r) = child.attribute("ref") {
                        let name = local_name(r).to_string();
                        let required = child.attribute("use") == Some("required");
                        let fixed = child.attribute("fixed").map(str::to_string);
                        if prohibited {
                            uses.push(AttrUse::Prohibited(name));
                        } else if self.is_own(child, r) {
                            uses.push(AttrUse::Ref {
                                name,
                                required,
                                fixed,
                            });
                        } else {
                            let (prefix, _) = split_qname(r);
                            uses.push(AttrUse::Decl(AttributeDecl {
                                name,
                                namespace: child.lookup_namespace_uri(prefix).map(str::to_string),
                                required,
                                fixed,
                                ty: None,
                            }));
                        }
                        continue;
                    }
                    let name = child
                        .attribute("name")
                        .ok_or("attribute without name or ref")?;
                    if prohibited {
                        uses.push(AttrUse::Prohibited(name.to_string()));
                    } else {
                        uses.push(AttrUse::Decl(self.attribute_decl(child, name, false)?));
                    }
                }
                "attributeGroup" => {
                    let r = child.attribute("ref").ok_or("attributeGroup without ref")?;
                    // Foreign attributes are qualified and accepted without checking.
                    if self.is_own(child, r) {
                        uses.push(AttrUse::Group(local_name(r).to_string()));
                    }
                }
                "anyAttribute" => any = Some(self.namespace_constraint(child)?),
                _ => {}
            }
        }
        Ok((uses, any))
    }

    fn complex_type(&self, node: Node) -> Compiled<ComplexType> {
        let mut ct = ComplexType {
            mixed: node.attribute("mixed") == Some("true"),
            ..ComplexType::default()
        };

        if let Some(cc) = xs_child(node, "complexContent") {
            expect_children(node, &["annotation", "complexContent"])?;
            ct.mixed |= cc.attribute("mixed") == Some("true");
            let (derived, restriction) = derivation(cc)?;
            ct.base = derived.attribute("base").map(|b| self.type_ref(derived, b)).transpose()?;
            ct.restriction = restriction;
            self.content(derived, &mut ct, &[])?;
        } else if let Some(sc) = xs_child(node, "simpleContent") {
            expect_children(node, &["annotation", "simpleContent"])?;
            ct.simple_content = true;
            let (derived, restriction) = derivation(sc)?;
            ct.base = derived.attribute("base").map(|b| self.type_ref(derived, b)).transpose()?;
            if restriction {
                if xs_child(derived, "simpleType").is_some() {
                    return Err("simpleType inside a simpleContent restriction is not supported".into());
                }
                ct.content_facets = Some(facets(derived, &["attribute", "attributeGroup", "anyAttribute"])?);
                self.content(derived, &mut ct, FACETS)?;
            } else {
                self.content(derived, &mut ct, &[])?;
            }
        } else {
            self.content(node, &mut ct, &[])?;
        }
        Ok(ct)
    }

    /// Read the model group and attributes under `body` into `ct`.
    fn content(&self, body: Node, ct: &mut ComplexType, also: &[&str]) -> Compiled<()> {
        for child in xs_children(body) {
            match child.tag_name().name() {
                "annotation" | "attribute" | "attributeGroup" | "anyAttribute" => {}
                "sequence" | "choice" | "all" | "group" => {
                    if ct.particle.is_some() {
                        return Err("complex type has more than one model group".into());
                    }
                    ct.particle = self.particle(child)?;
                }
                other if also.contains(&other) => {}
                other => return Err(format!("'xs:{}' is not supported in a complex type", other)),
            }
        }
        let (attrs, any) = self.attributes(body)?;
        ct.attributes = attrs;
        ct.any_attribute = any;
        Ok(())
    }

    fn simple_ref(&self, node: Node, attr: &str) -> Compiled<SimpleRef> {
        if let Some(t) = node.attribute(attr) {
            Ok(SimpleRef::Ref(self.type_ref(node, t)?))
        } else if let Some(st) = xs_child(node, "simpleType") {
            Ok(SimpleRef::Inline(Box::new(self.simple_type(st)?)))
        } else {
            Err(format!("xs:{} has neither {} nor an inline type", node.tag_name().name(), attr))
        }
    }

    fn simple_type(&self, node: Node) -> Compiled<SimpleType> {
        expect_children(node, &["annotation", "restriction", "list", "union"])?;
        if let Some(restriction) = xs_child(node, "restriction") {
            return Ok(SimpleType {
                variety: Variety::Atomic(self.simple_ref(restriction, "base")?),
                facets: facets(restriction, &[])?,
            });
        }
        if let Some(list) = xs_child(node, "list") {
            expect_children(list, &["annotation", "simpleType"])?;
            return Ok(SimpleType {
                variety: Variety::List(self.simple_ref(list, "itemType")?),
                facets: Facets::default(),
            });
        }
        if let Some(union) = xs_child(node, "union") {
            expect_children(union, &["annotation", "simpleType"])?;
            let mut members = Vec::new();
            for qname in union.attribute("memberTypes").unwrap_or("").split_whitespace() {
                members.push(SimpleRef::Ref(self.type_ref(union, qname)?));
            }
            for st in xs_children(union).filter(|n| n.tag_name().name() == "simpleType") {
                members.push(SimpleRef::Inline(Box::new(self.simple_type(st)?)));
            }
            if members.is_empty() {
                return Err("union without member types".into());
            }
            return Ok(SimpleType {
                variety: Variety::Union(members),
                facets: Facets::default(),
            });
        }
        Err("simpleType without restriction, list or union".into())
    }
}

/// Facets under a `restriction`; children named in `also` are left to the caller.
fn facets(restriction: Node, also: &[&str]) -> Compiled<Facets> {
    let mut f = Facets::default();
    let mut patterns = Vec::new();
    for child in xs_children(restriction) {
        let kind = child.tag_name().name();
        let value = || {
            child
                .attribute("value")
                .ok_or_else(|| format!("facet xs:{} has no value", kind))
        };
        let count = || -> Compiled<usize> {
            let v = value()?;
            v.trim()
                .parse()
                .map_err(|_| format!("facet xs:{} has invalid value '{}'", kind, v))
        };
        match kind {
            "annotation" | "simpleType" => {}
            "enumeration" => f.enumeration.push(value()?.to_string()),
            "pattern" => patterns.push(value()?.to_string()),
            "length" => f.length = Some(count()?),
            "minLength" => f.min_length = Some(count()?),
            "maxLength" => f.max_length = Some(count()?),
            "minInclusive" => f.min_inclusive = Some(value()?.to_string()),
            "maxInclusive" => f.max_inclusive = Some(value()?.to_string()),
            "minExclusive" => f.min_exclusive = Some(value()?.to_string()),
            "maxExclusive" => f.max_exclusive = Some(value()?.to_string()),
            "totalDigits" => f.total_digits = Some(count()?),
            "fractionDigits" => f.fraction_digits = Some(count()?),
            "whiteSpace" => {
                let v = value()?;
                f.white_space = Some(
                    WhiteSpace::parse(v.trim())
                        .ok_or_else(|| format!("invalid whiteSpace value '{}'", v))?,
                );
            }
            other if also.contains(&other) => {}
            other => return Err(format!("facet or construct 'xs:{}' is not supported", other)),
        }
    }

    if !patterns.is_empty() {
        let translated = patterns
            .iter()
            .map(|p| translate_pattern(p))
            .collect::<Compiled<Vec<_>>>()?;
        let source = patterns.join(" | ");
        let regex = Regex::new(&translated.join("|"))
            .map_err(|e| format!("pattern '{}' is not supported: {}", source, e))?;
        f.pattern = Some(Pattern { source, regex });
    }
    Ok(f)
}

/// The `extension`/`restriction` under a content model node, and whether it restricts.
fn derivation<'a, 'input: 'a>(content: Node<'a, 'input>) -> Compiled<(Node<'a, 'input>, bool)> {
    expect_children(content, &["annotation", "extension", "restriction"])?;
    let derived = xs_children(content)
        .find(|n| matches!(n.tag_name().name(), "extension" | "restriction"))
        .ok_or_else(|| format!("xs:{} without extension or restriction", content.tag_name().name()))?;
    Ok((derived, derived.tag_name().name() == "restriction"))
}

fn occurs(node: Node) -> Compiled<Occurs> {
    let invalid = |attr: &str, v: &str| format!("invalid {} '{}'", attr, v);
    let min = match node.attribute("minOccurs") {
        Some(v) => v.trim().parse().map_err(|_| invalid("minOccurs", v))?,
        None => 1,
    };
    let max = match node.attribute("maxOccurs").map(str::trim) {
        Some("unbounded") => None,
        Some(v) => Some(v.parse().map_err(|_| invalid("maxOccurs", v))?),
        None => Some(1),
    };
    Ok(Occurs { min, max })
}

fn split_qname(qname: &str) -> (Option<&str>, &str) {
    match qname.split_once(':') {
        Some((p, l)) => (Some(p), l),
        None => (None, qname),
    }
}

fn local_name(qname: &str) -> &str {
    split_qname(qname).1
}

fn xs_children<'a, 'input: 'a>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(|n| n.is_element() && n.tag_name().namespace() == Some(XS_NS))
}

fn xs_child<'a, 'input: 'a>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    xs_children(node).find(|n| n.tag_name().name() == name)
}

fn expect_children(node: Node, allowed: &[&str]) -> Compiled<()> {
    match xs_children(node).find(|n| !allowed.contains(&n.tag_name().name())) {
        Some(child) => Err(format!(
            "'xs:{}' is not supported inside xs:{}",
            child.tag_name().name(),
            node.tag_name().name()
        )),
        None => Ok(()),
    }
}

/// Every named reference resolves within the compiled schema.
fn verify(schema: &Schema) -> Compiled<()> {
    let v = Verifier { schema };
    for decl in schema.elements.values() {
        v.element(decl)?;
    }
    for ct in schema.complex_types.values() {
        v.complex(ct)?;
    }
    for st in schema.simple_types.values() {
        v.simple(st)?;
    }
    for particle in schema.groups.values() {
        v.particle(particle)?;
    }
    for (uses, _) in schema.attribute_groups.values() {
        v.attr_uses(uses)?;
    }
    for decl in schema.attributes.values() {
        if let Some(ty) = &decl.ty {
            v.simple_ref(ty)?;
        }
    }
    for head in schema.substitutions.keys() {
        if !schema.elements.contains_key(head) {
            return Err(format!("substitution group head '{}' is not declared", head));
        }
    }
    Ok(())
}

struct Verifier<'s> {
    schema: &'s Schema,
}

impl Verifier<'_> {
    fn type_ref(&self, r: &TypeRef) -> Compiled<()> {
        match r {
            TypeRef::Named(name)
                if !self.schema.complex_types.contains_key(name)
                    && !self.schema.simple_types.contains_key(name) =>
            {
                Err(format!("type '{}' is not declared", name))
            }
            _ => Ok(()),
        }
    }

    fn simple_type_ref(&self, r: &TypeRef) -> Compiled<()> {
        match r {
            TypeRef::Named(name) if !self.schema.simple_types.contains_key(name) => {
                Err(format!("simple type '{}' is not declared", name))
            }
            _ => Ok(()),
        }
    }

    fn element(&self, decl: &ElementDecl) -> Compiled<()> {
        match &decl.ty {
            ElementType::Ref(r) => self.type_ref(r),
            ElementType::Complex(ct) => self.complex(ct),
            ElementType::Simple(st) => self.simple(st),
        }
    }

    fn complex(&self, ct: &ComplexType) -> Compiled<()> {
        if let Some(base) = &ct.base {
            self.type_ref(base)?;
        }
        if let Some(p) = &ct.particle {
            self.particle(p)?;
        }
        self.attr_uses(&ct.attributes)
    }

    fn particle(&self, p: &Particle) -> Compiled<()> {
        match p {
            Particle::Element { decl, .. } => self.element(decl),
            Particle::ElementRef { name, .. } if !self.schema.elements.contains_key(name) => {
                Err(format!("element '{}' is not declared", name))
            }
            Particle::Group { name, .. } if !self.schema.groups.contains_key(name) => {
                Err(format!("group '{}' is not declared", name))
            }
            Particle::Sequence { items, .. }
            | Particle::Choice { items, .. }
            | Particle::All { items, .. } => items.iter().try_for_each(|i| self.particle(i)),
            _ => Ok(()),
        }
    }

    fn attr_uses(&self, uses: &[AttrUse]) -> Compiled<()> {
        for u in uses {
            match u {
                AttrUse::Decl(decl) => {
                    if let Some(ty) = &decl.ty {
                        self.simple_ref(ty)?;
                    }
                }
                AttrUse::Ref { name, .. } if !self.schema.attributes.contains_key(name) => {
                    return Err(format!("attribute '{}' is not declared", name));
                }
                AttrUse::Group(name) if !self.schema.attribute_groups.contains_key(name) => {
                    return Err(format!("attribute group '{}' is not declared", name));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn simple(&self, st: &SimpleType) -> Compiled<()> {
        match &st.variety {
            Variety::Atomic(r) | Variety::List(r) => self.simple_ref(r),
            Variety::Union(members) => members.iter().try_for_each(|m| self.simple_ref(m)),
        }
    }

    fn simple_ref(&self, r: &SimpleRef) -> Compiled<()> {
        match r {
            SimpleRef::Ref(r) => self.simple_type_ref(r),
            SimpleRef::Inline(st) => self.simple(st),
        }
    }
}
