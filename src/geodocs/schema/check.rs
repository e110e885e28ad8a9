//! Instance validation against a compiled [`Schema`].
//!
//! Content models are matched greedily, which is exact for the deterministic
//! models XML Schema requires (Unique Particle Attribution). Content from
//! imported namespaces is accepted without checking.
//!
//! Simple values are whitespace-normalised as their type prescribes, checked
//! against the base type and then against each facet of the derivation step.

use super::identity;
use super::lexical::{base64_len, check_builtin, compare, digits};
use super::model::*;
use roxmltree::{Document, Node};
use std::cmp::Ordering;

const MAX_DEPTH: usize = 256;

enum Binding<'s> {
    Decl(&'s ElementDecl),
    Skip,
}

struct MatchState<'s> {
    bindings: Vec<Binding<'s>>,
    furthest: usize,
}

impl<'s> MatchState<'s> {
    fn bind(&mut self, pos: usize, binding: Binding<'s>) -> usize {
        self.bindings.push(binding);
        self.furthest = self.furthest.max(pos + 1);
        pos + 1
    }
}

/// An attribute in effect on a complex type, with its use-site overrides.
struct AttrSlot<'s> {
    decl: &'s AttributeDecl,
    required: bool,
    fixed: Option<&'s str>,
}

/// The merged view of a complex type and its derivation bases.
#[derive(Default)]
struct Effective<'s> {
    particles: Vec<&'s Particle>,
    attributes: Vec<AttrSlot<'s>>,
    any_attribute: Vec<&'s NamespaceConstraint>,
    mixed: bool,
    simple_base: Option<&'s TypeRef>,
    simple_content: bool,
    content_facets: Vec<&'s Facets>,
    lax: bool,
}

pub struct Checker<'s> {
    schema: &'s Schema,
}

impl<'s> Checker<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    pub fn check_document(&self, doc: &Document) -> Result<(), String> {
        let root = doc.root_element();
        let name = root.tag_name().name();
        if root.tag_name().namespace() != self.target() {
            return Err(match self.target() {
                Some(target) => format!("root element '{}' is not in namespace '{}'", name, target),
                None => format!("root element '{}' must not be namespace-qualified", name),
            });
        }
        let decl = self
            .schema
            .elements
            .get(name)
            .ok_or_else(|| format!("no declaration for root element '{}'", name))?;
        self.check_decl(root, decl, 0)
    }

    fn target(&self) -> Option<&'s str> {
        self.schema.target_namespace.as_deref()
    }

    fn check_decl(&self, node: Node, decl: &'s ElementDecl, depth: usize) -> Result<(), String> {
        let name = node.tag_name().name();
        if decl.is_abstract {
            return Err(format!("element '{}' is abstract", name));
        }

        if let Some(nil) = node.attribute((XSI_NS, "nil")) {
            if matches!(nil.trim(), "true" | "1") {
                if !decl.nillable {
                    return Err(format!("element '{}' is not nillable", name));
                }
                let has_content = node.children().any(|n| {
                    n.is_element() || (n.is_text() && n.text().is_some_and(|t| !t.trim().is_empty()))
                });
                if has_content {
                    return Err(format!("nil element '{}' must be empty", name));
                }
                return Ok(());
            }
        }

        if let Some(fixed) = &decl.fixed {
            let text = text_only(node)?;
            if text.trim() != fixed.trim() {
                return Err(format!(
                    "element '{}' must have the fixed value '{}'",
                    name, fixed
                ));
            }
        }

        match node.attribute((XSI_NS, "type")) {
            Some(qname) => self.check_xsi_type(node, decl, qname, depth)?,
            None => self.check_element(node, &decl.ty, depth)?,
        }

        identity::check(node, &decl.constraints)
            .map_err(|e| format!("in element '{}': {}", name, e))
    }

    fn check_xsi_type(
        &self,
        node: Node,
        decl: &'s ElementDecl,
        qname: &str,
        depth: usize,
    ) -> Result<(), String> {
        let (prefix, local) = match qname.trim().split_once(':') {
            Some((p, l)) => (Some(p), l),
            None => (None, qname.trim()),
        };
        let name = node.tag_name().name();
        let ty = match node.lookup_namespace_uri(prefix) {
            Some(XS_NS) if local == "anyType" => TypeRef::AnyType,
            Some(XS_NS) => TypeRef::Builtin(
                Builtin::from_local(local)
                    .ok_or_else(|| format!("unknown xsi:type '{}' on element '{}'", qname, name))?,
            ),
            ns if ns == self.target() => TypeRef::Named(local.to_string()),
            _ => return Ok(()),
        };
        if !self.derives_from(&ty, &decl.ty) {
            return Err(format!(
                "xsi:type '{}' on element '{}' does not derive from its declared type",
                qname, name
            ));
        }
        self.check_type_ref(node, &ty, depth)
    }

    /// Whether `ty` is, or derives from, the declared type.
    fn derives_from(&self, ty: &TypeRef, declared: &ElementType) -> bool {
        let wanted = match declared {
            ElementType::Ref(TypeRef::AnyType) => return true,
            ElementType::Ref(r) => r,
            _ => return false,
        };
        let mut current = ty.clone();
        for _ in 0..MAX_DEPTH {
            if &current == wanted {
                return true;
            }
            let TypeRef::Named(name) = &current else {
                return false;
            };
            let next = if let Some(ct) = self.schema.complex_types.get(name) {
                ct.base.clone()
            } else {
                match self.schema.simple_types.get(name).map(|st| &st.variety) {
                    Some(Variety::Atomic(SimpleRef::Ref(base))) => Some(base.clone()),
                    _ => None,
                }
            };
            match next {
                Some(base) => current = base,
                None => return false,
            }
        }
        false
    }

    fn check_element(&self, node: Node, ty: &'s ElementType, depth: usize) -> Result<(), String> {
        if depth > MAX_DEPTH {
            return Err("document is nested too deeply".to_string());
        }
        match ty {
            ElementType::Ref(r) => self.check_type_ref(node, r, depth),
            ElementType::Complex(ct) => self.check_complex(node, ct, depth),
            ElementType::Simple(st) => {
                let text = text_only(node)?;
                self.check_simple(&text, st, 0)
                    .map_err(|e| format!("in element '{}': {}", node.tag_name().name(), e))
            }
        }
    }

    fn check_type_ref(&self, node: Node, r: &TypeRef, depth: usize) -> Result<(), String> {
        match r {
            TypeRef::Named(name) => match self.schema.complex_types.get(name) {
                Some(ct) => self.check_complex(node, ct, depth),
                None => {
                    let text = text_only(node)?;
                    self.check_value(&text, r, 0)
                        .map_err(|e| format!("in element '{}': {}", node.tag_name().name(), e))
                }
            },
            TypeRef::Builtin(b) => {
                let text = text_only(node)?;
                check_builtin(*b, &text)
                    .map_err(|e| format!("in element '{}': {}", node.tag_name().name(), e))
            }
            TypeRef::Foreign | TypeRef::AnyType => Ok(()),
        }
    }

    fn collect(&self, ct: &'s ComplexType, eff: &mut Effective<'s>, depth: usize) {
        if depth > MAX_DEPTH {
            eff.lax = true;
            return;
        }
        let inherited = eff.particles.len();
        match &ct.base {
            Some(base @ TypeRef::Named(name)) => match self.schema.complex_types.get(name) {
                Some(base) => self.collect(base, eff, depth + 1),
                None => eff.simple_base = Some(base),
            },
            Some(base @ TypeRef::Builtin(_)) => eff.simple_base = Some(base),
            Some(TypeRef::Foreign) => eff.lax = true,
            Some(TypeRef::AnyType) | None => {}
        }
        if ct.restriction {
            // A restriction restates the content model and the wildcard.
            if !ct.simple_content {
                eff.particles.truncate(inherited);
            }
            eff.any_attribute.clear();
        }
        if let Some(p) = &ct.particle {
            eff.particles.push(p);
        }
        if let Some(facets) = &ct.content_facets {
            eff.content_facets.push(facets);
        }
        self.expand_attributes(&ct.attributes, eff, 0);
        eff.any_attribute.extend(&ct.any_attribute);
        eff.mixed |= ct.mixed;
        eff.simple_content |= ct.simple_content;
    }

    fn expand_attributes(&self, uses: &'s [AttrUse], eff: &mut Effective<'s>, depth: usize) {
        if depth > MAX_DEPTH {
            return;
        }
        for u in uses {
            let slot = match u {
                AttrUse::Decl(decl) => AttrSlot {
                    decl,
                    required: decl.required,
                    fixed: decl.fixed.as_deref(),
                },
                AttrUse::Ref {
                    name,
                    required,
                    fixed,
                } => match self.schema.attributes.get(name) {
                    Some(decl) => AttrSlot {
                        decl,
                        required: *required,
                        fixed: fixed.as_deref().or(decl.fixed.as_deref()),
                    },
                    None => continue,
                },
                AttrUse::Group(name) => {
                    if let Some((group, any)) = self.schema.attribute_groups.get(name) {
                        self.expand_attributes(group, eff, depth + 1);
                        eff.any_attribute.extend(any);
                    }
                    continue;
                }
                AttrUse::Prohibited(name) => {
                    eff.attributes.retain(|s| s.decl.name != *name);
                    continue;
                }
            };
            eff.attributes
                .retain(|s| s.decl.name != slot.decl.name || s.decl.namespace != slot.decl.namespace);
            eff.attributes.push(slot);
        }
    }

    fn check_complex(&self, node: Node, ct: &'s ComplexType, depth: usize) -> Result<(), String> {
        let name = node.tag_name().name();
        let mut eff = Effective::default();
        self.collect(ct, &mut eff, 0);

        self.check_attributes(node, &eff)?;

        if eff.lax {
            return Ok(());
        }

        if eff.simple_content {
            let text = text_only(node)?;
            self.check_simple_content(&text, &eff)
                .map_err(|e| format!("in element '{}': {}", name, e))?;
            return Ok(());
        }

        if !eff.mixed {
            let stray = node
                .children()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .any(|t| !t.trim().is_empty());
            if stray {
                return Err(format!("text is not allowed in element '{}'", name));
            }
        }

        let kids: Vec<Node> = node.children().filter(|n| n.is_element()).collect();
        let mut state = MatchState {
            bindings: Vec::with_capacity(kids.len()),
            furthest: 0,
        };
        let mut cur = 0;
        for particle in eff.particles.iter().copied() {
            match self.match_occurs(particle, &kids, cur, &mut state) {
                Some(next) => cur = next,
                None => return Err(mismatch(name, &kids, state.furthest)),
            }
        }
        if cur < kids.len() {
            return Err(mismatch(name, &kids, cur));
        }

        for (kid, binding) in kids.iter().zip(state.bindings.iter()) {
            if let Binding::Decl(decl) = *binding {
                self.check_decl(*kid, decl, depth + 1)?;
            }
        }
        Ok(())
    }

    fn check_simple_content(&self, text: &str, eff: &Effective<'s>) -> Result<(), String> {
        let Some(base) = eff.simple_base else {
            return Ok(());
        };
        let value = self.white_space(base, 0).apply(text);
        self.check_value(&value, base, 0)?;
        for facets in &eff.content_facets {
            let value = match facets.white_space {
                Some(ws) => ws.apply(&value).into_owned(),
                None => value.to_string(),
            };
            check_facets(&value, facets, || self.measure(&value, base, 0))?;
        }
        Ok(())
    }

    fn check_attributes(&self, node: Node, eff: &Effective<'s>) -> Result<(), String> {
        let name = node.tag_name().name();
        for slot in eff.attributes.iter().filter(|s| s.required) {
            let present = match slot.decl.namespace.as_deref() {
                Some(ns) => node.attribute((ns, slot.decl.name.as_str())).is_some(),
                None => node.attribute(slot.decl.name.as_str()).is_some(),
            };
            if !present {
                return Err(format!(
                    "missing required attribute '{}' on element '{}'",
                    slot.decl.name, name
                ));
            }
        }
        for attr in node.attributes() {
            let ns = attr.namespace();
            if ns == Some(XSI_NS) {
                continue;
            }
            let slot = eff
                .attributes
                .iter()
                .find(|s| s.decl.name == attr.name() && s.decl.namespace.as_deref() == ns);
            match slot {
                Some(slot) => self.check_attribute(attr.value(), slot).map_err(|e| {
                    format!("attribute '{}' on element '{}': {}", attr.name(), name, e)
                })?,
                None if eff.any_attribute.iter().any(|w| w.admits(ns)) || eff.lax => {}
                // Qualified attributes (xlink:, xml:) belong to other vocabularies.
                None if ns.is_some() && ns != self.target() => {}
                None => {
                    return Err(format!(
                        "unexpected attribute '{}' on element '{}'",
                        attr.name(),
                        name
                    ))
                }
            }
        }
        Ok(())
    }

    fn check_attribute(&self, value: &str, slot: &AttrSlot<'s>) -> Result<(), String> {
        if let Some(ty) = &slot.decl.ty {
            self.check_ref(value, ty, 0)?;
        }
        match slot.fixed {
            Some(fixed) if value.trim() != fixed.trim() => {
                Err(format!("must have the fixed value '{}'", fixed))
            }
            _ => Ok(()),
        }
    }

    fn match_occurs(
        &self,
        particle: &'s Particle,
        kids: &[Node],
        pos: usize,
        state: &mut MatchState<'s>,
    ) -> Option<usize> {
        let occurs = particle.occurs();
        let mut count = 0u32;
        let mut cur = pos;
        loop {
            if occurs.max.is_some_and(|max| count >= max) {
                break;
            }
            let mark = state.bindings.len();
            match self.match_once(particle, kids, cur, state) {
                Some(next) if next > cur => {
                    cur = next;
                    count += 1;
                }
                Some(_) => {
                    // An empty match satisfies every remaining required repetition.
                    count = count.max(occurs.min);
                    break;
                }
                None => {
                    state.bindings.truncate(mark);
                    break;
                }
            }
        }
        (count >= occurs.min).then_some(cur)
    }

    fn match_once(
        &self,
        particle: &'s Particle,
        kids: &[Node],
        pos: usize,
        state: &mut MatchState<'s>,
    ) -> Option<usize> {
        match particle {
            Particle::Element { decl, .. } => {
                let kid = kids.get(pos)?;
                let matches = kid.tag_name().name() == decl.name
                    && kid.tag_name().namespace() == decl.namespace.as_deref();
                matches.then(|| state.bind(pos, Binding::Decl(decl)))
            }
            Particle::ElementRef { name, .. } => {
                let kid = kids.get(pos)?;
                let kid_name = kid.tag_name().name();
                if kid.tag_name().namespace() != self.target()
                    || !self.schema.substitutes_for(name, kid_name)
                {
                    return None;
                }
                let binding = match self.schema.elements.get(kid_name) {
                    Some(decl) => Binding::Decl(decl),
                    None => Binding::Skip,
                };
                Some(state.bind(pos, binding))
            }
            Particle::ForeignElement { name, .. } => {
                let kid = kids.get(pos)?;
                // Members of foreign substitution groups are unknown, so any
                // element outside the target namespace stands in.
                let foreign = kid.tag_name().namespace() != self.target();
                (kid.tag_name().name() == name.as_str() || foreign)
                    .then(|| state.bind(pos, Binding::Skip))
            }
            Particle::Any {
                namespaces,
                process,
                ..
            } => {
                let kid = kids.get(pos)?;
                let ns = kid.tag_name().namespace();
                if !namespaces.admits(ns) {
                    return None;
                }
                let own = ns == self.target();
                let binding = match self.schema.elements.get(kid.tag_name().name()) {
                    _ if *process == ProcessContents::Skip || !own => Binding::Skip,
                    Some(decl) => Binding::Decl(decl),
                    None if *process == ProcessContents::Strict => return None,
                    None => Binding::Skip,
                };
                Some(state.bind(pos, binding))
            }
            Particle::Sequence { items, .. } => {
                let mut cur = pos;
                for item in items {
                    cur = self.match_occurs(item, kids, cur, state)?;
                }
                Some(cur)
            }
            Particle::Choice { items, .. } => {
                let mut empty_ok = false;
                for item in items {
                    let mark = state.bindings.len();
                    match self.match_occurs(item, kids, pos, state) {
                        Some(next) if next > pos => return Some(next),
                        Some(_) => empty_ok = true,
                        None => {}
                    }
                    state.bindings.truncate(mark);
                }
                empty_ok.then_some(pos)
            }
            Particle::All { items, .. } => {
                let mut used = vec![false; items.len()];
                let mut cur = pos;
                'scan: loop {
                    for (i, item) in items.iter().enumerate() {
                        if used[i] {
                            continue;
                        }
                        let mark = state.bindings.len();
                        match self.match_once(item, kids, cur, state) {
                            Some(next) if next > cur => {
                                used[i] = true;
                                cur = next;
                                continue 'scan;
                            }
                            _ => state.bindings.truncate(mark),
                        }
                    }
                    break;
                }
                let complete = items
                    .iter()
                    .zip(&used)
                    .all(|(item, used)| *used || item.occurs().min == 0);
                complete.then_some(cur)
            }
            Particle::Group { name, .. } => {
                let group = self.schema.groups.get(name)?;
                self.match_occurs(group, kids, pos, state)
            }
        }
    }

    fn check_value(&self, value: &str, r: &TypeRef, depth: usize) -> Result<(), String> {
        match r {
            TypeRef::Builtin(b) => check_builtin(*b, value),
            TypeRef::Named(name) => match self.schema.simple_types.get(name) {
                Some(st) => self.check_simple(value, st, depth + 1),
                None => Err(format!("type '{}' is not a simple type", name)),
            },
            TypeRef::Foreign | TypeRef::AnyType => Ok(()),
        }
    }

    fn check_ref(&self, value: &str, r: &SimpleRef, depth: usize) -> Result<(), String> {
        match r {
            SimpleRef::Ref(t) => self.check_value(value, t, depth),
            SimpleRef::Inline(st) => self.check_simple(value, st, depth + 1),
        }
    }

    fn check_simple(&self, value: &str, st: &SimpleType, depth: usize) -> Result<(), String> {
        if depth > MAX_DEPTH {
            return Err("simple type derivation is too deep".to_string());
        }
        match &st.variety {
            Variety::Atomic(base) => {
                let ws = st
                    .facets
                    .white_space
                    .unwrap_or_else(|| self.simple_white_space(base, depth));
                let value = ws.apply(value);
                self.check_ref(&value, base, depth)?;
                check_facets(&value, &st.facets, || self.measure_ref(&value, base, depth))
            }
            Variety::List(item) => {
                let value = WhiteSpace::Collapse.apply(value);
                let items: Vec<&str> = value.split_whitespace().collect();
                for item_value in &items {
                    self.check_ref(item_value, item, depth)?;
                }
                check_facets(&value, &st.facets, || items.len())
            }
            Variety::Union(members) => {
                let accepted = members
                    .iter()
                    .any(|m| self.check_ref(value, m, depth).is_ok());
                if !accepted {
                    return Err(format!(
                        "'{}' is not valid for any member of the union",
                        value.trim()
                    ));
                }
                check_facets(value.trim(), &st.facets, || value.trim().chars().count())
            }
        }
    }

    fn white_space(&self, r: &TypeRef, depth: usize) -> WhiteSpace {
        match r {
            TypeRef::Builtin(b) => b.white_space(),
            TypeRef::Named(name) if depth <= MAX_DEPTH => match self.schema.simple_types.get(name) {
                Some(st) => self.type_white_space(st, depth + 1),
                None => WhiteSpace::Preserve,
            },
            _ => WhiteSpace::Preserve,
        }
    }

    fn simple_white_space(&self, r: &SimpleRef, depth: usize) -> WhiteSpace {
        match r {
            SimpleRef::Ref(t) => self.white_space(t, depth),
            SimpleRef::Inline(st) => self.type_white_space(st, depth + 1),
        }
    }

    fn type_white_space(&self, st: &SimpleType, depth: usize) -> WhiteSpace {
        match (&st.facets.white_space, &st.variety) {
            (Some(ws), _) => *ws,
            (None, Variety::Atomic(base)) => self.simple_white_space(base, depth),
            (None, _) => WhiteSpace::Collapse,
        }
    }

    /// Length of `value` in the units of the `length` facets of type `r`.
    fn measure(&self, value: &str, r: &TypeRef, depth: usize) -> usize {
        match r {
            TypeRef::Builtin(Builtin::HexBinary) => value.len() / 2,
            TypeRef::Builtin(Builtin::Base64Binary) => base64_len(value).unwrap_or(0),
            TypeRef::Named(name) if depth <= MAX_DEPTH => match self.schema.simple_types.get(name) {
                Some(st) => self.measure_type(value, st, depth + 1),
                None => value.chars().count(),
            },
            _ => value.chars().count(),
        }
    }

    fn measure_ref(&self, value: &str, r: &SimpleRef, depth: usize) -> usize {
        match r {
            SimpleRef::Ref(t) => self.measure(value, t, depth),
            SimpleRef::Inline(st) => self.measure_type(value, st, depth + 1),
        }
    }

    fn measure_type(&self, value: &str, st: &SimpleType, depth: usize) -> usize {
        match &st.variety {
            Variety::Atomic(base) => self.measure_ref(value, base, depth),
            Variety::List(_) => value.split_whitespace().count(),
            Variety::Union(_) => value.chars().count(),
        }
    }
}

fn check_facets(value: &str, f: &Facets, length: impl FnOnce() -> usize) -> Result<(), String> {
    if !f.enumeration.is_empty() && !f.enumeration.iter().any(|e| e == value) {
        return Err(format!(
            "'{}' is not one of [{}]",
            value,
            f.enumeration.join(", ")
        ));
    }
    if let Some(pattern) = &f.pattern {
        if !pattern.regex.is_match(value) {
            return Err(format!(
                "'{}' does not match pattern '{}'",
                value, pattern.source
            ));
        }
    }

    if f.length.is_some() || f.min_length.is_some() || f.max_length.is_some() {
        let n = length();
        if f.length.is_some_and(|l| n != l) {
            return Err(format!(
                "'{}' has length {}, expected {}",
                value,
                n,
                f.length.unwrap_or_default()
            ));
        }
        if let Some(min) = f.min_length.filter(|min| n < *min) {
            return Err(format!("'{}' is shorter than {}", value, min));
        }
        if let Some(max) = f.max_length.filter(|max| n > *max) {
            return Err(format!("'{}' is longer than {}", value, max));
        }
    }

    let bounds = [
        (&f.min_inclusive, Ordering::Less, "less than"),
        (&f.max_inclusive, Ordering::Greater, "greater than"),
    ];
    for (bound, forbidden, relation) in bounds {
        if let Some(bound) = bound {
            if compare(value, bound)? == forbidden {
                return Err(format!("'{}' is {} {}", value, relation, bound));
            }
        }
    }
    let bounds = [
        (&f.min_exclusive, Ordering::Greater, "greater than"),
        (&f.max_exclusive, Ordering::Less, "less than"),
    ];
    for (bound, required, relation) in bounds {
        if let Some(bound) = bound {
            if compare(value, bound)? != required {
                return Err(format!("'{}' must be {} {}", value, relation, bound));
            }
        }
    }

    if f.total_digits.is_some() || f.fraction_digits.is_some() {
        let (total, fraction) =
            digits(value).ok_or_else(|| format!("'{}' is not a decimal value", value))?;
        if let Some(max) = f.total_digits.filter(|max| total > *max) {
            return Err(format!("'{}' has more than {} digits", value, max));
        }
        if let Some(max) = f.fraction_digits.filter(|max| fraction > *max) {
            return Err(format!("'{}' has more than {} fraction digits", value, max));
        }
    }
    Ok(())
}

fn mismatch(parent: &str, kids: &[Node], at: usize) -> String {
    match kids.get(at) {
        Some(kid) => format!(
            "unexpected element '{}' in '{}'",
            kid.tag_name().name(),
            parent
        ),
        None => format!("element '{}' is missing required content", parent),
    }
}

fn text_only(node: Node) -> Result<String, String> {
    if let Some(child) = node.children().find(|n| n.is_element()) {
        return Err(format!(
            "element '{}' must not contain element '{}'",
            node.tag_name().name(),
            child.tag_name().name()
        ));
    }
    Ok(node
        .children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::compile::SchemaCompiler;

    fn checker_result(xsd: &str, xml: &str) -> Result<(), String> {
        let loader = |location: &str| -> crate::error::Result<String> {
            panic!("unexpected include of {}", location)
        };
        let schema = SchemaCompiler::new(&loader, |_, rel| rel.to_string())
            .compile("mem://test.xsd", xsd)
            .unwrap();
        let doc = Document::parse(xml).unwrap();
        Checker::new(&schema).check_document(&doc)
    }

    const FACETS_XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
        <xs:element name="Style">
            <xs:complexType>
                <xs:sequence>
                    <xs:element name="Code" minOccurs="0">
                        <xs:simpleType>
                            <xs:restriction base="xs:string">
                                <xs:pattern value="[A-Z]{3}"/>
                                <xs:maxLength value="3"/>
                            </xs:restriction>
                        </xs:simpleType>
                    </xs:element>
                    <xs:element name="Opacity" minOccurs="0">
                        <xs:simpleType>
                            <xs:restriction base="xs:decimal">
                                <xs:minInclusive value="0"/>
                                <xs:maxInclusive value="1"/>
                                <xs:fractionDigits value="2"/>
                            </xs:restriction>
                        </xs:simpleType>
                    </xs:element>
                    <xs:element name="Size" type="Size" minOccurs="0"/>
                    <xs:element name="Dash" type="Dash" minOccurs="0"/>
                    <xs:element name="Width" type="SizeOrAuto" minOccurs="0"/>
                    <xs:element name="Label" type="Label" minOccurs="0"/>
                </xs:sequence>
                <xs:attribute name="version" type="xs:string" fixed="1.0.0"/>
            </xs:complexType>
        </xs:element>
        <xs:simpleType name="Size">
            <xs:restriction base="xs:int">
                <xs:minExclusive value="0"/>
                <xs:maxExclusive value="100"/>
            </xs:restriction>
        </xs:simpleType>
        <xs:simpleType name="Dash">
            <xs:restriction>
                <xs:simpleType><xs:list itemType="xs:positiveInteger"/></xs:simpleType>
                <xs:length value="2"/>
            </xs:restriction>
        </xs:simpleType>
        <xs:simpleType name="SizeOrAuto">
            <xs:union memberTypes="Size">
                <xs:simpleType>
                    <xs:restriction base="xs:token"><xs:enumeration value="auto"/></xs:restriction>
                </xs:simpleType>
            </xs:union>
        </xs:simpleType>
        <xs:complexType name="Label">
            <xs:simpleContent>
                <xs:extension base="xs:string">
                    <xs:attribute name="lang" type="xs:language"/>
                </xs:extension>
            </xs:simpleContent>
        </xs:complexType>
    </xs:schema>"#;

    fn style(body: &str) -> Result<(), String> {
        checker_result(FACETS_XSD, &format!("<Style>{}</Style>", body))
    }

    #[test]
    fn pattern_and_length_facets() {
        style("<Code>EPS</Code>").unwrap();
        let err = style("<Code>not-a-code-at-all</Code>").unwrap_err();
        assert!(err.contains("does not match pattern"), "{}", err);
        assert!(style("<Code>eps</Code>").is_err());
    }

    #[test]
    fn range_and_digit_facets() {
        style("<Opacity>0.75</Opacity>").unwrap();
        style("<Opacity> 1 </Opacity>").unwrap();
        let err = style("<Opacity>42</Opacity>").unwrap_err();
        assert!(err.contains("greater than 1"), "{}", err);
        assert!(style("<Opacity>-0.1</Opacity>").is_err());
        assert!(style("<Opacity>0.125</Opacity>").is_err());

        style("<Size>99</Size>").unwrap();
        assert!(style("<Size>0</Size>").is_err());
        assert!(style("<Size>100</Size>").is_err());
    }

    #[test]
    fn list_and_union_types() {
        style("<Dash>4 2</Dash>").unwrap();
        assert!(style("<Dash>4</Dash>").is_err());
        assert!(style("<Dash>4 -2</Dash>").is_err());

        style("<Width>auto</Width>").unwrap();
        style("<Width>12</Width>").unwrap();
        assert!(style("<Width>wide</Width>").is_err());
        assert!(style("<Width>250</Width>").is_err());
    }

    #[test]
    fn simple_content_and_fixed_attributes() {
        style(r#"<Label lang="fr">Parcelles</Label>"#).unwrap();
        assert!(style(r#"<Label lang="not a language">x</Label>"#).is_err());
        assert!(style("<Label><b>bold</b></Label>").is_err());

        checker_result(FACETS_XSD, r#"<Style version="1.0.0"/>"#).unwrap();
        assert!(checker_result(FACETS_XSD, r#"<Style version="2.0"/>"#).is_err());
    }

    const NIL_XSD: &str = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
        <xs:element name="Doc">
            <xs:complexType>
                <xs:sequence>
                    <xs:element name="Shape" type="Shape" maxOccurs="unbounded"/>
                    <xs:element name="Note" type="xs:string" nillable="true" minOccurs="0"/>
                </xs:sequence>
            </xs:complexType>
        </xs:element>
        <xs:complexType name="Shape">
            <xs:attribute name="id" type="xs:string"/>
        </xs:complexType>
        <xs:complexType name="Circle">
            <xs:complexContent>
                <xs:extension base="Shape">
                    <xs:attribute name="radius" type="xs:double" use="required"/>
                </xs:extension>
            </xs:complexContent>
        </xs:complexType>
        <xs:complexType name="Other">
            <xs:attribute name="radius" type="xs:double"/>
        </xs:complexType>
    </xs:schema>"#;

    #[test]
    fn xsi_type_and_nil() {
        let doc = |body: &str| {
            format!(
                r#"<Doc xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">{}</Doc>"#,
                body
            )
        };
        checker_result(NIL_XSD, &doc(r#"<Shape xsi:type="Circle" radius="2"/>"#)).unwrap();
        assert!(checker_result(NIL_XSD, &doc(r#"<Shape xsi:type="Circle"/>"#)).is_err());
        assert!(checker_result(NIL_XSD, &doc(r#"<Shape radius="2"/>"#)).is_err());
        let err = checker_result(NIL_XSD, &doc(r#"<Shape xsi:type="Other" radius="2"/>"#))
            .unwrap_err();
        assert!(err.contains("does not derive"), "{}", err);

        checker_result(NIL_XSD, &doc(r#"<Shape/><Note xsi:nil="true"/>"#)).unwrap();
        assert!(checker_result(NIL_XSD, &doc(r#"<Shape/><Note xsi:nil="true">x</Note>"#)).is_err());
    }

    #[test]
    fn identity_constraints_are_enforced() {
        let xsd = r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
            <xs:element name="Map">
                <xs:complexType><xs:sequence>
                    <xs:element name="Layer" maxOccurs="unbounded">
                        <xs:complexType><xs:attribute name="id" type="xs:string"/></xs:complexType>
                    </xs:element>
                    <xs:element name="Show" minOccurs="0" maxOccurs="unbounded">
                        <xs:complexType><xs:attribute name="layer" type="xs:string"/></xs:complexType>
                    </xs:element>
                </xs:sequence></xs:complexType>
                <xs:key name="layerId"><xs:selector xpath="Layer"/><xs:field xpath="@id"/></xs:key>
                <xs:keyref name="shown" refer="layerId">
                    <xs:selector xpath="Show"/><xs:field xpath="@layer"/>
                </xs:keyref>
            </xs:element>
        </xs:schema>"#;
        checker_result(xsd, r#"<Map><Layer id="a"/><Layer id="b"/><Show layer="b"/></Map>"#).unwrap();
        let err = checker_result(xsd, r#"<Map><Layer id="a"/><Layer id="a"/></Map>"#).unwrap_err();
        assert!(err.contains("duplicate value"), "{}", err);
        assert!(checker_result(xsd, r#"<Map><Layer/></Map>"#).is_err());
        assert!(checker_result(xsd, r#"<Map><Layer id="a"/><Show layer="z"/></Map>"#).is_err());
    }

    #[test]
    fn strict_wildcards_need_declarations() {
        let xsd = r###"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
                xmlns:t="urn:t" targetNamespace="urn:t" elementFormDefault="qualified">
            <xs:element name="Box">
                <xs:complexType><xs:sequence>
                    <xs:any namespace="##targetNamespace" maxOccurs="unbounded"/>
                </xs:sequence></xs:complexType>
            </xs:element>
            <xs:element name="Count" type="xs:int"/>
        </xs:schema>"###;
        checker_result(xsd, r#"<Box xmlns="urn:t"><Count>3</Count></Box>"#).unwrap();
        assert!(checker_result(xsd, r#"<Box xmlns="urn:t"><Count>three</Count></Box>"#).is_err());
        assert!(checker_result(xsd, r#"<Box xmlns="urn:t"><Other/></Box>"#).is_err());
        assert!(checker_result(xsd, r#"<Box xmlns="urn:t"><o:Other xmlns:o="urn:o"/></Box>"#).is_err());
    }
}
