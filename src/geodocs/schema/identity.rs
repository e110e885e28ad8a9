//! `xs:unique`, `xs:key` and `xs:keyref`.
//!
//! Selectors and fields use the XPath subset XML Schema allows: child steps of
//! name tests, `.` and `*`, an optional leading `.//`, `|` alternatives and,
//! for fields, a final `@attribute` step. Name tests match by local name.

use super::model::*;
use roxmltree::{Node, NodeId};
use std::collections::{HashMap, HashSet};

type Compiled<T> = std::result::Result<T, String>;

pub fn parse_constraint(node: Node) -> Compiled<IdentityConstraint> {
    let kind_name = node.tag_name().name();
    let name = node
        .attribute("name")
        .ok_or_else(|| format!("xs:{} without a name", kind_name))?;
    let kind = match kind_name {
        "unique" => ConstraintKind::Unique,
        "key" => ConstraintKind::Key,
        "keyref" => ConstraintKind::KeyRef {
            refer: node
                .attribute("refer")
                .map(local_name)
                .ok_or_else(|| format!("keyref '{}' has no refer", name))?
                .to_string(),
        },
        other => return Err(format!("'xs:{}' is not an identity constraint", other)),
    };

    let mut selector = None;
    let mut fields = Vec::new();
    for child in node
        .children()
        .filter(|n| n.is_element() && n.tag_name().namespace() == Some(XS_NS))
    {
        let xpath = || {
            child
                .attribute("xpath")
                .ok_or_else(|| format!("'{}' has a selector or field without xpath", name))
        };
        match child.tag_name().name() {
            "selector" => {
                selector = Some(
                    xpath()?
                        .split('|')
                        .map(step_path)
                        .collect::<Compiled<Vec<_>>>()?,
                )
            }
            "field" => fields.push(
                xpath()?
                    .split('|')
                    .map(field_path)
                    .collect::<Compiled<Vec<_>>>()?,
            ),
            "annotation" => {}
            other => return Err(format!("unexpected 'xs:{}' in constraint '{}'", other, name)),
        }
    }

    let selector = selector.ok_or_else(|| format!("constraint '{}' has no selector", name))?;
    if fields.is_empty() {
        return Err(format!("constraint '{}' has no field", name));
    }
    Ok(IdentityConstraint {
        name: name.to_string(),
        kind,
        selector,
        fields,
    })
}

/// Every keyref must refer to a key or unique constraint of the same element
/// with as many fields.
pub fn check_references(constraints: &[IdentityConstraint]) -> Compiled<()> {
    for c in constraints {
        let ConstraintKind::KeyRef { refer } = &c.kind else {
            continue;
        };
        let target = constraints
            .iter()
            .find(|k| &k.name == refer && !matches!(k.kind, ConstraintKind::KeyRef { .. }))
            .ok_or_else(|| {
                format!(
                    "keyref '{}' refers to '{}', which is not a key of the same element",
                    c.name, refer
                )
            })?;
        if target.fields.len() != c.fields.len() {
            return Err(format!(
                "keyref '{}' and '{}' have different field counts",
                c.name, refer
            ));
        }
    }
    Ok(())
}

fn step_path(src: &str) -> Compiled<StepPath> {
    let src = src.trim();
    let (descendants, rest) = match src.strip_prefix(".//") {
        Some(rest) => (true, rest),
        None => (false, src),
    };
    if rest.is_empty() {
        return Err(format!("unsupported xpath '{}'", src));
    }
    let steps = rest
        .split('/')
        .map(|step| name_test(step.trim(), src))
        .collect::<Compiled<Vec<_>>>()?;
    Ok(StepPath { descendants, steps })
}

fn field_path(src: &str) -> Compiled<FieldPath> {
    let trimmed = src.trim();
    let (head, last) = match trimmed.rsplit_once('/') {
        Some((head, last)) => (Some(head), last.trim()),
        None => (None, trimmed),
    };
    let attr = last
        .strip_prefix('@')
        .or_else(|| last.strip_prefix("attribute::"));
    let Some(attr) = attr else {
        return Ok(FieldPath {
            path: step_path(trimmed)?,
            attribute: None,
        });
    };

    let attribute = Some(name_test(attr.trim(), trimmed)?);
    let path = match head {
        None => StepPath {
            descendants: false,
            steps: Vec::new(),
        },
        // `.//@a`
        Some("./") if trimmed.starts_with(".//") => StepPath {
            descendants: true,
            steps: Vec::new(),
        },
        Some(head) => step_path(head)?,
    };
    Ok(FieldPath { path, attribute })
}

fn name_test(step: &str, src: &str) -> Compiled<NameTest> {
    let step = step.strip_prefix("child::").unwrap_or(step);
    match step {
        "." => Ok(NameTest::Current),
        "*" => Ok(NameTest::Any),
        _ if step.ends_with(":*") => Ok(NameTest::Any),
        _ => {
            let local = local_name(step);
            let valid = local.starts_with(|c: char| c.is_alphabetic() || c == '_')
                && step.matches(':').count() <= 1
                && step
                    .chars()
                    .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | ':'));
            if valid {
                Ok(NameTest::Local(local.to_string()))
            } else {
                Err(format!("unsupported xpath '{}'", src))
            }
        }
    }
}

fn local_name(qname: &str) -> &str {
    qname.rsplit(':').next().unwrap_or(qname)
}

fn matches(test: &NameTest, name: &str) -> bool {
    match test {
        NameTest::Current | NameTest::Any => true,
        NameTest::Local(local) => local == name,
    }
}

fn select<'a, 'i>(
    scope: Node<'a, 'i>,
    path: &StepPath,
    seen: &mut HashSet<NodeId>,
    out: &mut Vec<Node<'a, 'i>>,
) {
    let mut current: Vec<Node> = if path.descendants {
        scope.descendants().filter(|n| n.is_element()).collect()
    } else {
        vec![scope]
    };
    for step in &path.steps {
        let mut next = Vec::new();
        let mut step_seen = HashSet::new();
        for node in &current {
            if *step == NameTest::Current {
                if step_seen.insert(node.id()) {
                    next.push(*node);
                }
                continue;
            }
            for child in node
                .children()
                .filter(|c| c.is_element() && matches(step, c.tag_name().name()))
            {
                if step_seen.insert(child.id()) {
                    next.push(child);
                }
            }
        }
        current = next;
    }
    for node in current {
        if seen.insert(node.id()) {
            out.push(node);
        }
    }
}

fn select_all<'a, 'i>(scope: Node<'a, 'i>, alternatives: &[StepPath]) -> Vec<Node<'a, 'i>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for path in alternatives {
        select(scope, path, &mut seen, &mut out);
    }
    out
}

fn collapse(value: &str) -> String {
    value.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

fn field_value(target: Node, alternatives: &[FieldPath]) -> Result<Option<String>, String> {
    let mut values = Vec::new();
    for alt in alternatives {
        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        select(target, &alt.path, &mut seen, &mut nodes);
        for node in nodes {
            match &alt.attribute {
                Some(test) => values.extend(
                    node.attributes()
                        .filter(|a| matches(test, a.name()))
                        .map(|a| collapse(a.value())),
                ),
                None => {
                    if let Some(child) = node.children().find(|n| n.is_element()) {
                        return Err(format!(
                            "identity field selects element '{}', which contains element '{}'",
                            node.tag_name().name(),
                            child.tag_name().name()
                        ));
                    }
                    let text: String = node
                        .children()
                        .filter(|n| n.is_text())
                        .filter_map(|n| n.text())
                        .collect();
                    values.push(collapse(&text));
                }
            }
        }
    }
    match values.len() {
        0 => Ok(None),
        1 => Ok(values.pop()),
        _ => Err(format!(
            "identity field selects {} values under element '{}'",
            values.len(),
            target.tag_name().name()
        )),
    }
}

/// Field tuples of the nodes `c` selects under `scope`; a `None` entry marks a missing field.
fn tuples<'a, 'i>(
    scope: Node<'a, 'i>,
    c: &IdentityConstraint,
) -> Result<Vec<(Node<'a, 'i>, Option<Vec<String>>)>, String> {
    select_all(scope, &c.selector)
        .into_iter()
        .map(|target| {
            let values = c
                .fields
                .iter()
                .map(|f| field_value(target, f))
                .collect::<Result<Vec<_>, _>>()?;
            Ok((target, values.into_iter().collect::<Option<Vec<_>>>()))
        })
        .collect()
}

/// Check `constraints`, declared on the element `scope` is an instance of.
pub fn check(scope: Node, constraints: &[IdentityConstraint]) -> Result<(), String> {
    let mut tables: HashMap<&str, HashSet<Vec<String>>> = HashMap::new();

    for c in constraints {
        let label = match c.kind {
            ConstraintKind::Unique => "unique constraint",
            ConstraintKind::Key => "key",
            ConstraintKind::KeyRef { .. } => continue,
        };
        let mut table = HashSet::new();
        for (target, tuple) in tuples(scope, c)? {
            let Some(tuple) = tuple else {
                if c.kind == ConstraintKind::Key {
                    return Err(format!(
                        "element '{}' is missing a field of key '{}'",
                        target.tag_name().name(),
                        c.name
                    ));
                }
                continue;
            };
            if table.contains(&tuple) {
                return Err(format!(
                    "duplicate value [{}] for {} '{}'",
                    tuple.join(", "),
                    label,
                    c.name
                ));
            }
            table.insert(tuple);
        }
        tables.insert(c.name.as_str(), table);
    }

    for c in constraints {
        let ConstraintKind::KeyRef { refer } = &c.kind else {
            continue;
        };
        let Some(table) = tables.get(refer.as_str()) else {
            return Err(format!("keyref '{}' refers to unknown key '{}'", c.name, refer));
        };
        for tuple in tuples(scope, c)?.into_iter().filter_map(|(_, t)| t) {
            if !table.contains(&tuple) {
                return Err(format!(
                    "value [{}] of keyref '{}' does not match any '{}'",
                    tuple.join(", "),
                    c.name,
                    refer
                ));
            }
        }
    }
    Ok(())
}
