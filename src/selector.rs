use crate::dom::{Dom, NodeId};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum SelectorAttrCondition {
    Exists(String),
    Equals(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct SelectorStep {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<SelectorAttrCondition>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectorCombinator {
    Descendant,
    Child,
}

/// One compound step plus how it relates to the step before it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectorPart {
    step: SelectorStep,
    combinator: Option<SelectorCombinator>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Selector {
    groups: Vec<Vec<SelectorPart>>,
}

impl Selector {
    pub(crate) fn parse(selector: &str) -> Result<Self> {
        let mut groups = Vec::new();
        for group in split_selector_groups(selector)? {
            groups.push(parse_selector_chain(selector, &group)?);
        }
        if groups.is_empty() {
            return Err(Error::UnsupportedSelector(selector.to_string()));
        }
        Ok(Self { groups })
    }

    pub(crate) fn matches(&self, dom: &Dom, node: NodeId) -> bool {
        self.groups
            .iter()
            .any(|chain| match_chain(dom, node, chain, chain.len() - 1))
    }
}

fn split_selector_groups(selector: &str) -> Result<Vec<String>> {
    let mut groups = Vec::new();
    let mut current = String::new();
    let mut bracket_depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in selector.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => {
                quote = None;
                current.push(ch);
            }
            (Some(_), _) => current.push(ch),
            (None, '\'' | '"') if bracket_depth > 0 => {
                quote = Some(ch);
                current.push(ch);
            }
            (None, '[') => {
                bracket_depth += 1;
                current.push(ch);
            }
            (None, ']') => {
                bracket_depth = bracket_depth
                    .checked_sub(1)
                    .ok_or_else(|| Error::UnsupportedSelector(selector.to_string()))?;
                current.push(ch);
            }
            (None, ',') if bracket_depth == 0 => {
                let trimmed = current.trim();
                if trimmed.is_empty() {
                    return Err(Error::UnsupportedSelector(selector.to_string()));
                }
                groups.push(trimmed.to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }

    if quote.is_some() || bracket_depth != 0 {
        return Err(Error::UnsupportedSelector(selector.to_string()));
    }
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        groups.push(trimmed.to_string());
    } else if !groups.is_empty() {
        return Err(Error::UnsupportedSelector(selector.to_string()));
    }
    Ok(groups)
}

fn tokenize_selector(selector: &str, group: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_brackets = false;

    for ch in group.chars() {
        if in_brackets {
            current.push(ch);
            if ch == ']' {
                in_brackets = false;
            }
            continue;
        }
        match ch {
            '[' => {
                in_brackets = true;
                current.push(ch);
            }
            '>' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(">".into());
            }
            '+' | '~' | ':' | '(' | ')' => {
                return Err(Error::UnsupportedSelector(selector.to_string()));
            }
            c if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

fn parse_selector_chain(selector: &str, group: &str) -> Result<Vec<SelectorPart>> {
    let mut parts = Vec::new();
    let mut pending_child = false;

    for token in tokenize_selector(selector, group)? {
        if token == ">" {
            if parts.is_empty() || pending_child {
                return Err(Error::UnsupportedSelector(selector.to_string()));
            }
            pending_child = true;
            continue;
        }

        let combinator = if parts.is_empty() {
            None
        } else if pending_child {
            Some(SelectorCombinator::Child)
        } else {
            Some(SelectorCombinator::Descendant)
        };
        pending_child = false;
        parts.push(SelectorPart {
            step: parse_selector_step(selector, &token)?,
            combinator,
        });
    }

    if parts.is_empty() || pending_child {
        return Err(Error::UnsupportedSelector(selector.to_string()));
    }
    Ok(parts)
}

fn parse_selector_step(selector: &str, part: &str) -> Result<SelectorStep> {
    let unsupported = || Error::UnsupportedSelector(selector.to_string());
    let mut step = SelectorStep::default();
    let bytes = part.as_bytes();
    let mut i = 0usize;

    if bytes.first() == Some(&b'*') {
        i = 1;
    } else if let Some((tag, next)) = parse_selector_ident(part, 0) {
        step.tag = Some(tag.to_ascii_lowercase());
        i = next;
    }

    while i < bytes.len() {
        match bytes[i] {
            b'#' => {
                let (id, next) = parse_selector_ident(part, i + 1).ok_or_else(unsupported)?;
                step.id = Some(id);
                i = next;
            }
            b'.' => {
                let (class, next) = parse_selector_ident(part, i + 1).ok_or_else(unsupported)?;
                step.classes.push(class);
                i = next;
            }
            b'[' => {
                let close = part[i..].find(']').map(|pos| pos + i).ok_or_else(unsupported)?;
                step.attrs
                    .push(parse_selector_attr_condition(&part[i + 1..close]).ok_or_else(unsupported)?);
                i = close + 1;
            }
            _ => return Err(unsupported()),
        }
    }

    Ok(step)
}

fn parse_selector_ident(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let mut end = start;
    while end < bytes.len() && is_selector_ident_char(bytes[end]) {
        end += 1;
    }
    (end > start).then(|| (src[start..end].to_string(), end))
}

fn is_selector_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b >= 0x80
}

fn parse_selector_attr_condition(body: &str) -> Option<SelectorAttrCondition> {
    let Some((name, value)) = body.split_once('=') else {
        let name = body.trim();
        return (!name.is_empty()).then(|| SelectorAttrCondition::Exists(name.to_ascii_lowercase()));
    };
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    Some(SelectorAttrCondition::Equals(
        name.to_ascii_lowercase(),
        value.to_string(),
    ))
}

fn step_matches(dom: &Dom, node: NodeId, step: &SelectorStep) -> bool {
    let Some(tag) = dom.tag_name(node) else {
        return false;
    };
    if step.tag.as_deref().is_some_and(|expected| expected != tag) {
        return false;
    }
    if let Some(id) = &step.id {
        if dom.attr(node, "id").as_deref() != Some(id.as_str()) {
            return false;
        }
    }
    if !step.classes.is_empty() {
        let class_attr = dom.attr(node, "class").unwrap_or_default();
        if !step
            .classes
            .iter()
            .all(|class| class_attr.split_whitespace().any(|c| c == class))
        {
            return false;
        }
    }
    step.attrs.iter().all(|condition| match condition {
        SelectorAttrCondition::Exists(name) => dom.attr(node, name).is_some(),
        SelectorAttrCondition::Equals(name, value) => {
            dom.attr(node, name).as_deref() == Some(value.as_str())
        }
    })
}

fn match_chain(dom: &Dom, node: NodeId, chain: &[SelectorPart], idx: usize) -> bool {
    if !step_matches(dom, node, &chain[idx].step) {
        return false;
    }
    if idx == 0 {
        return true;
    }
    match chain[idx].combinator {
        Some(SelectorCombinator::Child) => dom
            .parent(node)
            .is_some_and(|parent| match_chain(dom, parent, chain, idx - 1)),
        Some(SelectorCombinator::Descendant) | None => {
            let mut cursor = dom.parent(node);
            while let Some(ancestor) = cursor {
                if match_chain(dom, ancestor, chain, idx - 1) {
                    return true;
                }
                cursor = dom.parent(ancestor);
            }
            false
        }
    }
}
