use std::collections::BTreeMap;

use crate::dom::Dom;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseMode {
    /// Truncated markup is an `HtmlParse` error.
    Document,
    /// Truncated markup is recovered: a comment or raw-text element runs to
    /// the end of input, an unfinished tag is dropped and a bare `</` is text.
    Fragment,
}

/// Parses a document or fragment. Unclosed elements are closed at the end of
/// input; stray end tags close up to the nearest matching open element.
pub(crate) fn parse_html(html: &str) -> Result<Dom> {
    parse(html, ParseMode::Document)
}

/// Parses content assigned through an `innerHTML`-style setter, which never
/// rejects markup.
pub(crate) fn parse_fragment(html: &str) -> Result<Dom> {
    parse(html, ParseMode::Fragment)
}

fn parse(html: &str, mode: ParseMode) -> Result<Dom> {
    let mut dom = Dom::new();
    let lenient = mode == ParseMode::Fragment;

    let mut stack = vec![dom.root];
    let bytes = html.as_bytes();
    let mut i = 0usize;

    while i < bytes.len() {
        if starts_with_at(bytes, i, b"<!--") {
            match find_subslice(bytes, i + 4, b"-->") {
                Some(end) => i = end + 3,
                None if lenient => break,
                None => return Err(Error::HtmlParse("unclosed HTML comment".into())),
            }
            continue;
        }

        if starts_with_at(bytes, i, b"<!") {
            match find_subslice(bytes, i, b">") {
                Some(end) => i = end + 1,
                None if lenient => break,
                None => return Err(Error::HtmlParse("unclosed declaration".into())),
            }
            continue;
        }

        if bytes[i] == b'<' && bytes.get(i + 1).is_some_and(|b| b.is_ascii_alphabetic()) {
            let (tag, attrs, self_closing, next) = match parse_start_tag(html, i, mode) {
                Ok(parsed) => parsed,
                Err(_) if lenient => break,
                Err(err) => return Err(err),
            };
            i = next;

            let parent = *stack
                .last()
                .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
            let node = dom.create_element(Some(parent), &tag, attrs);

            if is_raw_text_tag(&tag) {
                let close = find_case_insensitive_end_tag(bytes, i, tag.as_bytes());
                let body_end = match close {
                    Some(close) => close,
                    None if lenient => bytes.len(),
                    None => return Err(Error::HtmlParse(format!("unclosed <{tag}>"))),
                };
                if let Some(body) = html.get(i..body_end) {
                    if !body.is_empty() {
                        let text = if tag == "textarea" {
                            decode_entities(body)
                        } else {
                            body.to_string()
                        };
                        dom.create_text(node, text);
                    }
                }
                i = match close {
                    None => bytes.len(),
                    Some(close) => match parse_end_tag(html, close) {
                        Ok((_, after_end)) => after_end,
                        Err(_) if lenient => bytes.len(),
                        Err(err) => return Err(err),
                    },
                };
                continue;
            }

            if !self_closing && !is_void_tag(&tag) {
                stack.push(node);
            }
            continue;
        }

        if starts_with_at(bytes, i, b"</") {
            let (tag, next) = match parse_end_tag(html, i) {
                Ok(parsed) => parsed,
                Err(_) if lenient => {
                    if i + 2 == bytes.len() {
                        let parent = *stack
                            .last()
                            .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
                        dom.create_text(parent, "</".into());
                    }
                    break;
                }
                Err(err) => return Err(err),
            };
            i = next;

            let open = stack
                .iter()
                .rposition(|node| dom.tag_name(*node) == Some(tag.as_str()));
            if let Some(pos) = open {
                stack.truncate(pos.max(1));
            }
            continue;
        }

        let text_start = i;
        i += 1;
        while i < bytes.len() && bytes[i] != b'<' {
            i += 1;
        }

        if let Some(text) = html.get(text_start..i) {
            let parent = *stack
                .last()
                .ok_or_else(|| Error::HtmlParse("missing parent element".into()))?;
            dom.create_text(parent, decode_entities(text));
        }
    }

    dom.rebuild_id_index();
    dom.initialize_form_control_values();
    Ok(dom)
}

fn parse_start_tag(
    html: &str,
    at: usize,
    mode: ParseMode,
) -> Result<(String, BTreeMap<String, String>, bool, usize)> {
    let bytes = html.as_bytes();
    let mut i = at + 1;

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }

    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid tag name".into()))?
        .to_ascii_lowercase();

    let mut attrs = BTreeMap::new();
    let mut self_closing = false;

    loop {
        skip_ws(bytes, &mut i);
        if i >= bytes.len() {
            return Err(Error::HtmlParse(format!("unclosed start tag <{tag}")));
        }

        if bytes[i] == b'>' {
            i += 1;
            break;
        }

        if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'>') {
            self_closing = true;
            i += 2;
            break;
        }

        let name_start = i;
        while i < bytes.len() && is_attr_name_char(bytes[i]) {
            i += 1;
        }

        let name = html
            .get(name_start..i)
            .ok_or_else(|| Error::HtmlParse("invalid attribute name".into()))?
            .to_ascii_lowercase();

        if name.is_empty() {
            if mode == ParseMode::Fragment {
                i += 1;
                continue;
            }
            return Err(Error::HtmlParse(format!(
                "invalid attribute name in <{tag}> at byte {i}"
            )));
        }

        skip_ws(bytes, &mut i);

        let value = if bytes.get(i) == Some(&b'=') {
            i += 1;
            skip_ws(bytes, &mut i);
            decode_entities(&parse_attr_value(html, bytes, &mut i)?)
        } else {
            String::new()
        };

        attrs.entry(name).or_insert(value);
    }

    Ok((tag, attrs, self_closing, i))
}

fn parse_end_tag(html: &str, at: usize) -> Result<(String, usize)> {
    let bytes = html.as_bytes();
    let mut i = at + 2;
    skip_ws(bytes, &mut i);

    let tag_start = i;
    while i < bytes.len() && is_tag_char(bytes[i]) {
        i += 1;
    }

    let tag = html
        .get(tag_start..i)
        .ok_or_else(|| Error::HtmlParse("invalid end tag".into()))?
        .to_ascii_lowercase();

    while i < bytes.len() && bytes[i] != b'>' {
        i += 1;
    }
    if i >= bytes.len() {
        return Err(Error::HtmlParse(format!("unclosed end tag </{tag}")));
    }

    Ok((tag, i + 1))
}

fn parse_attr_value(html: &str, bytes: &[u8], i: &mut usize) -> Result<String> {
    if *i >= bytes.len() {
        return Err(Error::HtmlParse("missing attribute value".into()));
    }

    if bytes[*i] == b'\'' || bytes[*i] == b'"' {
        let quote = bytes[*i];
        *i += 1;
        let start = *i;
        while *i < bytes.len() && bytes[*i] != quote {
            *i += 1;
        }
        if *i >= bytes.len() {
            return Err(Error::HtmlParse("unclosed quoted attribute value".into()));
        }
        let value = html
            .get(start..*i)
            .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?
            .to_string();
        *i += 1;
        return Ok(value);
    }

    let start = *i;
    while *i < bytes.len()
        && !bytes[*i].is_ascii_whitespace()
        && bytes[*i] != b'>'
        && !(bytes[*i] == b'/' && bytes.get(*i + 1) == Some(&b'>'))
    {
        *i += 1;
    }

    Ok(html
        .get(start..*i)
        .ok_or_else(|| Error::HtmlParse("invalid attribute value".into()))?
        .to_string())
}

pub(crate) fn decode_entities(src: &str) -> String {
    if !src.contains('&') {
        return src.to_string();
    }

    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let decoded = rest.find(';').filter(|end| *end <= 10).and_then(|end| {
            let name = &rest[1..end];
            let ch = match name {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => {
                    let code = if let Some(hex) = name
                        .strip_prefix("#x")
                        .or_else(|| name.strip_prefix("#X"))
                    {
                        u32::from_str_radix(hex, 16).ok()
                    } else {
                        name.strip_prefix('#').and_then(|dec| dec.parse().ok())
                    };
                    code.and_then(char::from_u32)
                }
            };
            ch.map(|ch| (ch, end))
        });
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

pub(crate) fn escape_text(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    for ch in src.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

pub(crate) fn escape_attr(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    for ch in src.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
    out
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn is_tag_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn is_attr_name_char(b: u8) -> bool {
    !b.is_ascii_whitespace() && !matches!(b, b'>' | b'/' | b'=' | b'"' | b'\'')
}

fn is_raw_text_tag(tag: &str) -> bool {
    matches!(tag, "script" | "style" | "textarea")
}

pub(crate) fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

fn starts_with_at(bytes: &[u8], at: usize, needle: &[u8]) -> bool {
    bytes
        .get(at..at + needle.len())
        .map(|window| window == needle)
        .unwrap_or(false)
}

fn find_subslice(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || from > bytes.len() {
        return None;
    }
    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| pos + from)
}

fn find_case_insensitive_end_tag(bytes: &[u8], from: usize, tag: &[u8]) -> Option<usize> {
    let mut needle = b"</".to_vec();
    needle.extend(tag.iter().map(|b| b.to_ascii_lowercase()));

    let mut i = from;
    while i + needle.len() <= bytes.len() {
        if bytes[i..i + needle.len()]
            .iter()
            .zip(&needle)
            .all(|(a, b)| a.to_ascii_lowercase() == *b)
        {
            return Some(i);
        }
        i += 1;
    }
    None
}
