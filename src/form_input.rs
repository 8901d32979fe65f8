//! Helpers that change user-editable state and then announce it with a
//! single `input` event, the way typing into a control would.

use crate::dispatcher::deliver_to;
use crate::dom::NodeId;
use crate::error::{Error, Result};
use crate::event::EventKind;
use crate::host::Host;
use crate::options::OptionBag;

/// Sets `node`'s value to `text` and delivers `input` once.
///
/// No element-kind, `disabled` or `readonly` filtering is applied.
pub fn set_form_control_value<H>(host: &mut H, node: NodeId, text: &str) -> Result<()>
where
    H: Host + ?Sized,
{
    ensure_element(host, node)?;
    host.set_value(node, text)?;
    host.trace(format!(
        "[form] value target={} len={}",
        host.describe(node),
        text.len()
    ));
    deliver_to(host, node, EventKind::Input, &OptionBag::empty())
}

/// Replaces `node`'s children with the parsed `html` and delivers `input`
/// once. Truncated markup is recovered rather than rejected.
/// `contenteditable` is reported in the trace line but not enforced.
pub fn set_editable_content<H>(host: &mut H, node: NodeId, html: &str) -> Result<()>
where
    H: Host + ?Sized,
{
    ensure_element(host, node)?;
    host.set_inner_html(node, html)?;
    host.trace(format!(
        "[form] content target={} editable={} len={}",
        host.describe(node),
        host.is_content_editable(node),
        html.len()
    ));
    deliver_to(host, node, EventKind::Input, &OptionBag::empty())
}

fn ensure_element<H>(host: &H, node: NodeId) -> Result<()>
where
    H: Host + ?Sized,
{
    if host.is_element(node) {
        Ok(())
    } else {
        Err(Error::InvalidTarget(format!(
            "{} is not an element",
            host.describe(node)
        )))
    }
}
