use crate::types::FrameContext;

/// What an element script should operate on.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// XPath when it starts with `/` or `(`, CSS otherwise
    Selector(&'a str),
    /// First anchor whose trimmed text equals the string
    LinkText(&'a str),
}

/// Quote a Rust string as a JavaScript string literal.
pub fn js_string(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

pub fn is_xpath(selector: &str) -> bool {
    let trimmed = selector.trim_start();
    trimmed.starts_with('/') || trimmed.starts_with('(')
}

/// Expression evaluating to the document addressed by the frame context,
/// or `null` when the frame is gone (e.g. mid reload).
pub fn scope_document(frame: &FrameContext) -> String {
    match frame {
        FrameContext::TopLevel => "document".to_string(),
        FrameContext::Frame(title) => format!(
            r#"(function() {{
                const frame = Array.from(document.querySelectorAll('iframe'))
                    .find(f => (f.title || '').includes({}));
                try {{
                    return frame ? frame.contentDocument : null;
                }} catch (e) {{
                    return null;
                }}
            }})()"#,
            js_string(title)
        ),
    }
}

fn locate(target: Target<'_>) -> String {
    match target {
        Target::Selector(selector) if is_xpath(selector) => format!(
            "doc.evaluate({}, doc, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
            js_string(selector)
        ),
        Target::Selector(selector) => format!("doc.querySelector({})", js_string(selector)),
        Target::LinkText(text) => format!(
            "Array.from(doc.querySelectorAll('a')).find(a => (a.textContent || '').trim() === {})",
            js_string(text)
        ),
    }
}

/// Wrap `body` so it runs with `doc` and `el` bound. The script yields
/// `missing` when the document or element cannot be found.
pub fn element_script(frame: &FrameContext, target: Target<'_>, body: &str, missing: &str) -> String {
    format!(
        r#"(function() {{
            const doc = {scope};
            if (!doc) return {missing};
            let el = null;
            try {{
                el = {locate};
            }} catch (e) {{
                return {missing};
            }}
            if (!el) return {missing};
            {body}
        }})()"#,
        scope = scope_document(frame),
        locate = locate(target),
        body = body,
        missing = missing,
    )
}

pub const VISIBLE_BODY: &str = r#"
    const rect = el.getBoundingClientRect();
    const style = (el.ownerDocument.defaultView || window).getComputedStyle(el);
    return rect.width > 0 &&
           rect.height > 0 &&
           style.visibility !== 'hidden' &&
           style.display !== 'none' &&
           parseFloat(style.opacity) > 0;
"#;

pub const ENABLED_BODY: &str = r#"
    return !el.disabled && !el.readOnly && !el.hasAttribute('disabled');
"#;

/// Hit-test the element's centre and report it in top-level viewport
/// coordinates as `point:x,y`, adding the offset of every enclosing frame.
pub const CLICK_POINT_BODY: &str = r#"
    el.scrollIntoView({ block: 'center' });
    const rect = el.getBoundingClientRect();
    if (rect.width === 0 || rect.height === 0) return 'not_visible';
    let x = rect.left + rect.width / 2;
    let y = rect.top + rect.height / 2;
    const hit = doc.elementFromPoint(x, y);
    if (hit && hit !== el && !el.contains(hit)) return 'obscured';
    let view = doc.defaultView;
    while (view && view.frameElement) {
        const frame = view.frameElement;
        const box = frame.getBoundingClientRect();
        x += box.left + frame.clientLeft;
        y += box.top + frame.clientTop;
        view = frame.ownerDocument.defaultView;
    }
    return 'point:' + x + ',' + y;
"#;

/// Parse the `point:x,y` status produced by [`CLICK_POINT_BODY`].
pub fn parse_click_point(status: &str) -> Option<(f64, f64)> {
    let (x, y) = status.strip_prefix("point:")?.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

pub const SCRIPT_CLICK_BODY: &str = r#"
    el.click();
    return 'ok';
"#;

pub const FOCUS_BODY: &str = r#"
    el.focus();
    return 'ok';
"#;

pub const SCROLL_BODY: &str = r#"
    el.scrollIntoView({ behavior: 'auto', block: 'center' });
    return 'ok';
"#;

pub const SELECTED_LABEL_BODY: &str = r#"
    if (!el.options || el.selectedIndex < 0) return null;
    return el.options[el.selectedIndex].text.trim();
"#;

/// Body reading an attribute with property-first semantics, so boolean
/// properties such as `checked` read back as `"true"` or `null`.
pub fn attribute_body(name: &str) -> String {
    format!(
        r#"
        const name = {};
        const prop = el[name];
        if (typeof prop === 'boolean') return prop ? 'true' : null;
        if (prop !== undefined && prop !== null && typeof prop !== 'object' && typeof prop !== 'function') {{
            return String(prop);
        }}
        return el.getAttribute(name);
        "#,
        js_string(name)
    )
}

pub fn select_label_body(label: &str) -> String {
    format!(
        r#"
        const label = {};
        const option = Array.from(el.options || []).find(o => o.text.trim() === label);
        if (!option) return 'no_option';
        el.value = option.value;
        option.selected = true;
        el.dispatchEvent(new Event('input', {{ bubbles: true }}));
        el.dispatchEvent(new Event('change', {{ bubbles: true }}));
        return 'ok';
        "#,
        js_string(label)
    )
}

/// Text search over the scoped document and any same-origin frames below it.
pub fn page_contains_script(frame: &FrameContext, text: &str) -> String {
    format!(
        r#"(function() {{
            const needle = {needle};
            const search = (doc) => {{
                if (!doc || !doc.body) return false;
                if ((doc.body.innerText || '').includes(needle)) return true;
                return Array.from(doc.querySelectorAll('iframe')).some(f => {{
                    try {{
                        return search(f.contentDocument);
                    }} catch (e) {{
                        return false;
                    }}
                }});
            }};
            return search({scope});
        }})()"#,
        needle = js_string(text),
        scope = scope_document(frame),
    )
}

pub fn frame_exists_script(title: &str) -> String {
    format!(
        "Array.from(document.querySelectorAll('iframe')).some(f => (f.title || '').includes({}))",
        js_string(title)
    )
}

/// Lightning marks the end of a page load by populating the template container.
pub const LOADING_COMPLETE_SCRIPT: &str = r#"
    document.readyState === 'complete' &&
    !!document.querySelector('.slds-template__container > *')
"#;
