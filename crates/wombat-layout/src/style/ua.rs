//! User-agent defaults and presentational attributes.
//!
//! [WHATWG HTML § 15 Rendering](https://html.spec.whatwg.org/multipage/rendering.html)
//!
//! "User agents are expected to have a default style sheet that presents elements
//! of HTML documents in ways consistent with general user expectations."
//!
//! Author styles are applied after these defaults, so any declared property
//! overrides them.

use std::collections::BTreeMap;

use super::BoxStyle;

/// [§ 15.3 Suggested default style sheet](https://html.spec.whatwg.org/multipage/rendering.html#the-css-user-agent-style-sheet-and-presentational-hints)
///
/// Each entry is a list of tag names and the declarations they receive.
const UA_RULES: &[(&[&str], &str)] = &[
    // [§ 15.3.1 Hidden elements]
    (
        &[
            "area", "base", "datalist", "head", "link", "meta", "noembed", "noframes", "param",
            "script", "style", "template", "title",
        ],
        "display: none",
    ),
    // [§ 15.3.3 Flow content]
    (
        &[
            "address", "article", "aside", "blockquote", "body", "center", "dd", "div", "dl",
            "dt", "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4",
            "h5", "h6", "header", "hr", "html", "legend", "main", "nav", "ol", "p", "pre",
            "section", "ul",
        ],
        "display: block",
    ),
    (&["body"], "margin: 8px"),
    (&["p", "dl"], "margin-top: 1em; margin-bottom: 1em"),
    (&["blockquote", "figure"], "margin: 1em 40px"),
    (&["dd"], "margin-left: 40px"),
    (&["center"], "text-align: center"),
    // [§ 15.3.6 Sections and headings]
    (&["h1"], "font-size: 2em; font-weight: bold; margin-top: 0.67em; margin-bottom: 0.67em"),
    (&["h2"], "font-size: 1.5em; font-weight: bold; margin-top: 0.83em; margin-bottom: 0.83em"),
    (&["h3"], "font-size: 1.17em; font-weight: bold; margin-top: 1em; margin-bottom: 1em"),
    (&["h4"], "font-weight: bold; margin-top: 1.33em; margin-bottom: 1.33em"),
    (&["h5"], "font-size: 0.83em; font-weight: bold; margin-top: 1.67em; margin-bottom: 1.67em"),
    (&["h6"], "font-size: 0.67em; font-weight: bold; margin-top: 2.33em; margin-bottom: 2.33em"),
    // [§ 15.3.4 Phrasing content]
    (&["b", "strong", "th"], "font-weight: bold"),
    (&["i", "em", "cite", "var", "dfn", "address"], "font-style: italic"),
    (&["code", "kbd", "samp", "tt"], "font-family: monospace"),
    (&["pre"], "white-space: pre; font-family: monospace; margin-top: 1em; margin-bottom: 1em"),
    (&["nobr"], "white-space: nowrap"),
    (&["a"], "color: #0000ee; text-decoration: underline"),
    (&["u", "ins"], "text-decoration: underline"),
    (&["s", "strike", "del"], "text-decoration: line-through"),
    (&["sub"], "vertical-align: sub; font-size: smaller"),
    (&["sup"], "vertical-align: super; font-size: smaller"),
    (&["small"], "font-size: smaller"),
    (&["big"], "font-size: larger"),
    // [§ 15.3.7 Lists]
    (&["li"], "display: list-item"),
    (&["ul", "ol"], "margin-top: 1em; margin-bottom: 1em; padding-left: 40px"),
    (&["ul"], "list-style-type: disc"),
    (&["ol"], "list-style-type: decimal"),
    // [§ 15.3.8 Tables]
    (&["table"], "display: table; border-spacing: 2px; border-collapse: separate"),
    (&["caption"], "display: table-caption; text-align: center"),
    (&["colgroup"], "display: table-column-group"),
    (&["col"], "display: table-column"),
    (&["thead"], "display: table-header-group; vertical-align: middle"),
    (&["tbody"], "display: table-row-group; vertical-align: middle"),
    (&["tfoot"], "display: table-footer-group; vertical-align: middle"),
    (&["tr"], "display: table-row"),
    (&["td", "th"], "display: table-cell; padding: 1px; vertical-align: middle"),
    (&["th"], "text-align: center"),
    // [§ 15.3.11 The hr element]
    (
        &["hr"],
        "margin-top: 0.5em; margin-bottom: 0.5em; border-style: inset; border-width: 1px; border-color: gray",
    ),
    (&["img"], "display: inline"),
    (&["iframe", "frame"], "display: inline-block; border: 2px inset gray"),
];

/// Apply the default declarations for `tag` (lowercase).
pub fn apply_tag_defaults(style: &mut BoxStyle, tag: &str) {
    for (tags, declarations) in UA_RULES {
        if tags.contains(&tag) {
            style.apply_declarations(declarations);
        }
    }
}

/// [§ 15.3.9 Presentational hints](https://html.spec.whatwg.org/multipage/rendering.html#presentational-hints)
///
/// Translate legacy HTML attributes into style. Runs after the UA defaults
/// and before the element's own `style` declarations.
pub fn apply_presentational_attributes(
    style: &mut BoxStyle,
    tag: &str,
    attributes: &BTreeMap<String, String>,
) {
    for (name, value) in attributes {
        let value = value.trim();
        match name.as_str() {
            "align" => {
                // Floating images and tables is not modelled.
                if tag != "img" && tag != "table" {
                    let _ = style.set_property("text-align", value);
                }
            }
            "valign" => {
                let _ = style.set_property("vertical-align", value);
            }
            "bgcolor" => {
                let _ = style.set_property("background-color", value);
            }
            "background" => {
                style.background_image = Some(value.to_string());
            }
            "width" => {
                let _ = style.set_property("width", &html_length(value));
            }
            "height" => {
                let _ = style.set_property("height", &html_length(value));
            }
            "border" if tag == "table" => {
                let width = html_length(value);
                let _ = style.set_property("border-width", &width);
                let _ = style.set_property("border-style", "outset");
            }
            "border" if tag == "img" => {
                let _ = style.set_property("border-width", &html_length(value));
                let _ = style.set_property("border-style", "solid");
            }
            "cellspacing" => {
                let _ = style.set_property("border-spacing", &html_length(value));
            }
            "color" => {
                let _ = style.set_property("color", value);
            }
            "face" => {
                let _ = style.set_property("font-family", value);
            }
            "dir" => {
                let _ = style.set_property("direction", value);
            }
            "nowrap" => {
                let _ = style.set_property("white-space", "nowrap");
            }
            "hspace" => {
                let len = html_length(value);
                let _ = style.set_property("margin-left", &len);
                let _ = style.set_property("margin-right", &len);
            }
            "vspace" => {
                let len = html_length(value);
                let _ = style.set_property("margin-top", &len);
                let _ = style.set_property("margin-bottom", &len);
            }
            _ => {}
        }
    }
}

/// Table attributes that cascade onto every cell of the table.
///
/// `<table border="1">` gives cells a 1px inset border, and
/// `<table cellpadding="n">` gives them `n` pixels of padding.
pub fn apply_table_attributes_to_cell(
    style: &mut BoxStyle,
    table_attributes: &BTreeMap<String, String>,
) {
    if let Some(border) = table_attributes.get("border") {
        let visible = border.trim().parse::<f32>().map_or(true, |n| n > 0.0);
        if visible {
            let _ = style.set_property("border", "1px inset gray");
        }
    }
    if let Some(padding) = table_attributes.get("cellpadding") {
        let _ = style.set_property("padding", &html_length(padding));
    }
}

/// HTML dimension attributes allow bare numbers meaning pixels.
fn html_length(value: &str) -> String {
    let value = value.trim();
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        format!("{value}px")
    } else {
        value.to_string()
    }
}
