//! Content resolution: binds template elements to product data.
//!
//! Precedence for an element's displayed value:
//!
//! 1. `dataField` lookup in the product record
//! 2. the element's literal content, with `{{field}}` placeholders substituted
//! 3. empty string
//!
//! Placeholders with no matching key stay in the output literally, so a
//! printed label shows which data was missing instead of failing the render.

use std::collections::HashMap;

use super::{ElementKind, TemplateElement};

/// A product record: field name → display value.
pub type ProductData = HashMap<String, String>;

/// Replace `{{key}}` tokens in `content` with values from `data`.
///
/// Whitespace inside the braces is ignored (`{{ name }}` matches `name`).
/// Substituted values are not rescanned, so a value containing `{{...}}`
/// is emitted as-is.
pub fn substitute_placeholders(content: &str, data: &ProductData) -> String {
    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];
        let Some(end) = after_open.find("}}") else {
            // Unterminated token: keep the remainder verbatim
            out.push_str(&rest[start..]);
            return out;
        };

        let key = after_open[..end].trim();
        match data.get(key) {
            Some(value) if !key.is_empty() => out.push_str(value),
            _ => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after_open[end + 2..];
    }

    out.push_str(rest);
    out
}

/// Resolve the value an element displays or encodes.
///
/// Rectangles carry no content and resolve to an empty string. For images
/// the resolved value is the image URL.
pub fn resolve_content(element: &TemplateElement, data: &ProductData) -> String {
    if let Some(field) = element.data_field.as_deref().map(str::trim)
        && !field.is_empty()
        && let Some(value) = data.get(field)
    {
        return value.clone();
    }

    let literal = match &element.kind {
        ElementKind::Text(t) => t.content.as_str(),
        ElementKind::Qrcode(q) => q.content.as_str(),
        ElementKind::Barcode(b) => b.content.as_str(),
        ElementKind::Image(i) => i.image_url.as_deref().unwrap_or(""),
        ElementKind::Rectangle(_) => "",
    };

    substitute_placeholders(literal, data)
}

/// Built-in datetime variables available to every label.
pub fn builtin_variables() -> ProductData {
    use chrono::Local;

    let now = Local::now();
    let mut vars = HashMap::new();

    vars.insert("date".into(), now.format("%d.%m.%Y").to_string()); // 27.01.2026
    vars.insert("time".into(), now.format("%H:%M").to_string()); // 09:30
    vars.insert("datetime".into(), now.format("%d.%m.%Y %H:%M").to_string());
    vars.insert("year".into(), now.format("%Y").to_string());
    vars.insert("iso_date".into(), now.format("%Y-%m-%d").to_string());

    vars
}

/// Merge built-in variables with product data. Product fields win.
pub fn with_builtins(data: &ProductData) -> ProductData {
    let mut vars = builtin_variables();
    vars.extend(data.iter().map(|(k, v)| (k.clone(), v.clone())));
    vars
}

/// Build product data from a JSON object.
///
/// Strings are taken as-is, other scalars in their JSON text form (`1.5`,
/// `true`), and nulls are dropped.
pub fn product_data_from_json(fields: serde_json::Map<String, serde_json::Value>) -> ProductData {
    fields
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{ImageProps, QrProps, RectangleProps, TextProps};

    fn data(pairs: &[(&str, &str)]) -> ProductData {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn text(content: &str) -> TemplateElement {
        TemplateElement::new(ElementKind::Text(TextProps {
            content: content.into(),
            ..Default::default()
        }))
    }

    #[test]
    fn test_substitute_basic() {
        let d = data(&[("name", "Молоко"), ("price", "89.90")]);
        assert_eq!(
            substitute_placeholders("{{name}} / {{price}} ₽", &d),
            "Молоко / 89.90 ₽"
        );
    }

    #[test]
    fn test_substitute_unmatched_left_literal() {
        let d = data(&[("name", "Milk")]);
        assert_eq!(
            substitute_placeholders("{{name}} {{weight}}", &d),
            "Milk {{weight}}"
        );
    }

    #[test]
    fn test_substitute_trims_key() {
        let d = data(&[("sku", "A-1")]);
        assert_eq!(substitute_placeholders("{{ sku }}", &d), "A-1");
    }

    #[test]
    fn test_substitute_unterminated() {
        let d = data(&[("a", "1")]);
        assert_eq!(substitute_placeholders("x {{a}} {{b", &d), "x 1 {{b");
    }

    #[test]
    fn test_substitute_does_not_rescan_values() {
        let d = data(&[("a", "{{b}}"), ("b", "nope")]);
        assert_eq!(substitute_placeholders("{{a}}", &d), "{{b}}");
    }

    #[test]
    fn test_substitute_empty_key_left_literal() {
        let d = data(&[("", "x")]);
        assert_eq!(substitute_placeholders("{{}}", &d), "{{}}");
    }

    #[test]
    fn test_resolve_data_field_wins() {
        let mut el = text("{{name}}");
        el.data_field = Some("sku".into());
        let d = data(&[("name", "Milk"), ("sku", "4600000000001")]);
        assert_eq!(resolve_content(&el, &d), "4600000000001");
    }

    #[test]
    fn test_resolve_missing_data_field_falls_back_to_content() {
        let mut el = text("{{name}}");
        el.data_field = Some("missing".into());
        let d = data(&[("name", "Milk")]);
        assert_eq!(resolve_content(&el, &d), "Milk");
    }

    #[test]
    fn test_resolve_qr_content() {
        let el = TemplateElement::new(ElementKind::Qrcode(QrProps {
            content: "https://shop.example/{{sku}}".into(),
            ..Default::default()
        }));
        let d = data(&[("sku", "42")]);
        assert_eq!(resolve_content(&el, &d), "https://shop.example/42");
    }

    #[test]
    fn test_resolve_rectangle_and_image() {
        let rect = TemplateElement::new(ElementKind::Rectangle(RectangleProps::default()));
        assert_eq!(resolve_content(&rect, &ProductData::new()), "");

        let img = TemplateElement::new(ElementKind::Image(ImageProps {
            image_url: Some("logo.png".into()),
        }));
        assert_eq!(resolve_content(&img, &ProductData::new()), "logo.png");
    }

    #[test]
    fn test_with_builtins_product_overrides() {
        let d = data(&[("date", "custom")]);
        let vars = with_builtins(&d);
        assert_eq!(vars["date"], "custom");
        assert!(vars.contains_key("year"));
    }

    #[test]
    fn test_product_data_from_json() {
        let serde_json::Value::Object(fields) = serde_json::json!({
            "name": "Milk", "price": 89.9, "organic": true, "note": null
        }) else {
            unreachable!()
        };
        let d = product_data_from_json(fields);
        assert_eq!(d["name"], "Milk");
        assert_eq!(d["price"], "89.9");
        assert_eq!(d["organic"], "true");
        assert!(!d.contains_key("note"));
    }
}
