//! Built-in component renderers and their schemas.

use crate::error::RenderResult;
use crate::html::{escape, safe_url};
use crate::registry::{ComponentRegistry, Registration, RenderOptions};
use mediakit_model::{ComponentSchema, PropField};
use serde_json::Value;

/// Type names registered by [`register_all`].
pub const BUILTIN_TYPES: [&str; 5] = ["hero", "biography", "topics", "testimonials", "contact"];

/// Registers every built-in component on `registry`.
pub fn register_all(registry: &ComponentRegistry) {
    registry.register(
        "hero",
        Registration::new(hero).with_schema(
            ComponentSchema::new("hero", "Hero", "essential")
                .field(PropField::text("title", false))
                .field(PropField::text("subtitle", false))
                .field(PropField::rich_text("description"))
                .field(PropField::image("image")),
        ),
    );
    registry.register(
        "biography",
        Registration::new(biography).with_schema(
            ComponentSchema::new("biography", "Biography", "essential")
                .field(PropField::text("title", false))
                .field(PropField::rich_text("biography")),
        ),
    );
    registry.register(
        "topics",
        Registration::new(topics).with_schema(
            ComponentSchema::new("topics", "Speaking Topics", "content")
                .field(PropField::text("title", false))
                .field(PropField::list("topics")),
        ),
    );
    registry.register(
        "testimonials",
        Registration::new(testimonials).with_schema(
            ComponentSchema::new("testimonials", "Testimonials", "social-proof")
                .field(PropField::text("title", false))
                .field(PropField::list("testimonials")),
        ),
    );
    registry.register(
        "contact",
        Registration::new(contact).with_schema(
            ComponentSchema::new("contact", "Contact", "essential")
                .field(PropField::text("title", false))
                .field(PropField::text("email", false))
                .field(PropField::text("phone", false))
                .field(PropField::url("website")),
        ),
    );
}

/// First non-empty string among `keys`.
fn pick<'a>(props: &'a Value, keys: &[&str]) -> &'a str {
    keys.iter()
        .filter_map(|k| props.get(*k).and_then(Value::as_str))
        .find(|s| !s.is_empty())
        .unwrap_or("")
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() { default } else { value }
}

fn items<'a>(props: &'a Value, key: &str) -> &'a [Value] {
    props
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn image_url(props: &Value, keys: &[&str]) -> String {
    for key in keys {
        match props.get(*key) {
            Some(Value::String(url)) if !url.is_empty() => return url.clone(),
            Some(Value::Object(obj)) => {
                if let Some(url) = obj.get("url").and_then(Value::as_str) {
                    return url.to_string();
                }
            }
            _ => {}
        }
    }
    String::new()
}

fn hero(props: &Value, _options: &RenderOptions) -> RenderResult<String> {
    let title = or_default(pick(props, &["title", "full_name"]), "Guest Name");
    let subtitle = pick(props, &["subtitle", "guest_title"]);
    let description = pick(props, &["description", "biography"]);
    let image = image_url(props, &["image", "guest_headshot"]);

    let mut out = String::from("<div class=\"gmkb-hero\">");
    if let Some(image) = safe_url(&image) {
        out.push_str(&format!(
            "<img src=\"{}\" alt=\"{}\" class=\"gmkb-hero__image\">",
            escape(&image),
            escape(title)
        ));
    }
    out.push_str("<div class=\"gmkb-hero__content\">");
    out.push_str(&format!("<h1 class=\"gmkb-hero__title\">{}</h1>", escape(title)));
    if !subtitle.is_empty() {
        out.push_str(&format!("<h2 class=\"gmkb-hero__subtitle\">{}</h2>", escape(subtitle)));
    }
    if !description.is_empty() {
        out.push_str(&format!(
            "<p class=\"gmkb-hero__description\">{}</p>",
            escape(description)
        ));
    }
    out.push_str("</div></div>");
    Ok(out)
}

fn biography(props: &Value, _options: &RenderOptions) -> RenderResult<String> {
    let title = or_default(pick(props, &["title"]), "Biography");
    let content = pick(props, &["biography", "content"]);
    Ok(format!(
        "<div class=\"gmkb-biography\"><h3 class=\"gmkb-biography__title\">{}</h3>\
         <div class=\"gmkb-biography__content\">{}</div></div>",
        escape(title),
        escape(content)
    ))
}

fn topics(props: &Value, _options: &RenderOptions) -> RenderResult<String> {
    let title = or_default(pick(props, &["title"]), "Speaking Topics");
    let topics = items(props, "topics");

    let mut out = format!(
        "<div class=\"gmkb-topics\"><h3 class=\"gmkb-topics__title\">{}</h3>",
        escape(title)
    );
    if topics.is_empty() {
        out.push_str("<p class=\"gmkb-topics__empty\">No topics configured yet.</p>");
    } else {
        out.push_str("<ul class=\"gmkb-topics__list\">");
        for topic in topics {
            // Older saves store topics as bare strings.
            let (name, description) = match topic {
                Value::String(s) => (s.as_str(), ""),
                other => (
                    pick(other, &["topic_title", "title"]),
                    pick(other, &["topic_description", "description"]),
                ),
            };
            out.push_str(&format!(
                "<li class=\"gmkb-topics__item\"><h4>{}</h4>",
                escape(name)
            ));
            if !description.is_empty() {
                out.push_str(&format!("<p>{}</p>", escape(description)));
            }
            out.push_str("</li>");
        }
        out.push_str("</ul>");
    }
    out.push_str("</div>");
    Ok(out)
}

fn testimonials(props: &Value, _options: &RenderOptions) -> RenderResult<String> {
    let title = or_default(pick(props, &["title"]), "Testimonials");
    let entries = items(props, "testimonials");

    let mut out = format!(
        "<div class=\"gmkb-testimonials\"><h3 class=\"gmkb-testimonials__title\">{}</h3>",
        escape(title)
    );
    if entries.is_empty() {
        out.push_str("<p class=\"gmkb-testimonials__empty\">No testimonials yet.</p>");
    }
    for entry in entries {
        let quote = pick(entry, &["quote", "text"]);
        let author = pick(entry, &["author", "name"]);
        out.push_str(&format!(
            "<blockquote class=\"gmkb-testimonials__item\"><p>{}</p>",
            escape(quote)
        ));
        if !author.is_empty() {
            out.push_str(&format!("<cite>{}</cite>", escape(author)));
        }
        out.push_str("</blockquote>");
    }
    out.push_str("</div>");
    Ok(out)
}

fn contact(props: &Value, _options: &RenderOptions) -> RenderResult<String> {
    let title = or_default(pick(props, &["title"]), "Contact Information");
    let email = pick(props, &["email"]);
    let phone = pick(props, &["phone"]);
    let website = pick(props, &["website"]);

    let mut out = format!(
        "<div class=\"gmkb-contact\"><h3 class=\"gmkb-contact__title\">{}</h3>\
         <div class=\"gmkb-contact__info\">",
        escape(title)
    );
    if !email.is_empty() {
        let email = escape(email);
        out.push_str(&format!(
            "<p><strong>Email:</strong> <a href=\"mailto:{email}\">{email}</a></p>"
        ));
    }
    if !phone.is_empty() {
        let phone = escape(phone);
        out.push_str(&format!(
            "<p><strong>Phone:</strong> <a href=\"tel:{phone}\">{phone}</a></p>"
        ));
    }
    if !website.is_empty() {
        let text = escape(website);
        match safe_url(website) {
            Some(href) => out.push_str(&format!(
                "<p><strong>Website:</strong> \
                 <a href=\"{}\" target=\"_blank\" rel=\"noopener\">{text}</a></p>",
                escape(&href)
            )),
            None => out.push_str(&format!("<p><strong>Website:</strong> {text}</p>")),
        }
    }
    out.push_str("</div></div>");
    Ok(out)
}
