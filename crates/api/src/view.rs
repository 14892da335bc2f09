//! Server-rendered HTML for the leads page.
//!
//! The page shows leads exactly as fetched from amoCRM, not the stored
//! projection. All CRM-provided text is escaped.

use std::fmt::Write;

use html_escape::encode_text;
use leadsync_core::lead::Lead;

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="ru">
<head>
<meta charset="utf-8">
<title>Сделки</title>
<style>
body { font-family: sans-serif; margin: 2rem; }
table { border-collapse: collapse; width: 100%; }
th, td { border: 1px solid #ccc; padding: .4rem .6rem; text-align: left; vertical-align: top; }
th { background: #f4f4f4; }
dl { margin: 0; }
dt { font-weight: bold; }
dd { margin: 0 0 .3rem 0; }
</style>
</head>
<body>
"#;

const PAGE_TAIL: &str = "</body>\n</html>\n";

/// Render the full leads page.
pub fn render_leads_page(leads: &[Lead]) -> String {
    let mut html = String::with_capacity(PAGE_HEAD.len() + leads.len() * 256);
    html.push_str(PAGE_HEAD);
    let _ = writeln!(html, "<h1>Сделки ({})</h1>", leads.len());
    html.push_str("<table>\n<thead><tr><th>ID</th><th>Название</th><th>Бюджет</th>");
    html.push_str("<th>Ответственный</th><th>Аккаунт</th><th>Дополнительные поля</th></tr></thead>\n<tbody>\n");

    for lead in leads {
        render_row(&mut html, lead);
    }

    html.push_str("</tbody>\n</table>\n");
    html.push_str(PAGE_TAIL);
    html
}

fn render_row(html: &mut String, lead: &Lead) {
    let _ = write!(
        html,
        "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>",
        lead.id,
        encode_text(&lead.name),
        optional(lead.price),
        optional(lead.responsible_user_id),
        optional(lead.account_id),
    );

    let fields = lead.custom_field_map();
    if !fields.is_empty() {
        html.push_str("<dl>");
        for (name, value) in &fields {
            let text = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let _ = write!(
                html,
                "<dt>{}</dt><dd>{}</dd>",
                encode_text(name),
                encode_text(&text)
            );
        }
        html.push_str("</dl>");
    }

    html.push_str("</td></tr>\n");
}

fn optional(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
