//! Server-rendered HTML for the two screens.

use std::fmt::Write;

use comparer_core::{ComparisonViewModel, PanelView, Selection, SelectionViewModel};

const STYLE: &str = "body{font-family:sans-serif;margin:0;background:#fff;color:#1a1414}\
header,main{max-width:72rem;margin:0 auto;padding:1rem 1.5rem}\
.badge{display:inline-block;padding:.1rem .5rem;border-radius:.25rem;font-size:.75rem;background:#eee}\
.option{display:block;width:100%;text-align:left;padding:1rem;margin:.5rem 0;border:2px solid #ccc;background:#fff}\
.option.selected{border-color:#4537de}.option:disabled{opacity:.5}\
.grid{display:grid;gap:1rem}.panel{border:2px solid #ccc;padding:1rem}\
.panel.loading{border-color:#4537de}.panel.loaded{border-color:#2b8a3e}.panel.error{border-color:#e8715c}\
.metrics{display:grid;grid-template-columns:1fr 1fr;gap:.5rem;font-family:monospace;font-size:.8rem}\
.error-text{color:#e8715c;font-family:monospace;font-size:.8rem}";

pub fn selection_page(view: &SelectionViewModel, web_sdk_version: Option<&str>) -> String {
    let mut body = String::new();
    body.push_str("<h2>Select Loading Methods to Compare</h2>");
    body.push_str("<p>Choose up to 3 loading methods to compare side-by-side.</p>");

    for option in &view.options {
        let class = if option.selected { "option selected" } else { "option" };
        let disabled = if option.disabled { " disabled" } else { "" };
        let _ = write!(
            body,
            r#"<form method="post" action="/select/{id}"><button class="{class}" type="submit"{disabled}><strong>{name}</strong>{check}<br><span>{description}</span></button></form>"#,
            id = option.method.as_str(),
            name = escape(option.name),
            check = if option.selected { " &#10003;" } else { "" },
            description = escape(option.description),
        );
    }

    if let Some(summary) = &view.summary {
        let _ = write!(body, "<p>{}</p>", escape(summary));
    }
    let disabled = if view.start_href.is_some() { "" } else { " disabled" };
    let _ = write!(
        body,
        r#"<form method="post" action="/continue"><button type="submit"{disabled}>{label}</button></form>"#,
        label = escape(&view.start_label),
    );

    page("Nutrient Document Loading Comparison", &header(web_sdk_version), &body, false)
}

pub fn comparison_page(
    view: &ComparisonViewModel,
    comparison: &Selection,
    web_sdk_version: Option<&str>,
) -> String {
    let mut body = String::new();
    let back_href = comparison.selection_href();
    let _ = write!(
        body,
        r#"<p><a href="{back}">&larr; Back to Selection</a></p><h1>Loading Comparison</h1><p>{count}</p>"#,
        back = escape(&back_href),
        count = escape(&view.method_count_label),
    );

    let query = comparison.to_url_query();
    if view.started {
        let _ = write!(
            body,
            r#"<form method="post" action="/compare/reset?{query}"><button type="submit">Reset Comparison</button></form>"#,
            query = escape(&query),
        );
    } else {
        let _ = write!(
            body,
            r#"<form method="post" action="/compare/start?{query}"><button type="submit">Start All Viewers</button></form>"#,
            query = escape(&query),
        );
    }
    let _ = write!(body, "<p>{}</p>", escape(view.info_text));

    let _ = write!(
        body,
        r#"<div class="grid" style="grid-template-columns:repeat({}, 1fr)">"#,
        view.grid_columns
    );
    for panel in &view.panels {
        panel_html(&mut body, panel, view.started);
    }
    body.push_str("</div>");

    page("Loading Comparison", &header(web_sdk_version), &body, view.started)
}

fn panel_html(out: &mut String, panel: &PanelView, started: bool) {
    let _ = write!(
        out,
        r#"<section class="panel {status}" id="viewer-{id}"><h3>{name}</h3>"#,
        status = panel.status.as_str(),
        id = panel.method.as_str(),
        name = escape(panel.name),
    );
    if let Some(badge) = panel.status.badge() {
        let _ = write!(out, r#"<span class="badge">{badge}</span>"#);
    }
    let _ = write!(
        out,
        r#"<div class="metrics"><div>FIRST RENDER<br><b>{}</b></div><div>FULLY LOADED<br><b>{}</b></div><div>INTERACTIVE<br><b>{}</b></div><div>FILE SIZE<br><b>{}</b></div></div>"#,
        escape(&panel.first_render),
        escape(&panel.fully_loaded),
        escape(&panel.interactive),
        escape(&panel.file_size),
    );
    if let Some(error) = &panel.error {
        let _ = write!(out, r#"<p class="error-text">{}</p>"#, escape(error));
    }
    if !started {
        out.push_str(r#"<p>Click "Start All Viewers" to begin loading</p>"#);
    }
    out.push_str("</section>");
}

fn header(web_sdk_version: Option<&str>) -> String {
    let mut header = String::from(
        "<h1>Nutrient Document Loading Comparison</h1><p>Compare loading performance across different methods</p>",
    );
    if let Some(version) = web_sdk_version {
        let _ = write!(header, r#"<span class="badge">Web SDK v{}</span>"#, escape(version));
    }
    header
}

fn page(title: &str, header: &str, body: &str, auto_refresh: bool) -> String {
    // Running comparisons refresh themselves until reset.
    let refresh = if auto_refresh {
        r#"<meta http-equiv="refresh" content="1">"#
    } else {
        ""
    };
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">{refresh}<title>{title}</title><style>{STYLE}</style></head><body><header>{header}</header><main>{body}</main></body></html>",
        title = escape(title),
    )
}

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
