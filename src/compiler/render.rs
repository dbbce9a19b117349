//! Page rendering.
//!
//! Rendering is a pure function of the page record and the site
//! configuration: the body is converted from markdown, spliced into a fixed
//! envelope that extends `base.html`, and the whole thing is expanded
//! through tera. Because the body is spliced *before* expansion, template
//! syntax written inside page bodies works too.
//!
//! Helper filters available to templates are enumerated statically in
//! [`Renderer::new`]; there is no dynamic registration.

use crate::{
    compiler::{BuildError, OUTPUT_EXT, pages},
    config::SiteConfig,
};
use anyhow::{Context as _, Result};
use pulldown_cmark::{Options, Parser, html};
use std::{collections::HashMap, fs, path::PathBuf};
use tera::{Context, Tera, Value};

/// Name under which the per-page envelope is registered.
const ENVELOPE_NAME: &str = "__page__";

/// Template expansion engine plus the loaded template set.
///
/// Constructed once per run and shared immutably across the worker pool.
/// Registering a per-page envelope needs a mutable engine, so each worker
/// clones the loaded engine once into a [`RenderSession`] and reuses it
/// for every page it renders.
pub struct Renderer {
    tera: Tera,
}

/// One worker's private rendering engine.
///
/// Cloned from the shared [`Renderer`] once per worker, not once per page;
/// successive renders overwrite the envelope registration in place.
pub struct RenderSession {
    tera: Tera,
}

impl Renderer {
    /// Load every `.html` template under the templates root and register
    /// the helper filter table.
    pub fn new(config: &SiteConfig) -> Result<Self> {
        let pattern = config
            .templates_path()
            .join("**")
            .join(format!("*.{OUTPUT_EXT}"));
        let mut tera = Tera::new(&pattern.to_string_lossy())
            .with_context(|| format!("failed to load templates from `{}`", pattern.display()))?;

        // Pages splice raw HTML into the envelope; escaping would mangle it.
        tera.autoescape_on(vec![]);

        tera.register_filter("build_link", build_link);
        tera.register_filter("embed_icon", embed_icon(config.static_path()));

        Ok(Self { tera })
    }

    /// Clone the loaded engine for one worker's exclusive use.
    pub fn session(&self) -> RenderSession {
        RenderSession {
            tera: self.tera.clone(),
        }
    }
}

impl RenderSession {
    /// Render one page to its final HTML.
    ///
    /// Fails with [`BuildError::Markup`] if the page names an unknown
    /// markdown extension and [`BuildError::Template`] if envelope
    /// expansion fails. Either way the error carries the page link so the
    /// orchestrator can report it without touching sibling pages.
    pub fn render(
        &mut self,
        page: &pages::Page,
        config: &SiteConfig,
    ) -> Result<String, BuildError> {
        let options = markdown_options(&page.extensions).map_err(|unknown| BuildError::Markup {
            page: page.link.clone(),
            detail: format!("unknown markup extension `{unknown}`"),
        })?;

        let mut body = String::new();
        html::push_html(&mut body, Parser::new_ext(&page.body, options));

        self.tera
            .add_raw_template(ENVELOPE_NAME, &envelope(&body))
            .map_err(|source| BuildError::Template {
                page: page.link.clone(),
                source,
            })?;

        let mut context = Context::new();
        context.insert("site", config);
        context.insert("page", page);

        self.tera
            .render(ENVELOPE_NAME, &context)
            .map_err(|source| BuildError::Template {
                page: page.link.clone(),
                source,
            })
    }
}

/// Fixed page envelope wrapping the converted body.
fn envelope(body: &str) -> String {
    format!("{{% extends \"base.html\" %}}\n{{% block main %}}\n{body}\n{{% endblock main %}}")
}

/// Map extension identifiers onto markdown parser options.
///
/// Identifiers that name no known option are an error, not a silent
/// pass-through.
fn markdown_options(extensions: &[String]) -> Result<Options, String> {
    let mut options = Options::empty();
    for name in extensions {
        let flag = match name.as_str() {
            "tables" => Options::ENABLE_TABLES,
            "footnotes" => Options::ENABLE_FOOTNOTES,
            "strikethrough" => Options::ENABLE_STRIKETHROUGH,
            "tasklists" => Options::ENABLE_TASKLISTS,
            "smart_punctuation" => Options::ENABLE_SMART_PUNCTUATION,
            "heading_attributes" => Options::ENABLE_HEADING_ATTRIBUTES,
            unknown => return Err(unknown.to_string()),
        };
        options.insert(flag);
    }
    Ok(options)
}

/// `{{ page.path | build_link }}`: path-segment array to output link.
fn build_link(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
    let segments: Vec<String> = tera::from_value(value.clone())?;
    Ok(Value::String(pages::derive_link(&segments)))
}

/// `{{ "star" | embed_icon }}`: inline an SVG from `static/ico/`.
fn embed_icon(
    static_root: PathBuf,
) -> impl Fn(&Value, &HashMap<String, Value>) -> tera::Result<Value> + Send + Sync {
    move |value, _args| {
        let name = value
            .as_str()
            .ok_or_else(|| tera::Error::msg("embed_icon expects an icon name"))?;
        let path = static_root.join("ico").join(format!("{name}.svg"));
        let svg = fs::read_to_string(&path)
            .map_err(|_| tera::Error::msg(format!("icon not found: `{}`", path.display())))?;
        Ok(Value::String(svg))
    }
}
