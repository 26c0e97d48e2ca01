//! Rewrite rules turning an image reference into a fetchable path.
//!
//! Rules run in order, each seeing the output of the one before.

use url::Url;

use crate::config::BasePath;

/// What a rule may consult besides the path itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct RewriteContext<'a> {
    pub base_path: Option<&'a BasePath>,
}

/// A named path rewrite that only fires when its condition holds.
#[derive(Clone, Copy)]
pub struct RewriteRule {
    pub name: &'static str,
    applies: fn(&str, &RewriteContext<'_>) -> bool,
    rewrite: fn(&str, &RewriteContext<'_>) -> String,
}

impl RewriteRule {
    pub fn apply(&self, path: &str, ctx: &RewriteContext<'_>) -> Option<String> {
        (self.applies)(path, ctx).then(|| (self.rewrite)(path, ctx))
    }
}

impl std::fmt::Debug for RewriteRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteRule").field("name", &self.name).finish()
    }
}

pub const IMAGES_SEGMENT: &str = "images";
pub const ANIMALS_SEGMENT: &str = "animals";

pub const RESOLVE_RULES: &[RewriteRule] = &[
    RewriteRule {
        name: "insert-images-segment",
        applies: lacks_images_segment,
        rewrite: insert_images_segment,
    },
    RewriteRule {
        name: "prepend-base-path",
        applies: needs_base_path,
        rewrite: prepend_base_path,
    },
    RewriteRule {
        name: "root-relative",
        applies: needs_leading_slash,
        rewrite: add_leading_slash,
    },
];

/// Absolute URLs (`https://...`, `data:...`) and protocol-relative `//host/...`.
pub fn is_absolute_url(path: &str) -> bool {
    path.starts_with("//") || Url::parse(path).is_ok()
}

fn is_root_relative(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//")
}

fn has_segment(path: &str, segment: &str) -> bool {
    path.split('/').any(|s| s == segment)
}

fn lacks_images_segment(path: &str, _ctx: &RewriteContext<'_>) -> bool {
    !is_absolute_url(path) && has_segment(path, ANIMALS_SEGMENT) && !has_segment(path, IMAGES_SEGMENT)
}

fn insert_images_segment(path: &str, _ctx: &RewriteContext<'_>) -> String {
    let mut out = Vec::new();
    let mut inserted = false;
    for segment in path.split('/') {
        if !inserted && segment == ANIMALS_SEGMENT {
            out.push(IMAGES_SEGMENT);
            inserted = true;
        }
        out.push(segment);
    }
    out.join("/")
}

fn needs_base_path(path: &str, ctx: &RewriteContext<'_>) -> bool {
    ctx.base_path
        .is_some_and(|base| is_root_relative(path) && !base.is_prefix_of(path))
}

fn prepend_base_path(path: &str, ctx: &RewriteContext<'_>) -> String {
    match ctx.base_path {
        Some(base) => format!("{base}{path}"),
        None => path.to_string(),
    }
}

fn needs_leading_slash(path: &str, _ctx: &RewriteContext<'_>) -> bool {
    !path.starts_with('/') && !is_absolute_url(path)
}

fn add_leading_slash(path: &str, _ctx: &RewriteContext<'_>) -> String {
    format!("/{path}")
}

/// Run `rules` over `path` in order.
pub fn rewrite(rules: &[RewriteRule], path: &str, ctx: &RewriteContext<'_>) -> String {
    rules.iter().fold(path.to_string(), |current, rule| {
        match rule.apply(&current, ctx) {
            Some(next) => {
                log::trace!("{}: {current} -> {next}", rule.name);
                next
            }
            None => current,
        }
    })
}
