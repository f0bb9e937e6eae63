//! Text-level rewriting of fetched entry pages so a snapshot can be viewed offline.

use std::collections::HashSet;
use std::sync::LazyLock;

use log::warn;
use regex::{Captures, Regex};
use url::Url;

use crate::error::ArchiveError;
use crate::naming::sanitize_filename;

static ROOT_RELATIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?P<name>src|href)="(?P<value>/[^"]*)""#).expect("valid regex"));
static IMG_SRC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?is)<img\b[^>]*?\bsrc="([^"]*)""#).expect("valid regex"));

/// Rewrites `src="/..."` and `href="/..."` to absolute URLs under `base`.
/// Values that fail to resolve are left untouched.
pub fn absolutize_root_relative(html: &str, base: &Url) -> String {
    ROOT_RELATIVE
        .replace_all(html, |caps: &Captures| {
            let name = &caps["name"];
            let value = &caps["value"];
            match base.join(value) {
                Ok(resolved) => format!("{}=\"{}\"", name, resolved),
                Err(source) => {
                    let e = ArchiveError::UrlResolution {
                        href: value.to_string(),
                        base: base.to_string(),
                        source,
                    };
                    warn!("{}", e);
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

/// Distinct `<img src>` values mentioning `.jpg`, in document order.
pub fn jpeg_references(html: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    IMG_SRC
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|src| src.contains(".jpg"))
        .filter(|src| seen.insert(*src))
        .map(str::to_string)
        .collect()
}

/// Unescaped last path segment, safe to use as a file name.
pub fn image_file_name(image_url: &Url) -> Option<String> {
    let segment = image_url.path_segments()?.last()?;
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    let name = sanitize_filename(&decoded);
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Points every `="<reference>"` attribute value at `file_name` instead.
pub fn localize_reference(html: &str, reference: &str, file_name: &str) -> String {
    html.replace(
        &format!("=\"{}\"", reference),
        &format!("=\"{}\"", file_name),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://blog.example/").unwrap()
    }

    #[test]
    fn test_absolutize_root_relative() {
        let html = r#"<link href="/css/site.css"><img src="/img/a.png"><a href="e/relative">x</a><a href="http://other.example/x">y</a>"#;
        let rewritten = absolutize_root_relative(html, &base());
        assert_eq!(
            rewritten,
            r#"<link href="http://blog.example/css/site.css"><img src="http://blog.example/img/a.png"><a href="e/relative">x</a><a href="http://other.example/x">y</a>"#
        );
    }

    #[test]
    fn test_protocol_relative_uses_base_scheme() {
        let rewritten = absolutize_root_relative(r#"<script src="//cdn.example/x.js">"#, &base());
        assert_eq!(rewritten, r#"<script src="http://cdn.example/x.js">"#);
    }

    #[test]
    fn test_unresolvable_value_is_kept() {
        let html = r#"<a href="//[bad">x</a>"#;
        assert_eq!(absolutize_root_relative(html, &base()), html);
    }

    #[test]
    fn test_jpeg_references() {
        let html = r#"
            <img class="pict" src="http://img.example/u/photo.jpg" alt="">
            <img src="http://img.example/u/icon.png">
            <IMG
              width="10" src="http://img.example/u/photo.jpg">
            <img src="http://img.example/u/other.jpg?size=l">
        "#;
        assert_eq!(
            jpeg_references(html),
            vec![
                "http://img.example/u/photo.jpg".to_string(),
                "http://img.example/u/other.jpg?size=l".to_string(),
            ]
        );
    }

    #[test]
    fn test_image_file_name() {
        let url = Url::parse("http://img.example/u/%E5%86%99%E7%9C%9F.jpg?x=1").unwrap();
        assert_eq!(image_file_name(&url), Some("写真.jpg".to_string()));

        let url = Url::parse("http://img.example/").unwrap();
        assert_eq!(image_file_name(&url), None);
    }

    #[test]
    fn test_localize_reference() {
        let html = r#"<img src="http://img.example/u/photo.jpg"><img src="http://img.example/u/photo.jpg2">"#;
        assert_eq!(
            localize_reference(html, "http://img.example/u/photo.jpg", "photo.jpg"),
            r#"<img src="photo.jpg"><img src="http://img.example/u/photo.jpg2">"#
        );
    }
}
