//! URL templating: split one sample page URL into a reusable prefix/suffix.
//!
//! Page-image servers of the BookReader kind name every page
//! `..._NNNN.<ext>&<query>`. Given one such URL we keep everything before the
//! 4-digit index as the prefix and everything after it as the suffix. Any
//! `scale=` / `rotate=` parameters are lifted out of the suffix and
//! remembered, so each synthesized URL carries exactly one of each: the
//! caller's value when given, the sample's otherwise.

use crate::error::Pages2PdfError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Greedy prefix so the *last* `_NNNN` wins; the index must not run into
/// a fifth digit.
static INDEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*_)(\d{4})(\D.*)?$").expect("valid regex"));

static SCALE_ROTATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([?&])(scale|rotate)=(\d+)(?:$|[&#])").expect("valid regex")
});

/// Prefix/suffix pair derived from a sample URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    pub prefix: String,
    pub suffix: String,
    /// `scale=` value found in the sample URL.
    pub sample_scale: Option<u32>,
    /// `rotate=` value found in the sample URL.
    pub sample_rotate: Option<u32>,
}

impl UrlTemplate {
    /// Derive a template from a sample page URL.
    ///
    /// # Errors
    /// [`Pages2PdfError::MalformedUrl`] when the URL has no `_NNNN` index.
    pub fn derive(sample_url: &str) -> Result<Self, Pages2PdfError> {
        let caps = INDEX_RE
            .captures(sample_url)
            .ok_or_else(|| Pages2PdfError::MalformedUrl {
                url: sample_url.to_string(),
            })?;

        let prefix = caps[1].to_string();
        let raw_suffix = caps.get(3).map_or("", |m| m.as_str());
        let (suffix, sample_scale, sample_rotate) = strip_scale_rotate(raw_suffix);

        Ok(Self {
            prefix,
            suffix,
            sample_scale,
            sample_rotate,
        })
    }

    /// Synthesize the URL for `page`.
    ///
    /// `scale` / `rotate` override the sample's values; `None` keeps them.
    pub fn url_for(&self, page: u32, scale: Option<u32>, rotate: Option<u32>) -> String {
        let mut url = format!("{}{:04}{}", self.prefix, page, self.suffix);
        let params = [
            ("scale", scale.or(self.sample_scale)),
            ("rotate", rotate.or(self.sample_rotate)),
        ];
        for (key, value) in params {
            if let Some(v) = value {
                let sep = if url.contains('?') { '&' } else { '?' };
                url.push(sep);
                url.push_str(&format!("{key}={v}"));
            }
        }
        url
    }
}

/// Remove every `scale=`/`rotate=` parameter from `suffix`, returning the
/// cleaned suffix and the last value seen for each.
///
/// When the first query parameter goes, the `?` moves onto the next one
/// that survives.
fn strip_scale_rotate(suffix: &str) -> (String, Option<u32>, Option<u32>) {
    let mut out = String::with_capacity(suffix.len());
    let mut scale = None;
    let mut rotate = None;
    let mut query_opened_by_removed = false;
    let mut pos = 0;

    // The terminator is matched but not consumed, so adjacent parameters
    // are found one after another.
    while let Some(caps) = SCALE_ROTATE_RE.captures_at(suffix, pos) {
        let Some(whole) = caps.get(0) else { break };
        let start = whole.start();
        let end = caps.get(3).map_or(whole.end(), |m| m.end());

        push_kept(&mut out, &suffix[pos..start], &mut query_opened_by_removed);
        if &caps[1] == "?" {
            query_opened_by_removed = true;
        }
        let value = caps[3].parse::<u32>().ok();
        match &caps[2] {
            "scale" => scale = value.or(scale),
            _ => rotate = value.or(rotate),
        }
        pos = end;
    }
    push_kept(&mut out, &suffix[pos..], &mut query_opened_by_removed);

    (out, scale, rotate)
}

fn push_kept(out: &mut String, chunk: &str, query_opened_by_removed: &mut bool) {
    if chunk.is_empty() {
        return;
    }
    match chunk.strip_prefix('&') {
        Some(rest) if *query_opened_by_removed => {
            out.push('?');
            out.push_str(rest);
        }
        _ => out.push_str(chunk),
    }
    *query_opened_by_removed = false;
}
