//! Profile avatar sources: normalization, per-word image resolution with
//! fallbacks, and timed cycling through a set of images.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};

use crate::content::ProfileConfig;
use crate::util::slugify;

pub const DEFAULT_AVATAR: &str = "/images/content/ae.png";
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_millis(3000);

const CONTENT_IMAGE_DIR: &str = "/images/content/";
const IMAGE_EXTENSIONS: [&str; 2] = ["png", "jpg"];

/// Turns a single URL, a list of URLs, or a JSON-encoded list into a list of
/// served paths. `public/...` becomes `/...`; non-strings and empty strings
/// are dropped.
pub fn normalize_image_sources(src: Option<&Value>) -> Vec<String> {
    match src {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .filter_map(normalize_source)
            .collect(),
        Some(Value::String(raw)) if raw.trim_start().starts_with('[') => {
            match serde_json::from_str::<Value>(raw) {
                Ok(parsed @ Value::Array(_)) => normalize_image_sources(Some(&parsed)),
                _ => normalize_source(raw).into_iter().collect(),
            }
        }
        Some(Value::String(raw)) => normalize_source(raw).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn normalize_source(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }
    match raw.strip_prefix("public/") {
        Some(rest) => Some(format!("/{rest}")),
        None => Some(raw.to_owned()),
    }
}

/// Avatar sources for a profile: its own pictures, or the gallery when none
/// are configured or the only picture is a generic content image.
pub fn profile_sources(profile: &ProfileConfig) -> Vec<String> {
    let own = normalize_image_sources(profile.profile_picture_url.as_ref());
    let gallery = profile.gallery.clone();
    if gallery.is_empty() {
        return own;
    }
    match own.as_slice() {
        [] => gallery,
        [only] if only.contains(CONTENT_IMAGE_DIR) => gallery,
        _ => own,
    }
}

/// Finds the image that best matches `word` (typically a person or role
/// name). Tries, in order: the advisor override, the explicit image map, a
/// slug match on file names, token matches, first-name plus last-initial, and
/// finally conventional `/images/content/<slug>` paths present in `sources`.
pub fn find_image_for_word(
    word: &str,
    sources: &[String],
    image_map: &BTreeMap<String, Value>,
) -> Option<String> {
    if word.trim().is_empty() || sources.is_empty() {
        return None;
    }
    let lower = word.to_lowercase();
    let tokens: Vec<&str> = lower.split_whitespace().collect();

    if lower.contains("advisor") || lower.contains("student members") {
        return Some(DEFAULT_AVATAR.to_owned());
    }

    if let Some(found) = lookup_image_map(&lower, &tokens, image_map) {
        return Some(found);
    }

    let slug = slugify(word);
    if let Some(src) = sources.iter().find(|src| slugify(file_stem(src)) == slug) {
        return Some(src.clone());
    }

    for src in sources {
        let name = file_stem(src).to_lowercase();
        for token in &tokens {
            let prefix: String = token.chars().take(4).collect();
            if name.contains(token) || name.contains(&prefix) {
                return Some(src.clone());
            }
        }
    }

    if let [first, second, ..] = tokens.as_slice() {
        let initial = second.chars().next();
        for src in sources {
            let name = file_stem(src).to_lowercase();
            let parts: Vec<&str> = name.split_whitespace().collect();
            if let [head, tail, ..] = parts.as_slice() {
                if head == first && tail.chars().next() == initial {
                    return Some(src.clone());
                }
            }
        }
    }

    slug_candidates(&slug)
        .into_iter()
        .find(|candidate| sources.contains(candidate))
}

fn lookup_image_map(
    lower: &str,
    tokens: &[&str],
    image_map: &BTreeMap<String, Value>,
) -> Option<String> {
    let map: BTreeMap<String, String> = image_map
        .iter()
        .filter_map(|(key, value)| {
            let key = key.trim().to_lowercase();
            let first = normalize_image_sources(Some(value)).into_iter().next()?;
            Some((key, first)).filter(|(key, _)| !key.is_empty())
        })
        .collect();
    if map.is_empty() {
        return None;
    }

    if let Some(src) = map.get(lower).or_else(|| map.get(&tokens.join(" "))) {
        return Some(src.clone());
    }

    map.iter().find_map(|(key, src)| {
        if key.contains(lower) || lower.contains(key.as_str()) {
            return Some(src.clone());
        }
        let key_tokens: Vec<&str> = key.split_whitespace().collect();
        match (key_tokens.as_slice(), tokens) {
            ([k_first, k_second, ..], [first, second, ..])
                if k_first == first && k_second.chars().next() == second.chars().next() =>
            {
                Some(src.clone())
            }
            _ => None,
        }
    })
}

/// Conventional locations for a slug: `<slug>/<slug>.<ext>` then `<slug>.<ext>`.
fn slug_candidates(slug: &str) -> Vec<String> {
    let nested = IMAGE_EXTENSIONS
        .iter()
        .map(|ext| format!("{CONTENT_IMAGE_DIR}{slug}/{slug}.{ext}"));
    let flat = IMAGE_EXTENSIONS
        .iter()
        .map(|ext| format!("{CONTENT_IMAGE_DIR}{slug}.{ext}"));
    nested.chain(flat).collect()
}

/// Images to try, in order, when the primary one fails to load.
pub fn fallback_chain(word: Option<&str>, resolved: Option<&str>) -> Vec<String> {
    match (word, resolved) {
        (Some(word), None) => {
            let mut chain = slug_candidates(&slugify(word));
            chain.push(DEFAULT_AVATAR.to_owned());
            chain
        }
        _ => vec![DEFAULT_AVATAR.to_owned()],
    }
}

fn file_stem(src: &str) -> &str {
    let name = src.rsplit('/').next().unwrap_or(src);
    match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name,
    }
}

/// Position within a list of avatar sources.
#[derive(Debug, Clone)]
pub struct AvatarCycle {
    len: usize,
    index: usize,
}

impl AvatarCycle {
    pub fn new(len: usize) -> Self {
        Self { len, index: 0 }
    }

    /// Moves one position forward, wrapping after the last source.
    pub fn advance(&mut self) -> usize {
        if self.len > 0 {
            self.index = (self.index + 1) % self.len;
        }
        self.index
    }
}

/// Background task advancing an [`AvatarCycle`] once per interval.
///
/// Only runs when there is more than one source. The task is aborted when the
/// ticker is dropped.
pub struct AvatarTicker {
    sources: Arc<Vec<String>>,
    index: watch::Receiver<usize>,
    handle: Option<JoinHandle<()>>,
}

impl AvatarTicker {
    pub fn spawn(sources: Vec<String>, interval: Duration) -> Self {
        let (tx, index) = watch::channel(0usize);
        let handle = if sources.len() > 1 && !interval.is_zero() {
            let mut cycle = AvatarCycle::new(sources.len());
            Some(tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + interval, interval);
                loop {
                    ticker.tick().await;
                    let next = cycle.advance();
                    if tx.send(next).is_err() {
                        break;
                    }
                }
            }))
        } else {
            None
        };

        Self {
            sources: Arc::new(sources),
            index,
            handle,
        }
    }

    /// A ticker that never advances.
    pub fn fixed(sources: Vec<String>) -> Self {
        Self::spawn(sources, Duration::ZERO)
    }

    pub fn is_cycling(&self) -> bool {
        self.handle.is_some()
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }

    pub fn index(&self) -> usize {
        *self.index.borrow()
    }

    pub fn current(&self) -> Option<&str> {
        self.sources.get(self.index()).map(String::as_str)
    }

    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.index.clone()
    }
}

impl Drop for AvatarTicker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
