use anyhow::{Context, Result};
use serde_yaml::Value;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use crate::model::Page;

const EN_MESSAGES: &str = include_str!("../locales/en.yaml");
const RU_MESSAGES: &str = include_str!("../locales/ru.yaml");

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum Locale {
    #[default]
    En,
    Ru,
}

impl Locale {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "en" => Some(Self::En),
            "ru" => Some(Self::Ru),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ru => "ru",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::En => Self::Ru,
            Self::Ru => Self::En,
        }
    }

    fn bundle_source(self) -> &'static str {
        match self {
            Self::En => EN_MESSAGES,
            Self::Ru => RU_MESSAGES,
        }
    }
}

impl Display for Locale {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum RouteOutcome {
    Render { locale: Locale, page: Page },
    Redirect(String),
    NotFound { path: String },
}

/// Resolves a dashboard path such as `/ru/pods/web-1/metrics`.
///
/// Paths without a locale prefix redirect to the default locale. A leading
/// segment shaped like a language tag that is not supported is not found.
pub fn resolve_path(path: &str) -> RouteOutcome {
    let segments = path
        .trim()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>();

    let Some((first, rest)) = segments.split_first() else {
        return RouteOutcome::Redirect(format!("/{}", Locale::default().tag()));
    };

    if let Some(locale) = Locale::from_tag(first) {
        return match page_for(rest) {
            Some(page) => RouteOutcome::Render { locale, page },
            None => RouteOutcome::NotFound {
                path: path.trim().to_string(),
            },
        };
    }

    if looks_like_locale_tag(first) {
        return RouteOutcome::NotFound {
            path: path.trim().to_string(),
        };
    }

    RouteOutcome::Redirect(format!(
        "/{}/{}",
        Locale::default().tag(),
        segments.join("/")
    ))
}

pub fn localized_path(locale: Locale, page: &Page) -> String {
    match page.path().as_str() {
        "/" => format!("/{}", locale.tag()),
        path => format!("/{}{}", locale.tag(), path),
    }
}

fn looks_like_locale_tag(segment: &str) -> bool {
    segment.len() == 2 && segment.chars().all(|c| c.is_ascii_lowercase())
}

fn page_for(segments: &[&str]) -> Option<Page> {
    match segments {
        [] | ["nodes"] => Some(Page::Nodes),
        ["pods"] => Some(Page::Pods),
        ["events"] => Some(Page::Events),
        ["alerts"] => Some(Page::Alerts),
        ["nodes", node, "metrics"] => Some(Page::NodeMetrics {
            node: node.to_string(),
        }),
        ["pods", pod, "metrics"] => Some(Page::PodMetrics {
            pod: pod.to_string(),
        }),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct Messages {
    locale: Locale,
    entries: HashMap<String, String>,
}

impl Messages {
    pub fn load(locale: Locale) -> Result<Self> {
        let root: Value = serde_yaml::from_str(locale.bundle_source())
            .with_context(|| format!("failed to parse message bundle '{locale}'"))?;
        let mut entries = HashMap::new();
        flatten_into(&mut entries, String::new(), &root);
        Ok(Self { locale, entries })
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn t(&self, key: &str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    pub fn t_with(&self, key: &str, args: &[(&str, &str)]) -> String {
        args.iter()
            .fold(self.t(key), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }
}

fn flatten_into(entries: &mut HashMap<String, String>, prefix: String, value: &Value) {
    match value {
        Value::Mapping(mapping) => {
            for (key, child) in mapping {
                let Some(key) = key.as_str() else {
                    continue;
                };
                let path = if prefix.is_empty() {
                    key.to_string()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten_into(entries, path, child);
            }
        }
        Value::String(text) => {
            entries.insert(prefix, text.clone());
        }
        Value::Number(number) => {
            entries.insert(prefix, number.to_string());
        }
        Value::Bool(flag) => {
            entries.insert(prefix, flag.to_string());
        }
        _ => {}
    }
}
