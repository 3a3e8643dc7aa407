//! Media URL rewriting.
//!
//! Payloads recorded against a development backend carry absolute URLs such
//! as `http://localhost:5000/uploads/a.png`. When serving against the hosted
//! backend those are rewritten to the public origin.

use serde_json::Value;

use crate::base::BaseAddress;

#[derive(Debug, Clone)]
pub struct MediaRewriter {
    dev_origins: Vec<String>,
    public_origin: String,
}

impl MediaRewriter {
    #[must_use]
    pub fn new(dev_origins: &[String], public_origin: &str) -> Self {
        Self {
            dev_origins: dev_origins
                .iter()
                .map(|origin| origin.trim_end_matches('/').to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            public_origin: public_origin.trim_end_matches('/').to_string(),
        }
    }

    /// A rewriter for the configured origins, or `None` when running against
    /// a local backend or when there is no public origin to rewrite to.
    #[must_use]
    pub fn for_base(api: &alms_config::ApiConfig, base: &BaseAddress) -> Option<Self> {
        if base.is_local() || api.public_origin.trim().is_empty() {
            return None;
        }
        Some(Self::new(&api.dev_origins, &api.public_origin))
    }

    /// Rewrite every matching string in `value`, recursing through arrays
    /// and objects.
    pub fn rewrite(&self, value: &mut Value) {
        match value {
            Value::String(text) => {
                if let Some(rewritten) = self.rewrite_url(text) {
                    *text = rewritten;
                }
            }
            Value::Array(items) => items.iter_mut().for_each(|item| self.rewrite(item)),
            Value::Object(map) => map.values_mut().for_each(|item| self.rewrite(item)),
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }

    fn rewrite_url(&self, text: &str) -> Option<String> {
        self.dev_origins.iter().find_map(|origin| {
            let rest = text.strip_prefix(origin.as_str())?;
            // `http://localhost:5000` must not match `http://localhost:50001`.
            if rest.is_empty() || rest.starts_with(['/', '?', '#']) {
                Some(format!("{}{rest}", self.public_origin))
            } else {
                None
            }
        })
    }
}
