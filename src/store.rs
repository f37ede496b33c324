//! Presentation settings shared by the API handlers
//!
//! A cloneable handle over one `ViewSettings` value. Every mutation bumps a
//! watch channel so subscribers see the latest settings.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::watch;

use crate::models::Provider;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyFilter {
    pub min: f64,
    pub max: f64,
}

impl Default for LatencyFilter {
    fn default() -> Self {
        Self { min: 0.0, max: 200.0 }
    }
}

impl LatencyFilter {
    pub fn new(min: f64, max: f64) -> Result<Self, String> {
        if !min.is_finite() || !max.is_finite() {
            return Err("latency filter bounds must be finite".into());
        }
        if min < 0.0 || max < 0.0 {
            return Err("latency filter bounds must not be negative".into());
        }
        if min > max {
            return Err(format!("latency filter min {min} exceeds max {max}"));
        }
        Ok(Self { min, max })
    }

    pub fn contains(&self, latency_ms: f64) -> bool {
        latency_ms >= self.min && latency_ms <= self.max
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewSettings {
    pub selected_exchange: Option<String>,
    pub visible_providers: BTreeSet<Provider>,
    pub show_connections: bool,
    pub show_latency_chart: bool,
    pub latency_filter: LatencyFilter,
    pub search_term: String,
    pub dark_mode: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            selected_exchange: None,
            visible_providers: Provider::ALL.into_iter().collect(),
            show_connections: true,
            show_latency_chart: false,
            latency_filter: LatencyFilter::default(),
            search_term: String::new(),
            dark_mode: true,
        }
    }
}

impl ViewSettings {
    pub fn is_visible(&self, provider: Provider) -> bool {
        self.visible_providers.contains(&provider)
    }

    pub fn visible_provider_list(&self) -> Vec<Provider> {
        self.visible_providers.iter().copied().collect()
    }
}

/// Partial update accepted by `POST /api/view`
///
/// `selectedExchange: null` clears the selection; an absent field leaves it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewPatch {
    #[serde(default, deserialize_with = "double_option")]
    pub selected_exchange: Option<Option<String>>,
    pub visible_providers: Option<Vec<Provider>>,
    pub show_connections: Option<bool>,
    pub show_latency_chart: Option<bool>,
    pub latency_filter: Option<LatencyFilter>,
    pub search_term: Option<String>,
    pub dark_mode: Option<bool>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

#[derive(Clone)]
pub struct ViewStore {
    settings: Arc<RwLock<ViewSettings>>,
    changes: Arc<watch::Sender<ViewSettings>>,
}

impl Default for ViewStore {
    fn default() -> Self {
        Self::new(ViewSettings::default())
    }
}

impl ViewStore {
    pub fn new(initial: ViewSettings) -> Self {
        let (changes, _) = watch::channel(initial.clone());
        Self {
            settings: Arc::new(RwLock::new(initial)),
            changes: Arc::new(changes),
        }
    }

    pub fn snapshot(&self) -> ViewSettings {
        self.settings.read().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewSettings> {
        self.changes.subscribe()
    }

    fn update<T>(&self, f: impl FnOnce(&mut ViewSettings) -> T) -> T {
        let mut settings = self.settings.write();
        let out = f(&mut settings);
        self.changes.send_replace(settings.clone());
        out
    }

    pub fn select_exchange(&self, exchange_id: Option<String>) {
        self.update(|s| s.selected_exchange = exchange_id);
    }

    /// Flip one provider's visibility; returns whether it is now visible
    pub fn toggle_provider(&self, provider: Provider) -> bool {
        self.update(|s| {
            if !s.visible_providers.remove(&provider) {
                s.visible_providers.insert(provider);
                true
            } else {
                false
            }
        })
    }

    pub fn set_show_connections(&self, show: bool) {
        self.update(|s| s.show_connections = show);
    }

    pub fn set_show_latency_chart(&self, show: bool) {
        self.update(|s| s.show_latency_chart = show);
    }

    pub fn set_latency_filter(&self, min: f64, max: f64) -> Result<(), String> {
        let filter = LatencyFilter::new(min, max)?;
        self.update(|s| s.latency_filter = filter);
        Ok(())
    }

    pub fn set_search_term(&self, term: impl Into<String>) {
        let term = term.into();
        self.update(|s| s.search_term = term);
    }

    pub fn toggle_dark_mode(&self) -> bool {
        self.update(|s| {
            s.dark_mode = !s.dark_mode;
            s.dark_mode
        })
    }

    /// Validate the whole patch, then apply it in one write
    pub fn apply(&self, patch: ViewPatch) -> Result<ViewSettings, String> {
        let filter = patch
            .latency_filter
            .map(|f| LatencyFilter::new(f.min, f.max))
            .transpose()?;
        if let Some(Some(id)) = &patch.selected_exchange {
            if crate::registry::exchange(id).is_none() {
                return Err(format!("unknown exchange: {id}"));
            }
        }

        Ok(self.update(|s| {
            if let Some(selected) = patch.selected_exchange {
                s.selected_exchange = selected;
            }
            if let Some(providers) = patch.visible_providers {
                s.visible_providers = providers.into_iter().collect();
            }
            if let Some(v) = patch.show_connections {
                s.show_connections = v;
            }
            if let Some(v) = patch.show_latency_chart {
                s.show_latency_chart = v;
            }
            if let Some(f) = filter {
                s.latency_filter = f;
            }
            if let Some(term) = patch.search_term {
                s.search_term = term;
            }
            if let Some(v) = patch.dark_mode {
                s.dark_mode = v;
            }
            s.clone()
        }))
    }
}
