//! Views derived from a latency snapshot plus the current view settings:
//! visible connections, per-exchange summaries, and JSON/CSV export.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::Write as _;

use crate::geo::{arc_points, great_circle_km};
use crate::latency::{LatencyQuality, LatencyStats};
use crate::models::{CloudRegion, Exchange, HistoricalSeries, LatencySnapshot, Provider};
use crate::registry;
use crate::store::ViewSettings;

/// Arc resolution for rendered connections
const ARC_SEGMENTS: usize = 32;
const ARC_LIFT: f64 = 0.1;

pub const CSV_HEADER: &str = "Exchange,Cloud Provider,Latitude,Longitude,Volume 24h,Current Latency";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub exchange_id: &'static str,
    pub region_id: &'static str,
    pub provider: Provider,
    pub latency: f64,
    pub quality: LatencyQuality,
    pub color: &'static str,
    pub distance_km: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arc: Option<Vec<[f64; 3]>>,
}

/// Exchange/region pairs to draw: both ends visible, same provider, with a
/// latency inside the filter.
pub fn visible_connections(
    snapshot: &LatencySnapshot,
    settings: &ViewSettings,
    with_arcs: bool,
) -> Vec<Connection> {
    let mut out = Vec::new();
    if !settings.show_connections {
        return out;
    }

    let providers = settings.visible_provider_list();
    for exchange in registry::exchanges_for(&providers) {
        for region in registry::regions_for(&providers) {
            if region.provider != exchange.provider {
                continue;
            }
            let Some(latency) = snapshot.get(exchange.id, region.id) else {
                continue;
            };
            if !settings.latency_filter.contains(latency) {
                continue;
            }
            out.push(connection(exchange, region, latency, with_arcs));
        }
    }
    out
}

fn connection(
    exchange: &'static Exchange,
    region: &'static CloudRegion,
    latency: f64,
    with_arc: bool,
) -> Connection {
    let from = (exchange.latitude, exchange.longitude);
    let to = (region.latitude, region.longitude);
    let quality = LatencyQuality::classify(latency);

    Connection {
        exchange_id: exchange.id,
        region_id: region.id,
        provider: exchange.provider,
        latency,
        quality,
        color: quality.color(),
        distance_km: great_circle_km(from.0, from.1, to.0, to.1),
        arc: with_arc.then(|| arc_points(from, to, ARC_SEGMENTS, 1.0, ARC_LIFT)),
    }
}

/// Mean latency over an exchange's pairs, rounded; 0 when it has none
pub fn exchange_latency(snapshot: &LatencySnapshot, exchange_id: &str) -> f64 {
    LatencyStats::for_exchange(snapshot, exchange_id).average.round()
}

/// JSON export document
pub fn export_json(
    snapshot: &LatencySnapshot,
    historical: &HistoricalSeries,
    settings: &ViewSettings,
) -> Value {
    let providers = settings.visible_provider_list();
    json!({
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "settings": {
            "visibleProviders": providers,
            "latencyFilter": settings.latency_filter,
            "selectedExchange": settings.selected_exchange,
        },
        "currentLatencyData": snapshot.values,
        "historicalData": historical,
        "exchanges": registry::exchanges_for(&providers),
        "cloudRegions": registry::regions_for(&providers),
    })
}

/// CSV report: one row per visible exchange
pub fn export_csv(snapshot: &LatencySnapshot, settings: &ViewSettings) -> String {
    let mut out = String::from(CSV_HEADER);
    for exchange in registry::exchanges_for(&settings.visible_provider_list()) {
        let _ = write!(
            out,
            "\n{},{},{},{},{},{}",
            csv_field(exchange.name),
            exchange.provider,
            exchange.latitude,
            exchange.longitude,
            exchange.volume.unwrap_or(0.0),
            exchange_latency(snapshot, exchange.id),
        );
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
