//! Static exchange and cloud-region tables
//!
//! Loaded once, never mutated. Everything downstream refers to locations by id.

use crate::models::{CloudRegion, Exchange, Provider};

const fn new_exchange(
    id: &'static str,
    name: &'static str,
    latitude: f64,
    longitude: f64,
    provider: Provider,
    region: &'static str,
    volume: f64,
) -> Exchange {
    Exchange {
        id,
        name,
        latitude,
        longitude,
        provider,
        region,
        volume: Some(volume),
    }
}

const fn new_region(
    id: &'static str,
    region_name: &'static str,
    provider: Provider,
    latitude: f64,
    longitude: f64,
    server_count: u32,
) -> CloudRegion {
    CloudRegion {
        id,
        region_name,
        provider,
        latitude,
        longitude,
        server_count,
    }
}

static EXCHANGES: [Exchange; 13] = [
    new_exchange("binance-us-east", "Binance US-East", 39.0458, -76.6413, Provider::Aws, "us-east-1", 2_500_000_000.0),
    new_exchange("binance-eu-west", "Binance EU-West", 53.4084, -2.9916, Provider::Aws, "eu-west-1", 1_800_000_000.0),
    new_exchange("binance-asia-singapore", "Binance Asia-Singapore", 1.3521, 103.8198, Provider::Aws, "ap-southeast-1", 3_200_000_000.0),
    new_exchange("okx-hong-kong", "OKX Hong Kong", 22.3193, 114.1694, Provider::Gcp, "asia-east2", 1_500_000_000.0),
    new_exchange("okx-us-central", "OKX US-Central", 41.2619, -95.8608, Provider::Gcp, "us-central1", 950_000_000.0),
    new_exchange("bybit-singapore", "Bybit Singapore", 1.3521, 103.8198, Provider::Azure, "southeastasia", 1_200_000_000.0),
    new_exchange("bybit-london", "Bybit London", 51.5074, -0.1278, Provider::Azure, "uksouth", 800_000_000.0),
    new_exchange("deribit-netherlands", "Deribit Netherlands", 52.3676, 4.9041, Provider::Aws, "eu-west-1", 650_000_000.0),
    new_exchange("coinbase-us-west", "Coinbase US-West", 37.7749, -122.4194, Provider::Gcp, "us-west1", 2_100_000_000.0),
    new_exchange("kraken-germany", "Kraken Germany", 50.1109, 8.6821, Provider::Azure, "germanywestcentral", 750_000_000.0),
    new_exchange("bitfinex-tokyo", "Bitfinex Tokyo", 35.6762, 139.6503, Provider::Aws, "ap-northeast-1", 450_000_000.0),
    new_exchange("huobi-seoul", "Huobi Seoul", 37.5665, 126.9780, Provider::Gcp, "asia-northeast3", 680_000_000.0),
    new_exchange("kucoin-australia", "KuCoin Australia", -33.8688, 151.2093, Provider::Azure, "australiaeast", 520_000_000.0),
];

static REGIONS: [CloudRegion; 17] = [
    new_region("aws-us-east-1", "US East (N. Virginia)", Provider::Aws, 38.9072, -77.0369, 15),
    new_region("aws-us-west-2", "US West (Oregon)", Provider::Aws, 45.5152, -122.6784, 12),
    new_region("aws-eu-west-1", "Europe (Ireland)", Provider::Aws, 53.4084, -8.2439, 14),
    new_region("aws-ap-southeast-1", "Asia Pacific (Singapore)", Provider::Aws, 1.3521, 103.8198, 10),
    new_region("aws-ap-northeast-1", "Asia Pacific (Tokyo)", Provider::Aws, 35.6762, 139.6503, 11),
    new_region("gcp-us-central1", "US Central (Iowa)", Provider::Gcp, 41.5868, -93.6250, 13),
    new_region("gcp-us-west1", "US West (Oregon)", Provider::Gcp, 45.5152, -122.6784, 9),
    new_region("gcp-europe-west1", "Europe West (Belgium)", Provider::Gcp, 50.8503, 4.3517, 8),
    new_region("gcp-asia-east2", "Asia East (Hong Kong)", Provider::Gcp, 22.3193, 114.1694, 7),
    new_region("gcp-asia-northeast3", "Asia Northeast (Seoul)", Provider::Gcp, 37.5665, 126.9780, 6),
    new_region("azure-eastus", "East US (Virginia)", Provider::Azure, 37.3382, -79.0193, 11),
    new_region("azure-westus2", "West US 2 (Washington)", Provider::Azure, 47.7511, -120.7401, 8),
    new_region("azure-northeurope", "North Europe (Ireland)", Provider::Azure, 53.3478, -6.2597, 9),
    new_region("azure-southeastasia", "Southeast Asia (Singapore)", Provider::Azure, 1.3521, 103.8198, 7),
    new_region("azure-uksouth", "UK South (London)", Provider::Azure, 51.5074, -0.1278, 6),
    new_region("azure-australiaeast", "Australia East (Sydney)", Provider::Azure, -33.8688, 151.2093, 5),
    new_region("azure-germanywestcentral", "Germany West Central (Frankfurt)", Provider::Azure, 50.1109, 8.6821, 7),
];

/// Regions the adapter maps upstream series onto. A subset of [`regions`].
const ADAPTER_REGION_IDS: [&str; 12] = [
    "aws-us-east-1",
    "aws-us-west-2",
    "aws-eu-west-1",
    "aws-ap-southeast-1",
    "gcp-us-central1",
    "gcp-us-west1",
    "gcp-europe-west1",
    "gcp-asia-east2",
    "azure-eastus",
    "azure-westus2",
    "azure-northeurope",
    "azure-southeastasia",
];

pub fn exchanges() -> &'static [Exchange] {
    &EXCHANGES
}

pub fn regions() -> &'static [CloudRegion] {
    &REGIONS
}

pub fn exchange(id: &str) -> Option<&'static Exchange> {
    EXCHANGES.iter().find(|e| e.id == id)
}

pub fn region(id: &str) -> Option<&'static CloudRegion> {
    REGIONS.iter().find(|r| r.id == id)
}

pub fn exchange_ids() -> Vec<&'static str> {
    EXCHANGES.iter().map(|e| e.id).collect()
}

pub fn region_ids() -> Vec<&'static str> {
    REGIONS.iter().map(|r| r.id).collect()
}

pub fn adapter_region_ids() -> Vec<&'static str> {
    ADAPTER_REGION_IDS.to_vec()
}

pub fn exchanges_for(providers: &[Provider]) -> Vec<&'static Exchange> {
    EXCHANGES
        .iter()
        .filter(|e| providers.contains(&e.provider))
        .collect()
}

pub fn regions_for(providers: &[Provider]) -> Vec<&'static CloudRegion> {
    REGIONS
        .iter()
        .filter(|r| providers.contains(&r.provider))
        .collect()
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct SearchResults {
    pub exchanges: Vec<&'static Exchange>,
    pub regions: Vec<&'static CloudRegion>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty() && self.regions.is_empty()
    }
}

/// Case-insensitive substring search. Blank terms match nothing.
pub fn search(term: &str) -> SearchResults {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return SearchResults::default();
    }

    let exchanges = EXCHANGES
        .iter()
        .filter(|e| {
            e.name.to_lowercase().contains(&needle)
                || e.provider.as_str().to_lowercase().contains(&needle)
                || e.region.to_lowercase().contains(&needle)
        })
        .collect();

    let regions = REGIONS
        .iter()
        .filter(|r| {
            r.region_name.to_lowercase().contains(&needle)
                || r.provider.as_str().to_lowercase().contains(&needle)
        })
        .collect();

    SearchResults { exchanges, regions }
}
