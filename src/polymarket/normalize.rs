//! Field-alias tables and coercion rules that turn loosely-typed upstream
//! items into [`TradeRecord`]s.
//!
//! Every source describes its schema as an [`AliasTable`]: for each canonical
//! field an ordered list of paths into the upstream JSON object. The first
//! path that resolves to a present value wins.
//!
//! Coercion never fails. A bad or missing amount becomes [`DEFAULT_AMOUNT`];
//! a bad or missing timestamp becomes the `now` passed by the caller.

use serde_json::Value;

use crate::models::TradeRecord;

/// Amount used when the upstream value is missing or not a number.
pub const DEFAULT_AMOUNT: f64 = 0.0;

/// Scale factor for 6-decimal fixed-point assets (USDC base units).
pub const USDC_BASE_UNITS: f64 = 1_000_000.0;

/// Integer timestamps above this are milliseconds.
const MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Path of keys into a nested JSON object, outermost first.
pub type FieldPath = &'static [&'static str];

/// Ordered alias rules for one upstream schema.
#[derive(Debug, Clone, Copy)]
pub struct AliasTable {
    pub tx_hash: &'static [FieldPath],
    pub wallet: &'static [FieldPath],
    /// Candidate locations of a nested market object (`{ id, title|name }`).
    pub market_object: &'static [FieldPath],
    /// Flat market id fields, used when no market object is present.
    pub market_id: &'static [FieldPath],
    /// Flat market name fields, used when no market object is present.
    pub market_name: &'static [FieldPath],
    pub amount: &'static [FieldPath],
    pub timestamp: &'static [FieldPath],
    /// Divide integer amounts by this factor.
    pub amount_scale: Option<f64>,
    /// Ids shaped like `<tx>_<suffix>` carry the transaction hash as prefix.
    pub split_tx_suffix: bool,
    /// No title upstream: reuse the market id as the display name.
    pub name_from_market_id: bool,
}

const MARKET_OBJECT_ID: &[FieldPath] = &[&["id"]];
const MARKET_OBJECT_NAME: &[FieldPath] = &[&["title"], &["name"]];

/// Records that already use the canonical field names.
pub const CANONICAL: AliasTable = AliasTable {
    tx_hash: &[&["tx_hash"], &["txHash"]],
    wallet: &[&["wallet"]],
    market_object: &[&["market"]],
    market_id: &[&["market_id"], &["marketId"]],
    market_name: &[&["market_name"]],
    amount: &[&["amount_usdc"], &["amount"]],
    timestamp: &[&["timestamp"]],
    amount_scale: None,
    split_tx_suffix: false,
    name_from_market_id: false,
};

/// Gamma-style fills/trades.
pub const GAMMA: AliasTable = AliasTable {
    tx_hash: &[&["txHash"], &["tx_hash"], &["id"], &["txhash"]],
    wallet: &[&["trader"], &["wallet"], &["actor"], &["owner"]],
    market_object: &[&["market"], &["outcome", "market"]],
    market_id: &[&["market"], &["market_id"], &["marketId"]],
    market_name: &[],
    amount: &[&["amountUsd"], &["amount"], &["value"]],
    timestamp: &[&["createdAt"], &["timestamp"], &["time"]],
    amount_scale: None,
    split_tx_suffix: false,
    name_from_market_id: false,
};

/// Reduced set for a user-supplied generic query.
pub const GENERIC: AliasTable = AliasTable {
    tx_hash: &[&["txHash"], &["id"]],
    wallet: &[&["trader"], &["wallet"]],
    market_object: &[&["market"]],
    market_id: &[],
    market_name: &[],
    amount: &[&["amountUsd"], &["amount"]],
    timestamp: &[&["createdAt"], &["timestamp"]],
    amount_scale: None,
    split_tx_suffix: false,
    name_from_market_id: false,
};

/// Resolve a single path. Null and empty strings count as absent.
fn lookup<'a>(item: &'a Value, path: FieldPath) -> Option<&'a Value> {
    let mut cur = item;
    for key in path {
        cur = cur.get(key)?;
    }
    match cur {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        v => Some(v),
    }
}

/// First present value among `paths`.
pub fn first_present<'a>(item: &'a Value, paths: &[FieldPath]) -> Option<&'a Value> {
    paths.iter().find_map(|p| lookup(item, p))
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_string(item: &Value, paths: &[FieldPath]) -> Option<String> {
    paths
        .iter()
        .filter_map(|p| lookup(item, p))
        .find_map(scalar_to_string)
}

/// Coerce an upstream amount to a non-negative float.
///
/// With `scale`, integer values (or integer strings) are base units and get
/// divided; anything else is parsed as a plain float, unscaled.
pub fn coerce_amount(value: Option<&Value>, scale: Option<f64>) -> f64 {
    let Some(v) = value else {
        return DEFAULT_AMOUNT;
    };

    let scaled = scale.and_then(|factor| {
        let units = match v {
            Value::Number(n) => n.as_u64().map(|u| u as f64),
            Value::String(s) => s.trim().parse::<u128>().ok().map(|u| u as f64),
            _ => None,
        };
        units.map(|u| u / factor)
    });

    let amount = scaled.or_else(|| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    });

    match amount {
        Some(a) if a.is_finite() && a >= 0.0 => a,
        _ => DEFAULT_AMOUNT,
    }
}

/// Coerce an upstream timestamp to Unix seconds, falling back to `now`.
pub fn coerce_timestamp(value: Option<&Value>, now: i64) -> i64 {
    let secs = value.and_then(|v| match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    });

    match secs {
        Some(ts) if ts > MILLIS_THRESHOLD => ts / 1000,
        Some(ts) => ts,
        None => now,
    }
}

/// Map one upstream item through `table`.
pub fn normalize_item(item: &Value, table: &AliasTable, now: i64) -> TradeRecord {
    let mut tx_hash = first_string(item, table.tx_hash);
    if table.split_tx_suffix {
        tx_hash = tx_hash.map(|id| match id.split_once('_') {
            Some((tx, _)) => tx.to_string(),
            None => id,
        });
    }

    let market = table
        .market_object
        .iter()
        .filter_map(|p| lookup(item, p))
        .find(|v| v.is_object());

    let (market_id, mut market_name) = match market {
        Some(obj) => (
            first_string(obj, MARKET_OBJECT_ID),
            first_string(obj, MARKET_OBJECT_NAME),
        ),
        None => (
            first_string(item, table.market_id),
            first_string(item, table.market_name),
        ),
    };
    if table.name_from_market_id && market_name.is_none() {
        market_name = market_id.clone();
    }

    TradeRecord {
        tx_hash,
        wallet: first_string(item, table.wallet),
        market_id,
        market_name,
        amount_usdc: coerce_amount(first_present(item, table.amount), table.amount_scale),
        timestamp: coerce_timestamp(first_present(item, table.timestamp), now),
    }
}

fn nonempty_array(v: &Value) -> Option<&Vec<Value>> {
    v.as_array().filter(|a| !a.is_empty())
}

/// First list-valued field of an object, kept only when non-empty.
fn first_array(obj: &serde_json::Map<String, Value>) -> Option<&Vec<Value>> {
    obj.values()
        .find_map(Value::as_array)
        .filter(|a| !a.is_empty())
}

/// Find the first list-valued field in a `data` payload. When that list is
/// empty or absent, look one level deeper at the first list of each nested
/// object. An empty first list never falls through to a later sibling.
pub fn find_first_list(data: &Value) -> Option<&Vec<Value>> {
    let root = data.as_object()?;
    first_array(root).or_else(|| {
        root.values()
            .filter_map(Value::as_object)
            .find_map(first_array)
    })
}

/// Acceptance predicate for a query response: a `data` object holding at
/// least one non-empty list field.
pub fn has_nonempty_list(response: &Value) -> bool {
    response
        .get("data")
        .and_then(Value::as_object)
        .is_some_and(|data| data.values().any(|v| nonempty_array(v).is_some()))
}

/// True for identifiers like `0x4bfb…`, i.e. no human-readable title.
pub fn is_address_like(name: &str) -> bool {
    name.starts_with("0x") || name.starts_with("0X")
}

// ---------------------------------------------------------------------------
// Keyword allow-list
// ---------------------------------------------------------------------------

/// Case-insensitive substring allow-list over market display names.
///
/// Unknown names (missing, or address-like) are always retained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl KeywordFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Parse a comma-separated keyword list.
    pub fn parse(csv: &str) -> Self {
        Self::new(csv.split(','))
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn retains(&self, market_name: Option<&str>) -> bool {
        if self.keywords.is_empty() {
            return true;
        }
        match market_name {
            None => true,
            Some(name) if is_address_like(name) => true,
            Some(name) => {
                let name = name.to_lowercase();
                self.keywords.iter().any(|kw| name.contains(kw.as_str()))
            }
        }
    }

    pub fn apply(&self, trades: Vec<TradeRecord>) -> Vec<TradeRecord> {
        if self.keywords.is_empty() {
            return trades;
        }
        trades
            .into_iter()
            .filter(|t| self.retains(t.market_name.as_deref()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
