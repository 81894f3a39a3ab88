use serde::{Deserialize, Deserializer, Serialize};

/// One record of an exchange snapshot.
///
/// Exchanges disagree on how they encode prices: some send numbers, the
/// Binance ticker endpoint sends decimal strings. Both are accepted. A missing,
/// null or unparseable price becomes `None`; it is not an error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExchangeQuote {
    #[serde(default)]
    pub symbol: String,

    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: Option<f64>,
}

impl ExchangeQuote {
    pub fn new(symbol: impl Into<String>, price: Option<f64>) -> Self {
        Self {
            symbol: symbol.into(),
            price,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Number(f64),
    Text(String),
}

fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawPrice>::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawPrice::Number(value)) => Some(value),
        Some(RawPrice::Text(text)) => text.trim().parse::<f64>().ok(),
        None => None,
    })
}
