use serde::{Deserialize, Serialize};

/// A currency available for conversion.
///
/// Loaded once per session from the remote symbol list and treated as
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencySymbol {
    /// ISO 4217 code, e.g. "USD".
    pub code: String,

    /// Human-readable name, e.g. "United States Dollar".
    pub name: String,
}

impl CurrencySymbol {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// Flag emoji for display next to the code.
    pub fn flag(&self) -> String {
        flag_emoji(&self.code)
    }
}

impl std::fmt::Display for CurrencySymbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} — {}", self.code, self.name)
    }
}

/// Flag emoji for a currency code.
///
/// ISO 4217 codes start with the issuing country's ISO 3166 alpha-2 code,
/// so the flag is the two regional-indicator symbols for those letters.
/// Codes without an issuing country (crypto, supranational X-codes) are
/// mapped explicitly; anything else unrecognized gets a white flag.
pub fn flag_emoji(code: &str) -> String {
    let upper = code.to_uppercase();
    match upper.as_str() {
        "BTC" => return "₿".to_string(),
        "EUR" => return "🇪🇺".to_string(),
        "ANG" => return "🇳🇱".to_string(), // Netherlands Antilles guilder
        "XAF" => return "🇨🇲".to_string(), // Central African CFA franc
        "XOF" => return "🇨🇮".to_string(), // West African CFA franc
        "XCD" => return "🇦🇬".to_string(), // East Caribbean dollar
        "XPF" => return "🇵🇫".to_string(), // CFP franc
        _ => {}
    }

    let mut chars = upper.chars();
    match (chars.next(), chars.next()) {
        (Some(a), Some(b)) if a.is_ascii_uppercase() && b.is_ascii_uppercase() => {
            const REGIONAL_INDICATOR_A: u32 = 0x1F1E6;
            let to_indicator = |c: char| {
                char::from_u32(REGIONAL_INDICATOR_A + (c as u32 - 'A' as u32)).unwrap_or('🏳')
            };
            format!("{}{}", to_indicator(a), to_indicator(b))
        }
        _ => "🏳️".to_string(),
    }
}
