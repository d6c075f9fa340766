use serde::Serialize;

/// Group code the firmware sends for "scanned product, resolve by barcode".
pub const BARCODE_GROUP: i32 = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoodSource {
    Group(i32),
    Barcode(String),
    MissingBarcode,
}

impl FoodSource {
    pub fn classify(group: i32, ean: Option<String>) -> Self {
        match (group, ean) {
            (BARCODE_GROUP, Some(ean)) => FoodSource::Barcode(ean),
            (BARCODE_GROUP, None) => FoodSource::MissingBarcode,
            (code, _) => FoodSource::Group(code),
        }
    }

    pub fn ean(&self) -> Option<&str> {
        match self {
            FoodSource::Barcode(ean) => Some(ean),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum SkipReason {
    UnknownGroup { group: i32 },
    MissingBarcode,
    ExternalLookupFailed { ean: String, detail: String },
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::UnknownGroup { group } => write!(f, "unknown food group {group}"),
            SkipReason::MissingBarcode => write!(f, "barcode group without ean"),
            SkipReason::ExternalLookupFailed { ean, detail } => {
                write!(f, "lookup for {ean} failed: {detail}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_group_fifty_resolves_by_barcode() {
        assert_eq!(
            FoodSource::classify(50, Some("8410000000001".into())),
            FoodSource::Barcode("8410000000001".into())
        );
        assert_eq!(FoodSource::classify(50, None), FoodSource::MissingBarcode);
        assert_eq!(
            FoodSource::classify(7, Some("8410000000001".into())),
            FoodSource::Group(7)
        );
    }

    #[test]
    fn skip_reason_is_tagged_by_kind() {
        let json = serde_json::to_value(SkipReason::ExternalLookupFailed {
            ean: "123".into(),
            detail: "product not found".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "ExternalLookupFailed");
        assert_eq!(json["ean"], "123");
    }
}
