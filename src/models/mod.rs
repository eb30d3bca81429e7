use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Column order of every structured listing table
pub const LISTING_FIELDS: [&str; 6] = ["name", "location", "price", "bedrooms", "bathrooms", "area"];

/// One normalized property listing, as written to CSV
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingRecord {
    pub name: String,
    pub location: String,
    pub price: String,
    pub bedrooms: String,
    pub bathrooms: String,
    pub area: String,
}

impl ListingRecord {
    /// Build a record from a loosely-typed JSON object.
    ///
    /// Only the six listing fields are read. Absent or null fields become an
    /// empty string, everything else is stringified as-is.
    pub fn from_object(object: &Map<String, Value>) -> Self {
        let field = |key: &str| object.get(key).map(stringify).unwrap_or_default();

        Self {
            name: field("name"),
            location: field("location"),
            price: field("price"),
            bedrooms: field("bedrooms"),
            bathrooms: field("bathrooms"),
            area: field("area"),
        }
    }

    /// Values in `LISTING_FIELDS` order
    pub fn values(&self) -> [&str; 6] {
        [
            &self.name,
            &self.location,
            &self.price,
            &self.bedrooms,
            &self.bathrooms,
            &self.area,
        ]
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        // Numbers, booleans, nested arrays and objects keep their JSON text
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let record = ListingRecord::from_object(&object(json!({
            "name": "Flat A",
            "location": "NYC"
        })));

        assert_eq!(
            record,
            ListingRecord {
                name: "Flat A".to_string(),
                location: "NYC".to_string(),
                ..Default::default()
            }
        );
    }

    #[test]
    fn non_string_values_are_stringified() {
        let record = ListingRecord::from_object(&object(json!({
            "name": "Loft",
            "price": 250000,
            "bedrooms": 2.5,
            "bathrooms": null,
            "area": ["120", "m2"],
            "location": true
        })));

        assert_eq!(record.price, "250000");
        assert_eq!(record.bedrooms, "2.5");
        assert_eq!(record.bathrooms, "");
        assert_eq!(record.area, r#"["120","m2"]"#);
        assert_eq!(record.location, "true");
    }

    #[test]
    fn extra_fields_are_ignored() {
        let record = ListingRecord::from_object(&object(json!({
            "name": "Studio",
            "features": ["balcony"],
            "url": "https://example.com"
        })));

        assert_eq!(record.values(), ["Studio", "", "", "", "", ""]);
    }
}
