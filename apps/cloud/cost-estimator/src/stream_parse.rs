//! Selective, non-accumulating JSON descent over an AWS price list
//! document. Each pass opens its own reader and walks straight to one
//! top-level sub-path (`products`, `terms.OnDemand`, `terms.Reserved`),
//! skipping every sibling key with `IgnoredAny` so memory use is bounded
//! by one record, not by document size.

use crate::error::{IngestError, IngestResult};
use domain_catalog::normalizer::{RawProduct, RawTerm};
use serde::de::{DeserializeSeed, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::io::Read;

#[derive(Deserialize)]
struct RawProductJson {
    #[serde(default)]
    #[allow(dead_code)]
    sku: String,
    #[serde(rename = "productFamily")]
    product_family: Option<String>,
    #[serde(default)]
    attributes: HashMap<String, String>,
}

#[derive(Deserialize)]
struct RawPriceDimensionJson {
    unit: String,
    description: Option<String>,
    #[serde(rename = "beginRange")]
    begin_range: Option<serde_json::Value>,
    #[serde(rename = "endRange")]
    end_range: Option<serde_json::Value>,
    #[serde(rename = "pricePerUnit")]
    price_per_unit: HashMap<String, String>,
}

#[derive(Deserialize)]
struct RawTermEntryJson {
    sku: String,
    #[serde(rename = "priceDimensions")]
    price_dimensions: HashMap<String, RawPriceDimensionJson>,
}

pub fn parse_products_pass<R, F>(reader: R, mut on_product: F) -> IngestResult<()>
where
    R: Read,
    F: FnMut(RawProduct),
{
    let mut de = serde_json::Deserializer::from_reader(reader);
    de.deserialize_map(ProductsPassVisitor { on_product: &mut on_product })
        .map_err(|e| IngestError::MalformedDocument(e.to_string()))
}

/// `sub_key` is `"OnDemand"` or `"Reserved"`, the term-type map under `terms`.
pub fn parse_terms_pass<R, F>(reader: R, sub_key: &'static str, mut on_term: F) -> IngestResult<()>
where
    R: Read,
    F: FnMut(RawTerm),
{
    let mut de = serde_json::Deserializer::from_reader(reader);
    de.deserialize_map(TermsPassVisitor { sub_key, on_term: &mut on_term })
        .map_err(|e| IngestError::MalformedDocument(e.to_string()))
}

struct ProductsPassVisitor<'a, F> {
    on_product: &'a mut F,
}

impl<'de, 'a, F: FnMut(RawProduct)> Visitor<'de> for ProductsPassVisitor<'a, F> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an offer document with a products map")
    }

    fn visit_map<A>(self, mut map: A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let ProductsPassVisitor { on_product } = self;
        while let Some(key) = map.next_key::<String>()? {
            if key == "products" {
                map.next_value_seed(ProductsMapSeed { on_product })?;
                break;
            } else {
                let _ = map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

struct ProductsMapSeed<'a, F> {
    on_product: &'a mut F,
}

impl<'de, 'a, F: FnMut(RawProduct)> DeserializeSeed<'de> for ProductsMapSeed<'a, F> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(ProductsMapVisitor { on_product: self.on_product })
    }
}

struct ProductsMapVisitor<'a, F> {
    on_product: &'a mut F,
}

impl<'de, 'a, F: FnMut(RawProduct)> Visitor<'de> for ProductsMapVisitor<'a, F> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a sku -> product map")
    }

    fn visit_map<A>(mut self, mut map: A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        while let Some(sku) = map.next_key::<String>()? {
            let raw: RawProductJson = map.next_value()?;
            (self.on_product)(RawProduct {
                sku,
                product_family: raw.product_family,
                attributes: raw.attributes,
            });
        }
        Ok(())
    }
}

struct TermsPassVisitor<'a, F> {
    sub_key: &'static str,
    on_term: &'a mut F,
}

impl<'de, 'a, F: FnMut(RawTerm)> Visitor<'de> for TermsPassVisitor<'a, F> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "an offer document with a terms map")
    }

    fn visit_map<A>(self, mut map: A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let TermsPassVisitor { sub_key, on_term } = self;
        while let Some(key) = map.next_key::<String>()? {
            if key == "terms" {
                map.next_value_seed(TermsWrapperSeed { sub_key, on_term })?;
                break;
            } else {
                let _ = map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

struct TermsWrapperSeed<'a, F> {
    sub_key: &'static str,
    on_term: &'a mut F,
}

impl<'de, 'a, F: FnMut(RawTerm)> DeserializeSeed<'de> for TermsWrapperSeed<'a, F> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(TermsWrapperVisitor { sub_key: self.sub_key, on_term: self.on_term })
    }
}

struct TermsWrapperVisitor<'a, F> {
    sub_key: &'static str,
    on_term: &'a mut F,
}

impl<'de, 'a, F: FnMut(RawTerm)> Visitor<'de> for TermsWrapperVisitor<'a, F> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a term-type map")
    }

    fn visit_map<A>(self, mut map: A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let TermsWrapperVisitor { sub_key, on_term } = self;
        while let Some(key) = map.next_key::<String>()? {
            if key == sub_key {
                map.next_value_seed(SkuMapSeed { on_term })?;
                break;
            } else {
                let _ = map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(())
    }
}

struct SkuMapSeed<'a, F> {
    on_term: &'a mut F,
}

impl<'de, 'a, F: FnMut(RawTerm)> DeserializeSeed<'de> for SkuMapSeed<'a, F> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(SkuMapVisitor { on_term: self.on_term })
    }
}

struct SkuMapVisitor<'a, F> {
    on_term: &'a mut F,
}

impl<'de, 'a, F: FnMut(RawTerm)> Visitor<'de> for SkuMapVisitor<'a, F> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a sku -> rate code map")
    }

    fn visit_map<A>(self, mut map: A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        let SkuMapVisitor { on_term } = self;
        while map.next_key::<String>()?.is_some() {
            map.next_value_seed(RateCodeMapSeed { on_term: &mut *on_term })?;
        }
        Ok(())
    }
}

struct RateCodeMapSeed<'a, F> {
    on_term: &'a mut F,
}

impl<'de, 'a, F: FnMut(RawTerm)> DeserializeSeed<'de> for RateCodeMapSeed<'a, F> {
    type Value = ();

    fn deserialize<D>(self, deserializer: D) -> Result<(), D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(RateCodeMapVisitor { on_term: self.on_term })
    }
}

struct RateCodeMapVisitor<'a, F> {
    on_term: &'a mut F,
}

impl<'de, 'a, F: FnMut(RawTerm)> Visitor<'de> for RateCodeMapVisitor<'a, F> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a rate code -> term entry map")
    }

    fn visit_map<A>(mut self, mut map: A) -> Result<(), A::Error>
    where
        A: MapAccess<'de>,
    {
        while let Some(rate_code) = map.next_key::<String>()? {
            let entry: RawTermEntryJson = map.next_value()?;
            let price_dimensions = entry
                .price_dimensions
                .into_values()
                .map(|d| domain_catalog::normalizer::RawPriceDimension {
                    unit: d.unit,
                    description: d.description,
                    begin_range: d.begin_range,
                    end_range: d.end_range,
                    price_per_unit: d.price_per_unit,
                })
                .collect();
            (self.on_term)(RawTerm {
                sku: entry.sku,
                rate_code,
                price_dimensions,
            });
        }
        Ok(())
    }
}

/// Pulls `publicationDate` off the document without materializing anything
/// else. Used for the in-memory (small-body) path where the whole document
/// is already buffered and this is just a cheap top-level field lookup.
pub fn extract_publication_date(value: &serde_json::Value) -> Option<chrono::DateTime<chrono::Utc>> {
    value
        .get("publicationDate")
        .and_then(|v| v.as_str())
        .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&chrono::Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    const OFFER_DOC: &str = r#"{
        "publicationDate": "2024-01-15T00:00:00Z",
        "products": {
            "SKU1": {
                "sku": "SKU1",
                "productFamily": "Compute Instance",
                "attributes": {"instanceType": "t3.micro", "regionCode": "us-east-1"}
            },
            "SKU2": {
                "sku": "SKU2",
                "productFamily": "Storage",
                "attributes": {"volumeType": "gp3"}
            }
        },
        "terms": {
            "OnDemand": {
                "SKU1": {
                    "SKU1.RATE1": {
                        "sku": "SKU1",
                        "priceDimensions": {
                            "SKU1.RATE1.DIM1": {
                                "unit": "Hrs",
                                "description": "on demand",
                                "pricePerUnit": {"USD": "0.0104"}
                            }
                        }
                    }
                }
            },
            "Reserved": {
                "SKU1": {
                    "SKU1.RATE2": {
                        "sku": "SKU1",
                        "priceDimensions": {
                            "SKU1.RATE2.DIM1": {
                                "unit": "Hrs",
                                "description": "reserved",
                                "pricePerUnit": {"USD": "0.0070"}
                            }
                        }
                    }
                }
            }
        }
    }"#;

    #[test]
    fn parses_every_product_in_the_products_map() {
        let mut products = Vec::new();
        parse_products_pass(OFFER_DOC.as_bytes(), |p| products.push(p)).unwrap();

        assert_eq!(products.len(), 2);
        let sku1 = products.iter().find(|p| p.sku == "SKU1").unwrap();
        assert_eq!(sku1.product_family.as_deref(), Some("Compute Instance"));
        assert_eq!(sku1.attributes.get("instanceType").map(String::as_str), Some("t3.micro"));
    }

    #[test]
    fn parses_only_the_requested_term_sub_key() {
        let mut terms = Vec::new();
        parse_terms_pass(OFFER_DOC.as_bytes(), "OnDemand", |t| terms.push(t)).unwrap();

        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].sku, "SKU1");
        assert_eq!(terms[0].rate_code, "SKU1.RATE1");
        assert_eq!(terms[0].price_dimensions.len(), 1);
        assert_eq!(terms[0].price_dimensions[0].price_per_unit.get("USD").map(String::as_str), Some("0.0104"));
    }

    #[test]
    fn reserved_pass_ignores_on_demand_entries() {
        let mut terms = Vec::new();
        parse_terms_pass(OFFER_DOC.as_bytes(), "Reserved", |t| terms.push(t)).unwrap();

        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].rate_code, "SKU1.RATE2");
    }

    #[test]
    fn missing_products_key_yields_no_callbacks() {
        let doc = r#"{"publicationDate": "2024-01-15T00:00:00Z", "terms": {}}"#;
        let mut products = Vec::new();
        parse_products_pass(doc.as_bytes(), |p| products.push(p)).unwrap();
        assert!(products.is_empty());
    }

    #[test]
    fn extracts_publication_date_when_present() {
        let value: serde_json::Value = serde_json::from_str(OFFER_DOC).unwrap();
        let date = extract_publication_date(&value).unwrap();
        assert_eq!(date.to_rfc3339(), "2024-01-15T00:00:00+00:00");
    }

    #[test]
    fn missing_publication_date_returns_none() {
        let value = serde_json::json!({"products": {}});
        assert!(extract_publication_date(&value).is_none());
    }
}
