//! Cache fingerprinting.

use sha1::{Digest, Sha1};

use common::CacheKeyFields;

/// Stable hash identifying a cacheable document.
///
/// Serialization goes through `serde_json::Value`, whose object maps are
/// ordered by key, so the digest is invariant under field-order permutation
/// of the source query. `parameter` and `interface` are not part of
/// [`CacheKeyFields`] and never influence the result.
pub fn fingerprint(fields: &CacheKeyFields) -> String {
    let canonical = serde_json::to_value(fields)
        .unwrap_or(serde_json::Value::Null)
        .to_string();

    let digest = Sha1::digest(canonical.as_bytes());
    digest.iter().map(|byte| format!("{:02x}", byte)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::SeriesQuery;

    fn fields_of(json: &str) -> CacheKeyFields {
        let query: SeriesQuery = serde_json::from_str(json).expect("query should deserialize");
        CacheKeyFields::from_query(&query)
    }

    #[test]
    fn test_invariant_under_field_order_permutation() {
        let a = fields_of(r#"{"lat": 33.26, "lng": -116.41, "unit": "e", "numDays": 7}"#);
        let b = fields_of(r#"{"numDays": 7, "unit": "e", "lng": -116.41, "lat": 33.26}"#);

        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_independent_of_parameter_and_interface() {
        let a = fields_of(
            r#"{"lat": 33.26, "lng": -116.41,
                "parameter": {"key_path": "/temperature/maximum/p24h"},
                "interface": "summarized"}"#,
        );
        let b = fields_of(
            r#"{"lat": 33.26, "lng": -116.41,
                "parameter": {"name": "Daily Minimum Temperature"},
                "interface": "unsummarized"}"#,
        );

        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_sensitive_to_cache_key_fields() {
        let a = fields_of(r#"{"lat": 33.26, "lng": -116.41}"#);
        let b = fields_of(r#"{"lat": 33.27, "lng": -116.41}"#);

        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_time_bounds_are_part_of_the_key() {
        let a = fields_of(r#"{"lat": 33.26, "time": {"$gte": "2026-08-03T00:00:00Z"}}"#);
        let b = fields_of(r#"{"lat": 33.26, "time": {"$gte": "2026-08-04T00:00:00Z"}}"#);

        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_digest_is_hex_sha1() {
        let digest = fingerprint(&CacheKeyFields::default());

        assert_eq!(digest.len(), 40);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
