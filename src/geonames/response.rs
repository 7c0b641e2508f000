//! GeoNames `searchJSON` response decoding.

use serde::Deserialize;
use serde_json::Value;

use crate::error::AppError;
use crate::models::GeonameId;

/// One ranked search candidate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub geoname_id: GeonameId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub fcode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    geonames: Vec<Candidate>,
}

/// Error payload GeoNames sends instead of results, e.g. for a disabled
/// account or exhausted credits.
#[derive(Debug, Deserialize)]
struct ServiceStatus {
    #[serde(default)]
    message: String,
    #[serde(default)]
    value: i64,
}

/// Decode a response body into its ranked candidates.
///
/// `query` is only used to label errors.
pub fn parse_candidates(query: &str, body: &str) -> Result<Vec<Candidate>, AppError> {
    let malformed = |message: String| AppError::LookupResponseMalformed {
        label: query.to_string(),
        message,
    };

    let value: Value =
        serde_json::from_str(body).map_err(|e| malformed(format!("not JSON: {}", e)))?;

    if let Some(status) = value.get("status") {
        let status: ServiceStatus = serde_json::from_value(status.clone())
            .map_err(|e| malformed(format!("unreadable status: {}", e)))?;
        return Err(AppError::LookupServiceError {
            label: query.to_string(),
            code: status.value,
            message: status.message,
        });
    }

    if value.get("geonames").is_none() {
        return Err(malformed("missing 'geonames' array".to_string()));
    }

    let response: SearchResponse =
        serde_json::from_value(value).map_err(|e| malformed(e.to_string()))?;
    Ok(response.geonames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_candidate() {
        let body = r#"{"totalResultsCount":1,"geonames":[{"geonameId":2950159,"name":"Berlin","countryName":"Germany","fcode":"PPLC","lat":"52.52437"}]}"#;
        let candidates = parse_candidates("Berlin", body).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].geoname_id, GeonameId(2950159));
        assert_eq!(candidates[0].name.as_deref(), Some("Berlin"));
        assert_eq!(candidates[0].country_name.as_deref(), Some("Germany"));
        assert_eq!(candidates[0].fcode.as_deref(), Some("PPLC"));
    }

    #[test]
    fn test_parse_empty_list() {
        let candidates = parse_candidates("Pariss", r#"{"geonames":[]}"#).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_parse_not_json() {
        let err = parse_candidates("Berlin", "<html>502</html>").unwrap_err();
        assert!(matches!(err, AppError::LookupResponseMalformed { .. }));
    }

    #[test]
    fn test_parse_missing_geonames() {
        let err = parse_candidates("Berlin", r#"{"totalResultsCount":0}"#).unwrap_err();
        assert!(matches!(err, AppError::LookupResponseMalformed { .. }));
    }

    #[test]
    fn test_parse_bad_identifier() {
        for body in [
            r#"{"geonames":[{"geonameId":"abc"}]}"#,
            r#"{"geonames":[{"geonameId":-1}]}"#,
            r#"{"geonames":[{"name":"Berlin"}]}"#,
        ] {
            let err = parse_candidates("Berlin", body).unwrap_err();
            assert!(matches!(err, AppError::LookupResponseMalformed { .. }), "{body}");
        }
    }

    #[test]
    fn test_parse_service_status() {
        let body = r#"{"status":{"message":"the daily limit of 20000 credits for demo has been exceeded","value":18}}"#;
        match parse_candidates("Berlin", body).unwrap_err() {
            AppError::LookupServiceError { label, code, message } => {
                assert_eq!(label, "Berlin");
                assert_eq!(code, 18);
                assert!(message.contains("daily limit"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
