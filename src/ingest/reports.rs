/// Report feed decoding
///
/// Two payload shapes come from the backend:
/// - fetch-all: a JSON array of report rows
/// - realtime: `{"eventType": "INSERT" | "UPDATE" | "DELETE", "new": {row}, "old": {row}}`
///
/// Rows use the same shape in both. Ids may be numeric. `updated_at` falls
/// back to `created_at` for rows that have never been edited.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::ingest::IngestError;
use crate::logging::{self, Component};
use crate::model::{LngLat, Report, ReportStatus};
use crate::reports::ReportEvent;

// ============================================================================
// Row Structures
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RowId {
    Text(String),
    Number(serde_json::Number),
}

#[derive(Debug, Deserialize)]
struct ReportRow {
    id: RowId,
    coordinates: Vec<f64>,
    #[serde(default)]
    status: Option<ReportStatus>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ChangePayload {
    #[serde(rename = "eventType")]
    event_type: String,
    #[serde(default)]
    new: Option<Value>,
}

impl TryFrom<ReportRow> for Report {
    type Error = String;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        let id = match row.id {
            RowId::Text(s) => s,
            RowId::Number(n) => n.to_string(),
        };
        let coordinates = match row.coordinates.as_slice() {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => LngLat::new(*lon, *lat),
            _ => return Err(format!("report {} has no usable coordinates", id)),
        };
        let updated_at = row
            .updated_at
            .or(row.created_at)
            .ok_or_else(|| format!("report {} has no timestamp", id))?;

        Ok(Report {
            id,
            coordinates,
            status: row.status.unwrap_or(ReportStatus::Pending),
            category: row.category.unwrap_or_else(|| "other".to_string()),
            description: row.description,
            updated_at,
        })
    }
}

fn decode_row(value: Value) -> Result<Report, String> {
    let row: ReportRow = serde_json::from_value(value).map_err(|e| e.to_string())?;
    Report::try_from(row)
}

// ============================================================================
// Decoders
// ============================================================================

/// Decodes a fetch-all payload. Rows that fail to decode are skipped.
pub fn parse_report_list(json: &str) -> Result<Vec<Report>, IngestError> {
    let rows: Vec<Value> =
        serde_json::from_str(json).map_err(|e| IngestError::ParseError(e.to_string()))?;

    let total = rows.len();
    let mut reports = Vec::with_capacity(total);
    for row in rows {
        match decode_row(row) {
            Ok(report) => reports.push(report),
            Err(e) => logging::warn(Component::Reports, None, &format!("skipping row: {}", e)),
        }
    }

    logging::log_load_summary(Component::Reports, "reports", reports.len(), total - reports.len());
    Ok(reports)
}

/// Decodes one realtime change payload.
///
/// Returns `Ok(None)` for event types the viewer doesn't act on (DELETE,
/// schema changes); reports are append-only on the client.
pub fn parse_change(json: &str) -> Result<Option<ReportEvent>, IngestError> {
    let payload: ChangePayload =
        serde_json::from_str(json).map_err(|e| IngestError::ParseError(e.to_string()))?;

    let wrap: fn(Report) -> ReportEvent = match payload.event_type.to_ascii_uppercase().as_str() {
        "INSERT" => ReportEvent::Insert,
        "UPDATE" => ReportEvent::Update,
        other => {
            logging::debug(Component::Reports, None, &format!("ignoring {} event", other));
            return Ok(None);
        }
    };

    let row = payload
        .new
        .ok_or_else(|| {
            IngestError::InvalidRecord("change payload has no 'new' record".to_string())
        })?;
    let report = decode_row(row).map_err(IngestError::InvalidRecord)?;
    Ok(Some(wrap(report)))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_report_list_decodes_and_skips_bad_rows() {
        let json = r#"[
            { "id": 101, "coordinates": [123.89, 10.31], "status": "pending",
              "category": "clogged_inlet", "created_at": "2024-07-01T08:00:00Z" },
            { "id": "r-2", "coordinates": [123.89, 10.31], "status": "resolved",
              "category": "flooding", "description": "knee deep",
              "created_at": "2024-07-01T08:00:00Z", "updated_at": "2024-07-01T09:30:00Z" },
            { "id": "r-3", "coordinates": [123.89], "created_at": "2024-07-01T08:00:00Z" },
            { "id": "r-4", "coordinates": [123.9, 10.3] }
        ]"#;

        let reports = parse_report_list(json).expect("array should parse");
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].id, "101");
        assert_eq!(reports[1].status, ReportStatus::Resolved);
        assert_eq!(
            reports[1].updated_at,
            Utc.with_ymd_and_hms(2024, 7, 1, 9, 30, 0).unwrap(),
            "updated_at wins over created_at"
        );
    }

    #[test]
    fn test_change_payload_insert_and_update() {
        let insert = r#"{ "eventType": "INSERT",
            "new": { "id": 7, "coordinates": [1.0, 2.0], "status": "pending",
                     "category": "flooding", "created_at": "2024-07-01T08:00:00Z" } }"#;
        match parse_change(insert).expect("valid payload") {
            Some(ReportEvent::Insert(r)) => assert_eq!(r.id, "7"),
            other => panic!("expected insert, got {:?}", other),
        }

        let update = r#"{ "eventType": "UPDATE",
            "new": { "id": 7, "coordinates": [1.0, 2.0], "status": "in_progress",
                     "category": "flooding", "updated_at": "2024-07-01T08:05:00Z" },
            "old": { "id": 7 } }"#;
        match parse_change(update).expect("valid payload") {
            Some(ReportEvent::Update(r)) => assert_eq!(r.status, ReportStatus::InProgress),
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn test_delete_events_are_ignored() {
        let delete = r#"{ "eventType": "DELETE", "old": { "id": 7 } }"#;
        assert_eq!(parse_change(delete), Ok(None));
    }

    #[test]
    fn test_change_without_record_is_invalid() {
        let err = parse_change(r#"{ "eventType": "UPDATE" }"#).unwrap_err();
        assert!(matches!(err, IngestError::InvalidRecord(_)));
    }
}
