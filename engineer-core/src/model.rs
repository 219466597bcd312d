//! Engineer records
//!
//! `Engineer` carries the six columns a caller may write. Reads return an
//! `EngineerRecord`, which adds the display fields joined in from the
//! `sites` and `statuses` lookup tables.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The writable columns of an `engineers` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Engineer {
    pub user_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub title: String,
    pub status_id: i32,
    pub site_id: i32,
}

/// An engineer as read back from the database.
///
/// `site_name` and `status` come from LEFT JOINs, so they are `None` when the
/// referenced lookup row is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct EngineerRecord {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub engineer: Engineer,
    pub site_name: Option<String>,
    pub status: Option<String>,
}

impl EngineerRecord {
    pub fn user_id(&self) -> i32 {
        self.engineer.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ada() -> Engineer {
        Engineer {
            user_id: 1,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            title: "Engineer II".to_string(),
            status_id: 1,
            site_id: 2,
        }
    }

    #[test]
    fn engineer_uses_camel_case_fields() {
        let value = serde_json::to_value(ada()).unwrap();
        assert_eq!(
            value,
            json!({
                "userId": 1,
                "firstName": "Ada",
                "lastName": "Lovelace",
                "title": "Engineer II",
                "statusId": 1,
                "siteId": 2
            })
        );
    }

    #[test]
    fn record_flattens_engineer_with_display_fields() {
        let record = EngineerRecord {
            engineer: ada(),
            site_name: Some("London".to_string()),
            status: Some("Active".to_string()),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["userId"], 1);
        assert_eq!(value["siteName"], "London");
        assert_eq!(value["status"], "Active");
        assert_eq!(record.user_id(), 1);
    }

    #[test]
    fn engineer_rejects_missing_fields() {
        let result = serde_json::from_value::<Engineer>(json!({
            "userId": 1,
            "firstName": "Ada"
        }));
        assert!(result.is_err());
    }
}
