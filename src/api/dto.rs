use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::{AppError, SubscriptionInput};
use crate::domain::{
    format_month_year, parse_month_year, Cents, Page, Subscription, SubscriptionFilter,
    SubscriptionId, UserId,
};

/// Body of `POST /subscriptions` and `PUT /subscriptions/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionRequest {
    #[schema(format = Uuid, example = "60601fee-2bf1-4721-ae6f-7636e79a0cba")]
    pub user_id: String,
    #[schema(example = "Yandex Plus")]
    pub service_name: String,
    /// Monthly price in whole currency units
    #[schema(minimum = 0, example = 400)]
    pub price: Cents,
    /// MM-YYYY
    #[schema(example = "07-2025")]
    pub start_date: String,
    /// MM-YYYY, omitted or null for an open-ended subscription
    #[serde(default)]
    #[schema(example = "12-2025")]
    pub end_date: Option<String>,
}

impl SubscriptionRequest {
    pub fn into_input(self) -> Result<SubscriptionInput, AppError> {
        let user_id = parse_user_id(&self.user_id)?;
        let start_date = parse_month_year(&self.start_date)
            .map_err(|e| AppError::validation(format!("start_date: {e}")))?;
        let end_date = self
            .end_date
            .as_deref()
            .map(parse_month_year)
            .transpose()
            .map_err(|e| AppError::validation(format!("end_date: {e}")))?;

        Ok(SubscriptionInput {
            user_id,
            service_name: self.service_name,
            price: self.price,
            start_date,
            end_date,
        })
    }
}

/// A subscription as rendered on the wire, dates as MM-YYYY.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionResponse {
    #[schema(value_type = Uuid)]
    pub id: SubscriptionId,
    #[schema(value_type = Uuid)]
    pub user_id: UserId,
    pub service_name: String,
    pub price: Cents,
    pub start_date: String,
    pub end_date: Option<String>,
}

impl From<&Subscription> for SubscriptionResponse {
    fn from(sub: &Subscription) -> Self {
        Self {
            id: sub.id,
            user_id: sub.user_id,
            service_name: sub.service_name.clone(),
            price: sub.price,
            start_date: format_month_year(sub.start_date),
            end_date: sub.end_date.map(format_month_year),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatedResponse {
    #[schema(value_type = Uuid)]
    pub id: SubscriptionId,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TotalResponse {
    pub total: Cents,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` or `unavailable`
    pub status: String,
}

/// Error envelope shared by every failing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    pub message: String,
    /// `validation_error`, `not_found` or `internal_error`
    #[serde(rename = "type")]
    pub kind: String,
}

/// Query string of `GET /subscriptions`.
///
/// Everything arrives as text so malformed values get our own messages
/// (or, for paging, fall back to defaults).
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Only subscriptions of this user (UUID)
    pub user_id: Option<String>,
    /// Only subscriptions to this service, exact match
    pub service_name: Option<String>,
    /// Page size, defaults to 50
    pub limit: Option<String>,
    /// Rows to skip, defaults to 0
    pub offset: Option<String>,
}

impl ListQuery {
    pub fn filter(&self) -> Result<SubscriptionFilter, AppError> {
        build_filter(self.user_id.as_deref(), self.service_name.as_deref())
    }

    /// Unparseable or out-of-range values fall back to the defaults.
    pub fn page(&self) -> Page {
        let number = |v: &Option<String>| v.as_deref().and_then(|s| s.trim().parse::<i64>().ok());
        Page::new(number(&self.limit), number(&self.offset))
    }
}

/// Query string of `GET /subscriptions/total`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TotalQuery {
    /// First month, inclusive (MM-YYYY). Required.
    pub from: Option<String>,
    /// Last month, inclusive (MM-YYYY). Required.
    pub to: Option<String>,
    /// Only subscriptions of this user (UUID)
    pub user_id: Option<String>,
    /// Only subscriptions to this service, exact match
    pub service_name: Option<String>,
}

impl TotalQuery {
    pub fn filter(&self) -> Result<SubscriptionFilter, AppError> {
        build_filter(self.user_id.as_deref(), self.service_name.as_deref())
    }
}

pub fn parse_subscription_id(raw: &str) -> Result<SubscriptionId, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::validation(format!("invalid id '{raw}'")))
}

fn parse_user_id(raw: &str) -> Result<UserId, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::validation(format!("invalid user_id '{raw}'")))
}

/// Empty or blank strings count as "not given". Anything else is passed on untouched.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

fn build_filter(
    user_id: Option<&str>,
    service_name: Option<&str>,
) -> Result<SubscriptionFilter, AppError> {
    Ok(SubscriptionFilter {
        user_id: non_empty(user_id).map(parse_user_id).transpose()?,
        service_name: non_empty(service_name).map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn request(start: &str, end: Option<&str>) -> SubscriptionRequest {
        SubscriptionRequest {
            user_id: "60601fee-2bf1-4721-ae6f-7636e79a0cba".to_string(),
            service_name: "Yandex Plus".to_string(),
            price: 400,
            start_date: start.to_string(),
            end_date: end.map(str::to_string),
        }
    }

    #[test]
    fn test_into_input() {
        let input = request("07-2025", Some("12-2025")).into_input().unwrap();
        assert_eq!(input.start_date, NaiveDate::from_ymd_opt(2025, 7, 1).unwrap());
        assert_eq!(input.end_date, NaiveDate::from_ymd_opt(2025, 12, 1));
        assert_eq!(input.price, 400);
    }

    #[test]
    fn test_into_input_rejects_malformed_fields() {
        assert!(matches!(
            request("2025-07", None).into_input(),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            request("07-2025", Some("13-2025")).into_input(),
            Err(AppError::Validation(_))
        ));

        let mut bad_user = request("07-2025", None);
        bad_user.user_id = "not-a-uuid".to_string();
        assert!(matches!(bad_user.into_input(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_request_end_date_optional() {
        let body = r#"{"user_id":"60601fee-2bf1-4721-ae6f-7636e79a0cba","service_name":"Kinopoisk","price":299,"start_date":"01-2024"}"#;
        let req: SubscriptionRequest = serde_json::from_str(body).unwrap();
        assert!(req.end_date.is_none());
    }

    #[test]
    fn test_response_renders_month_year() {
        let sub = Subscription::new(
            Uuid::new_v4(),
            "Spotify".to_string(),
            169,
            NaiveDate::from_ymd_opt(2023, 2, 14).unwrap(),
            None,
        );
        let resp = SubscriptionResponse::from(&sub);
        assert_eq!(resp.start_date, "02-2023");
        assert_eq!(resp.end_date, None);

        let json = serde_json::to_value(&resp).unwrap();
        assert!(json["end_date"].is_null());
    }

    #[test]
    fn test_list_query_paging_fallbacks() {
        let query = ListQuery {
            limit: Some("abc".to_string()),
            offset: Some("-5".to_string()),
            ..Default::default()
        };
        assert_eq!(query.page(), Page { limit: 50, offset: 0 });

        let query = ListQuery {
            limit: Some("10".to_string()),
            offset: Some("30".to_string()),
            ..Default::default()
        };
        assert_eq!(query.page(), Page { limit: 10, offset: 30 });
    }

    #[test]
    fn test_filter_treats_empty_as_absent() {
        let query = TotalQuery {
            user_id: Some(String::new()),
            service_name: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.filter().unwrap(), SubscriptionFilter::default());

        let query = TotalQuery {
            user_id: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(query.filter().is_err());
    }
}
