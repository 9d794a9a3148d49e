use serde::Deserialize;
use std::collections::BTreeSet;
use validator::Validate;

use super::seat::MAX_LABEL_LEN;
use crate::error::{AppError, AppResult};

// POST /api/shows/{show_id}/book
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[serde(alias = "seatNumbers", default)]
    #[validate(length(min = 1, message = "seatLabels must be a non-empty array"))]
    pub seat_labels: Vec<String>,
}

/// A validated, non-empty set of distinct seat labels in canonical (sorted) order.
///
/// Every reservation acquires its seat locks in this order, so two overlapping
/// requests can never wait on each other in a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatSelection {
    labels: Vec<String>,
}

impl SeatSelection {
    pub fn parse<I, S>(labels: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for raw in labels {
            let label = raw.as_ref().trim();
            if label.is_empty() {
                return Err(AppError::Validation("seat labels must not be blank".into()));
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(AppError::Validation(format!(
                    "seat label '{}' is longer than {} characters",
                    label, MAX_LABEL_LEN
                )));
            }
            if !set.insert(label.to_string()) {
                return Err(AppError::Validation(format!(
                    "seat label '{}' is requested more than once",
                    label
                )));
            }
        }

        if set.is_empty() {
            return Err(AppError::Validation(
                "seatLabels must be a non-empty array".into(),
            ));
        }

        Ok(Self {
            labels: set.into_iter().collect(),
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.binary_search_by(|l| l.as_str().cmp(label)).is_ok()
    }
}

impl TryFrom<CreateBookingRequest> for SeatSelection {
    type Error = AppError;

    fn try_from(req: CreateBookingRequest) -> Result<Self, Self::Error> {
        req.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        SeatSelection::parse(req.seat_labels)
    }
}
