//! Database models for the search history.

use chrono::{DateTime, NaiveDateTime, Utc};
use diesel::prelude::*;

use nexus_core::history::{NewSearch, SearchRecord};
use nexus_registry::Country;

use crate::errors::StorageError;

#[derive(Queryable, Selectable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::search_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SearchDB {
    pub id: i32,
    pub query: String,
    pub country: Option<String>,
    pub identifier: Option<String>,
    pub tier: String,
    pub outcome: String,
    pub result_count: i32,
    pub risk_score: Option<f64>,
    pub searched_at: NaiveDateTime,
}

#[derive(Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = crate::schema::search_history)]
pub struct NewSearchDB {
    pub query: String,
    pub country: Option<String>,
    pub identifier: Option<String>,
    pub tier: String,
    pub outcome: String,
    pub result_count: i32,
    pub risk_score: Option<f64>,
    pub searched_at: NaiveDateTime,
}

impl From<NewSearch> for NewSearchDB {
    fn from(search: NewSearch) -> Self {
        Self {
            query: search.query,
            country: search.country.map(|c| c.code().to_string()),
            identifier: search.identifier,
            tier: search.tier,
            outcome: search.outcome,
            result_count: i32::try_from(search.result_count).unwrap_or(i32::MAX),
            risk_score: search.risk_score,
            searched_at: search.searched_at.naive_utc(),
        }
    }
}

impl SearchDB {
    pub fn decode(self) -> Result<SearchRecord, StorageError> {
        let country = match self.country.as_deref() {
            Some(code) => Some(Country::from_code(code).ok_or_else(|| {
                StorageError::Corrupt(format!("search {}: unknown country '{}'", self.id, code))
            })?),
            None => None,
        };
        Ok(SearchRecord {
            id: i64::from(self.id),
            search: NewSearch {
                query: self.query,
                country,
                identifier: self.identifier,
                tier: self.tier,
                outcome: self.outcome,
                result_count: u32::try_from(self.result_count).unwrap_or_default(),
                risk_score: self.risk_score,
                searched_at: DateTime::<Utc>::from_naive_utc_and_offset(self.searched_at, Utc),
            },
        })
    }
}
