//! Query builder: turns request parameters into a typed process filter
//!
//! A [`ProcessFilter`] is a conjunction of optional conditions. It can be
//! rendered as a MongoDB filter document or evaluated directly against a
//! [`Process`], which keeps the database and in-memory stores in agreement.

use mongodb::bson::{doc, Bson, Document};
use std::collections::HashMap;

use crate::models::{Process, FINALIZED_STATUS};

/// Collapse decoded query pairs into one value per key. A repeated key
/// keeps its first value, so `?status=a&status=b` reads as `status=a`.
fn first_values(pairs: impl IntoIterator<Item = (String, String)>) -> HashMap<String, String> {
    let mut values = HashMap::new();
    for (key, value) in pairs {
        values.entry(key).or_insert(value);
    }
    values
}

/// Query string of `GET /api/processos`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub responsavel: Option<String>,
    pub tratamento: Option<String>,
}

impl ListParams {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut values = first_values(pairs);
        Self {
            page: values.remove("page"),
            limit: values.remove("limit"),
            search: values.remove("search"),
            status: values.remove("status"),
            responsavel: values.remove("responsavel"),
            tratamento: values.remove("tratamento"),
        }
    }
}

/// Query string of `GET /api/dashboard/resumo`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub is_finalized: Option<String>,
}

impl DashboardParams {
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut values = first_values(pairs);
        Self {
            start_date: values.remove("startDate"),
            end_date: values.remove("endDate"),
            is_finalized: values.remove("isFinalized"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusCondition {
    Equals(String),
    NotEquals(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsibleCondition {
    Equals(String),
    /// Field present and not empty
    Assigned,
}

/// Inclusive range over `dataRegulacao`, compared as strings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    pub fn contains(&self, value: &str) -> bool {
        self.start.as_str() <= value && value <= self.end.as_str()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessFilter {
    /// Case-insensitive substring over `numeroProcesso` or `credenciado`
    pub search: Option<String>,
    pub status: Option<StatusCondition>,
    pub responsavel: Option<ResponsibleCondition>,
    /// Case-insensitive substring over `tratamento`
    pub tratamento: Option<String>,
    pub data_regulacao: Option<DateRange>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

impl ProcessFilter {
    /// Filter for the paginated listing
    pub fn for_listing(params: &ListParams) -> Self {
        Self {
            search: non_empty(&params.search),
            status: non_empty(&params.status).map(StatusCondition::Equals),
            responsavel: non_empty(&params.responsavel).map(ResponsibleCondition::Equals),
            tratamento: non_empty(&params.tratamento),
            data_regulacao: None,
        }
    }

    /// Filter for the dashboard summary. Only assigned processes are
    /// considered; the date range applies only when both ends are given.
    pub fn for_dashboard(params: &DashboardParams) -> Self {
        let data_regulacao = match (non_empty(&params.start_date), non_empty(&params.end_date)) {
            (Some(start), Some(end)) => Some(DateRange { start, end }),
            _ => None,
        };

        let status = match params.is_finalized.as_deref() {
            Some("true") => Some(StatusCondition::Equals(FINALIZED_STATUS.to_string())),
            Some("false") => Some(StatusCondition::NotEquals(FINALIZED_STATUS.to_string())),
            _ => None,
        };

        Self {
            search: None,
            status,
            responsavel: Some(ResponsibleCondition::Assigned),
            tratamento: None,
            data_regulacao,
        }
    }

    /// Render as a MongoDB filter document
    pub fn to_document(&self) -> Document {
        let mut filter = Document::new();

        if let Some(search) = &self.search {
            filter.insert(
                "$or",
                vec![
                    Bson::Document(doc! { "numeroProcesso": contains_pattern(search) }),
                    Bson::Document(doc! { "credenciado": contains_pattern(search) }),
                ],
            );
        }

        match &self.status {
            Some(StatusCondition::Equals(status)) => {
                filter.insert("status", status.as_str());
            }
            Some(StatusCondition::NotEquals(status)) => {
                filter.insert("status", doc! { "$ne": status.as_str() });
            }
            None => {}
        }

        match &self.responsavel {
            Some(ResponsibleCondition::Equals(name)) => {
                filter.insert("responsavel", name.as_str());
            }
            Some(ResponsibleCondition::Assigned) => {
                filter.insert("responsavel", doc! { "$nin": [Bson::Null, ""] });
            }
            None => {}
        }

        if let Some(tratamento) = &self.tratamento {
            filter.insert("tratamento", contains_pattern(tratamento));
        }

        if let Some(range) = &self.data_regulacao {
            filter.insert(
                "dataRegulacao",
                doc! { "$gte": range.start.as_str(), "$lte": range.end.as_str() },
            );
        }

        filter
    }

    /// Evaluate the filter against a process held in memory
    pub fn matches(&self, process: &Process) -> bool {
        if let Some(search) = &self.search {
            let hit = contains_ignore_case(process.numero_processo.as_deref(), search)
                || contains_ignore_case(process.credenciado.as_deref(), search);
            if !hit {
                return false;
            }
        }

        let status = process.status.as_deref();
        match &self.status {
            Some(StatusCondition::Equals(expected)) if status != Some(expected.as_str()) => {
                return false;
            }
            Some(StatusCondition::NotEquals(excluded)) if status == Some(excluded.as_str()) => {
                return false;
            }
            _ => {}
        }

        match &self.responsavel {
            Some(ResponsibleCondition::Equals(name))
                if process.responsavel.as_deref() != Some(name.as_str()) =>
            {
                return false;
            }
            Some(ResponsibleCondition::Assigned) if !process.is_assigned() => return false,
            _ => {}
        }

        if let Some(tratamento) = &self.tratamento {
            if !contains_ignore_case(process.tratamento.as_deref(), tratamento) {
                return false;
            }
        }

        if let Some(range) = &self.data_regulacao {
            match process.data_regulacao.as_deref() {
                Some(value) if range.contains(value) => {}
                _ => return false,
            }
        }

        true
    }
}

/// Case-insensitive literal substring as a `$regex` condition
fn contains_pattern(text: &str) -> Document {
    doc! { "$regex": regex::escape(text), "$options": "i" }
}

fn contains_ignore_case(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}
