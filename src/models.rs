//! Data models for process records, their status history and the mutation
//! payloads accepted by the API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::dashboard::parse_amount;

/// Status value that marks a process as finalized
pub const FINALIZED_STATUS: &str = "assinado e tramitado";

/// Recorded as the previous status when the caller does not supply one
pub const UNKNOWN_PREVIOUS_STATUS: &str = "Sem status";

/// Monetary amount as stored by the importer: either a plain number or a
/// pt-BR formatted string such as `"1.500,00"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MonetaryValue {
    Number(f64),
    Text(String),
    Other(Value),
}

impl MonetaryValue {
    /// Numeric amount used for aggregation. Anything unparsable counts as zero.
    pub fn amount(&self) -> f64 {
        self.to_number().unwrap_or(0.0)
    }

    /// Strict conversion used when writing values back to the store
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            Self::Number(_) => None,
            Self::Text(text) => parse_amount(text),
            Self::Other(_) => None,
        }
    }
}

impl From<f64> for MonetaryValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for MonetaryValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// One entry of the append-only `historicoStatus` list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub de: String,
    pub para: String,
    pub usuario: String,
    #[serde(default)]
    pub responsavel: Option<String>,
    pub data: DateTime<Utc>,
}

/// Records are written by other tools, so a text field may hold a number
/// or a boolean. Scalars keep their JSON text form and nested values are
/// rendered as compact JSON.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}

/// A process record from the `processos` collection.
///
/// Fields this service does not interpret are kept in `extra` so list
/// responses echo the stored document unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    #[serde(
        rename = "_id",
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub nup: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub numero_processo: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub credenciado: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub responsavel: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub colaborador: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub data_atribuicao: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub atribuido_por: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub tratamento: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub tipo_processo: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub producao: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valor_capa: Option<MonetaryValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valor_glosa: Option<MonetaryValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valor_liberado: Option<MonetaryValue>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub data_recebimento: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub data_regulacao: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub data_importacao: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub ultima_atualizacao: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub historico_status: Vec<StatusTransition>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Process {
    /// True when a responsible party is present and non-empty
    pub fn is_assigned(&self) -> bool {
        self.responsavel.as_deref().is_some_and(|r| !r.is_empty())
    }
}

/// Trimmed view of a process listed under a dashboard group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credenciado: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_recebimento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numero_processo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub producao: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo_processo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tratamento: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ultima_atualizacao: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub valor_capa: Option<MonetaryValue>,
}

impl From<Process> for ProcessSummary {
    fn from(process: Process) -> Self {
        Self {
            nup: process.nup,
            credenciado: process.credenciado,
            data_recebimento: process.data_recebimento,
            numero_processo: process.numero_processo,
            producao: process.producao,
            status: process.status,
            tipo_processo: process.tipo_processo,
            tratamento: process.tratamento,
            ultima_atualizacao: process.ultima_atualizacao,
            valor_capa: process.valor_capa,
        }
    }
}

/// Body of `PUT /api/processos/:nup`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub novo_status: Option<String>,
    pub usuario_email: Option<String>,
    pub usuario_nome: Option<String>,
    pub status_anterior: Option<String>,
    pub valor_capa: Option<MonetaryValue>,
    pub valor_glosa: Option<MonetaryValue>,
    pub valor_liberado: Option<MonetaryValue>,
}

/// Body of `PUT /api/processos/:nup/colaborador`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorRequest {
    pub novo_colaborador: Option<String>,
    pub usuario_email: Option<String>,
}

/// Monetary fields to overwrite alongside a status change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonetaryUpdate {
    pub valor_capa: Option<f64>,
    pub valor_glosa: Option<f64>,
    pub valor_liberado: Option<f64>,
}

impl MonetaryUpdate {
    pub fn is_empty(&self) -> bool {
        self.valor_capa.is_none() && self.valor_glosa.is_none() && self.valor_liberado.is_none()
    }

    /// Field name / value pairs for the amounts that are present
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        [
            ("valorCapa", self.valor_capa),
            ("valorGlosa", self.valor_glosa),
            ("valorLiberado", self.valor_liberado),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
    }
}

/// A validated status change ready to be applied by a store
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub transition: StatusTransition,
    pub values: MonetaryUpdate,
}

impl StatusChange {
    pub fn new_status(&self) -> &str {
        &self.transition.para
    }

    pub fn at(&self) -> DateTime<Utc> {
        self.transition.data
    }
}

/// A validated collaborator assignment ready to be applied by a store
#[derive(Debug, Clone, PartialEq)]
pub struct CollaboratorAssignment {
    pub colaborador: String,
    pub atribuido_por: Option<String>,
    pub at: DateTime<Utc>,
}

/// Result of a single-document update, as reported by the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

impl UpdateOutcome {
    pub fn found(&self) -> bool {
        self.matched > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_monetary_value_deserializes_number_and_text() {
        let number: MonetaryValue = serde_json::from_value(json!(1500)).unwrap();
        assert_eq!(number, MonetaryValue::Number(1500.0));

        let text: MonetaryValue = serde_json::from_value(json!("1.500,00")).unwrap();
        assert_eq!(text, MonetaryValue::Text("1.500,00".to_string()));

        let other: MonetaryValue = serde_json::from_value(json!(true)).unwrap();
        assert_eq!(other.amount(), 0.0);
    }

    #[test]
    fn test_process_keeps_unknown_fields() {
        let raw = json!({
            "_id": "65a1f0c2e4b0a1b2c3d4e5f6",
            "nup": "NUP-1",
            "numeroProcesso": "2024/001",
            "valorCapa": "1.000,00",
            "lote": 42
        });

        let process: Process = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(process.nup.as_deref(), Some("NUP-1"));
        assert_eq!(process.numero_processo.as_deref(), Some("2024/001"));
        assert_eq!(process.extra.get("lote"), Some(&json!(42)));

        let back = serde_json::to_value(&process).unwrap();
        assert_eq!(back, raw);
    }

    #[test]
    fn test_is_assigned_rejects_empty_responsible() {
        let mut process = Process::default();
        assert!(!process.is_assigned());

        process.responsavel = Some(String::new());
        assert!(!process.is_assigned());

        process.responsavel = Some("Ana".to_string());
        assert!(process.is_assigned());
    }

    #[test]
    fn test_monetary_update_fields_skip_missing() {
        let update = MonetaryUpdate {
            valor_capa: Some(10.0),
            valor_glosa: None,
            valor_liberado: Some(7.5),
        };

        let fields: Vec<_> = update.fields().collect();
        assert_eq!(fields, vec![("valorCapa", 10.0), ("valorLiberado", 7.5)]);
        assert!(MonetaryUpdate::default().is_empty());
    }
}
