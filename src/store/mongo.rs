//! MongoDB-backed process store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use serde_json::Value;
use tracing::{debug, info};

use super::memory::format_timestamp;
use super::{ProcessStore, StoreError, StoreResult};
use crate::dashboard::DASHBOARD_FIELDS;
use crate::models::{CollaboratorAssignment, Process, StatusChange, UpdateOutcome};
use crate::pagination::PageRequest;
use crate::query::ProcessFilter;

pub struct MongoProcessStore {
    client: Client,
    database: Database,
    collection: Collection<Document>,
}

impl MongoProcessStore {
    /// Connect to MongoDB and verify the server answers a `ping`
    pub async fn connect(uri: &str, database: &str, collection: &str) -> StoreResult<Self> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(StoreError::configuration)?;
        let client = Client::with_options(options).map_err(StoreError::configuration)?;
        let database = client.database(database);
        let collection = database.collection::<Document>(collection);

        let store = Self {
            client,
            database,
            collection,
        };
        store.ping().await?;

        info!(
            "Connected to MongoDB database {} collection {}",
            store.database.name(),
            store.collection.name()
        );
        Ok(store)
    }

    async fn collect(&self, cursor: mongodb::Cursor<Document>) -> StoreResult<Vec<Process>> {
        let documents: Vec<Document> = cursor.try_collect().await?;
        documents.into_iter().map(decode_process).collect()
    }
}

fn to_bson_datetime(at: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

/// Convert a BSON value into the JSON shape API clients expect: ObjectIds
/// as hex strings and dates as RFC 3339 strings
pub(crate) fn bson_to_json(value: Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis())
            .map(|at| Value::String(format_timestamp(at)))
            .unwrap_or_else(|| Value::from(dt.timestamp_millis())),
        Bson::Document(document) => Value::Object(
            document
                .into_iter()
                .map(|(key, value)| (key, bson_to_json(value)))
                .collect(),
        ),
        Bson::Array(items) => Value::Array(items.into_iter().map(bson_to_json).collect()),
        other => other.into_relaxed_extjson(),
    }
}

fn decode_process(document: Document) -> StoreResult<Process> {
    let value = bson_to_json(Bson::Document(document));
    Ok(serde_json::from_value(value)?)
}

fn dashboard_projection() -> Document {
    DASHBOARD_FIELDS
        .iter()
        .map(|field| (field.to_string(), Bson::Int32(1)))
        .collect()
}

pub(crate) fn status_update_document(change: &StatusChange) -> Document {
    let mut set = doc! {
        "status": change.new_status(),
        "ultimaAtualizacao": to_bson_datetime(change.at()),
    };
    for (field, amount) in change.values.fields() {
        set.insert(field, amount);
    }

    let transition = &change.transition;
    doc! {
        "$set": set,
        "$push": {
            "historicoStatus": {
                "de": transition.de.as_str(),
                "para": transition.para.as_str(),
                "usuario": transition.usuario.as_str(),
                "responsavel": transition.responsavel.as_deref(),
                "data": to_bson_datetime(transition.data),
            }
        }
    }
}

pub(crate) fn collaborator_update_document(assignment: &CollaboratorAssignment) -> Document {
    doc! {
        "$set": {
            "colaborador": assignment.colaborador.as_str(),
            "dataAtribuicao": to_bson_datetime(assignment.at),
            "atribuidoPor": assignment.atribuido_por.as_deref(),
        }
    }
}

#[async_trait]
impl ProcessStore for MongoProcessStore {
    async fn count(&self, filter: &ProcessFilter) -> StoreResult<u64> {
        Ok(self.collection.count_documents(filter.to_document()).await?)
    }

    async fn find_page(
        &self,
        filter: &ProcessFilter,
        page: &PageRequest,
    ) -> StoreResult<Vec<Process>> {
        let cursor = self
            .collection
            .find(filter.to_document())
            .sort(doc! { "dataImportacao": -1 })
            .skip(page.skip())
            .limit(i64::try_from(page.limit).unwrap_or(i64::MAX))
            .await?;
        self.collect(cursor).await
    }

    async fn find_for_dashboard(&self, filter: &ProcessFilter) -> StoreResult<Vec<Process>> {
        let cursor = self
            .collection
            .find(filter.to_document())
            .projection(dashboard_projection())
            .await?;
        self.collect(cursor).await
    }

    async fn update_status(&self, nup: &str, change: &StatusChange) -> StoreResult<UpdateOutcome> {
        let result = self
            .collection
            .update_one(doc! { "nup": nup }, status_update_document(change))
            .await?;
        debug!(
            "Status update on {} matched {} modified {}",
            nup, result.matched_count, result.modified_count
        );
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn assign_collaborator(
        &self,
        nup: &str,
        assignment: &CollaboratorAssignment,
    ) -> StoreResult<UpdateOutcome> {
        let result = self
            .collection
            .update_one(doc! { "nup": nup }, collaborator_update_document(assignment))
            .await?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(StoreError::unavailable)?;
        Ok(())
    }

    async fn close(&self) {
        info!("Closing MongoDB client");
        self.client.clone().shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MonetaryUpdate, StatusTransition};
    use chrono::TimeZone;
    use mongodb::bson::oid::ObjectId;
    use serde_json::json;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_bson_to_json_renders_ids_and_dates() {
        let oid = ObjectId::parse_str("65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        let document = doc! {
            "_id": oid,
            "dataImportacao": to_bson_datetime(at()),
            "valorCapa": 1500.5,
            "qtd": 3_i32,
            "tags": ["a", "b"],
        };

        let value = bson_to_json(Bson::Document(document));
        assert_eq!(
            value,
            json!({
                "_id": "65a1f0c2e4b0a1b2c3d4e5f6",
                "dataImportacao": "2024-05-10T14:30:00.000Z",
                "valorCapa": 1500.5,
                "qtd": 3,
                "tags": ["a", "b"],
            })
        );
    }

    #[test]
    fn test_decode_process_from_document() {
        let document = doc! {
            "nup": "NUP-9",
            "valorCapa": "1.000,00",
            "historicoStatus": [{
                "de": "Sem status",
                "para": "em análise",
                "usuario": "ana@example.com",
                "responsavel": "Ana",
                "data": to_bson_datetime(at()),
            }],
        };

        let process = decode_process(document).unwrap();
        assert_eq!(process.nup.as_deref(), Some("NUP-9"));
        assert_eq!(process.historico_status.len(), 1);
        assert_eq!(process.historico_status[0].data, at());
    }

    #[test]
    fn test_decode_process_with_non_string_scalars() {
        let document = doc! {
            "_id": 17_i32,
            "nup": "N1",
            "numeroProcesso": 2024001_i64,
            "producao": 3.5,
            "tratamento": true,
            "responsavel": Bson::Null,
        };

        let process = decode_process(document).unwrap();
        assert_eq!(process.id.as_deref(), Some("17"));
        assert_eq!(process.numero_processo.as_deref(), Some("2024001"));
        assert_eq!(process.producao.as_deref(), Some("3.5"));
        assert_eq!(process.tratamento.as_deref(), Some("true"));
        assert!(process.responsavel.is_none());
        assert!(process.extra.is_empty());
    }

    #[test]
    fn test_status_update_document_sets_values_and_pushes_history() {
        let change = StatusChange {
            transition: StatusTransition {
                de: "Sem status".to_string(),
                para: "em análise".to_string(),
                usuario: "ana@example.com".to_string(),
                responsavel: None,
                data: at(),
            },
            values: MonetaryUpdate {
                valor_capa: Some(1500.0),
                valor_glosa: None,
                valor_liberado: None,
            },
        };

        let update = status_update_document(&change);
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("status").unwrap(), "em análise");
        assert_eq!(set.get_f64("valorCapa").unwrap(), 1500.0);
        assert!(!set.contains_key("valorGlosa"));

        let pushed = update
            .get_document("$push")
            .unwrap()
            .get_document("historicoStatus")
            .unwrap();
        assert_eq!(pushed.get_str("de").unwrap(), "Sem status");
        assert_eq!(pushed.get("responsavel"), Some(&Bson::Null));
    }

    #[test]
    fn test_collaborator_update_document() {
        let update = collaborator_update_document(&CollaboratorAssignment {
            colaborador: "Bruno".to_string(),
            atribuido_por: Some("ana@example.com".to_string()),
            at: at(),
        });
        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("colaborador").unwrap(), "Bruno");
        assert_eq!(set.get_str("atribuidoPor").unwrap(), "ana@example.com");
        assert!(set.get_datetime("dataAtribuicao").is_ok());
    }

    #[test]
    fn test_dashboard_projection_lists_fields() {
        let projection = dashboard_projection();
        assert_eq!(projection.len(), DASHBOARD_FIELDS.len());
        assert_eq!(projection.get_i32("valorCapa").unwrap(), 1);
    }
}
