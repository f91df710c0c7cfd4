//! Request-level operations over a [`ProcessStore`]
//!
//! Validates inputs, builds filters, and turns store results into the
//! outcomes the HTTP layer reports.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::dashboard::{self, ResponsibleSummary};
use crate::error::ApiError;
use crate::models::{
    CollaboratorAssignment, CollaboratorRequest, MonetaryUpdate, MonetaryValue, Process,
    StatusChange, StatusTransition, StatusUpdateRequest, UNKNOWN_PREVIOUS_STATUS,
};
use crate::pagination::{Page, PageMeta, PageRequest};
use crate::query::{DashboardParams, ListParams, ProcessFilter};
use crate::store::ProcessStore;

pub const MSG_INCOMPLETE_DATA: &str = "Dados incompletos";
pub const MSG_COLLABORATOR_REQUIRED: &str = "Nome do colaborador é obrigatório";
pub const MSG_NOT_FOUND: &str = "Processo não encontrado";
pub const MSG_STATUS_UPDATED: &str = "Status atualizado com sucesso!";
pub const MSG_COLLABORATOR_UPDATED: &str = "Colaborador atualizado com sucesso!";

#[derive(Clone)]
pub struct ProcessService {
    store: Arc<dyn ProcessStore>,
}

fn required(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn monetary(field: &str, value: Option<MonetaryValue>) -> Result<Option<f64>, ApiError> {
    match value {
        None => Ok(None),
        Some(value) => value
            .to_number()
            .map(Some)
            .ok_or_else(|| ApiError::InvalidInput(format!("Valor inválido para {field}"))),
    }
}

impl ProcessService {
    pub fn new(store: Arc<dyn ProcessStore>) -> Self {
        Self { store }
    }

    /// Filtered, paginated listing
    pub async fn list(&self, params: &ListParams) -> Result<Page<Process>, ApiError> {
        let filter = ProcessFilter::for_listing(params);
        let request = PageRequest::from_query(params.page.as_deref(), params.limit.as_deref());

        let total = self.store.count(&filter).await?;
        let data = self.store.find_page(&filter, &request).await?;

        Ok(Page {
            data,
            meta: PageMeta::new(total, &request),
        })
    }

    /// Per responsible party totals for the dashboard
    pub async fn dashboard(
        &self,
        params: &DashboardParams,
    ) -> Result<Vec<ResponsibleSummary>, ApiError> {
        let filter = ProcessFilter::for_dashboard(params);
        let processes = self.store.find_for_dashboard(&filter).await?;
        Ok(dashboard::summarize(processes))
    }

    /// Validate a status update request into a change ready for the store
    pub fn status_change(request: StatusUpdateRequest) -> Result<StatusChange, ApiError> {
        let (Some(novo_status), Some(usuario_email)) = (
            required(request.novo_status),
            required(request.usuario_email),
        ) else {
            return Err(ApiError::InvalidInput(MSG_INCOMPLETE_DATA.to_string()));
        };

        let values = MonetaryUpdate {
            valor_capa: monetary("valorCapa", request.valor_capa)?,
            valor_glosa: monetary("valorGlosa", request.valor_glosa)?,
            valor_liberado: monetary("valorLiberado", request.valor_liberado)?,
        };

        Ok(StatusChange {
            transition: StatusTransition {
                de: required(request.status_anterior)
                    .unwrap_or_else(|| UNKNOWN_PREVIOUS_STATUS.to_string()),
                para: novo_status,
                usuario: usuario_email,
                responsavel: request.usuario_nome,
                data: Utc::now(),
            },
            values,
        })
    }

    pub async fn update_status(
        &self,
        nup: &str,
        request: StatusUpdateRequest,
    ) -> Result<(), ApiError> {
        let change = Self::status_change(request)?;
        let outcome = self.store.update_status(nup, &change).await?;

        if !outcome.found() {
            warn!("Status update for unknown process {}", nup);
            return Err(ApiError::NotFound(MSG_NOT_FOUND.to_string()));
        }

        info!(
            "Process {} moved from '{}' to '{}' by {}",
            nup, change.transition.de, change.transition.para, change.transition.usuario
        );
        Ok(())
    }

    pub async fn assign_collaborator(
        &self,
        nup: &str,
        request: CollaboratorRequest,
    ) -> Result<(), ApiError> {
        let Some(colaborador) = required(request.novo_colaborador) else {
            return Err(ApiError::InvalidInput(MSG_COLLABORATOR_REQUIRED.to_string()));
        };

        let assignment = CollaboratorAssignment {
            colaborador,
            atribuido_por: request.usuario_email,
            at: Utc::now(),
        };
        let outcome = self.store.assign_collaborator(nup, &assignment).await?;

        if !outcome.found() {
            warn!("Collaborator assignment for unknown process {}", nup);
            return Err(ApiError::NotFound(MSG_NOT_FOUND.to_string()));
        }

        info!("Process {} assigned to {}", nup, assignment.colaborador);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryProcessStore;

    fn request(novo_status: Option<&str>, email: Option<&str>) -> StatusUpdateRequest {
        StatusUpdateRequest {
            novo_status: novo_status.map(str::to_string),
            usuario_email: email.map(str::to_string),
            usuario_nome: Some("Ana".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_status_change_requires_status_and_email() {
        for (status, email) in [
            (None, Some("a@b.c")),
            (Some("novo"), None),
            (Some(""), Some("a@b.c")),
        ] {
            let err = ProcessService::status_change(request(status, email)).unwrap_err();
            assert!(matches!(err, ApiError::InvalidInput(ref m) if m == MSG_INCOMPLETE_DATA));
        }
    }

    #[test]
    fn test_status_change_defaults_previous_status() {
        let change = ProcessService::status_change(request(Some("novo"), Some("a@b.c"))).unwrap();
        assert_eq!(change.transition.de, UNKNOWN_PREVIOUS_STATUS);
        assert_eq!(change.transition.para, "novo");
        assert_eq!(change.transition.responsavel.as_deref(), Some("Ana"));
        assert!(change.values.is_empty());
    }

    #[test]
    fn test_status_change_coerces_values() {
        let mut req = request(Some("novo"), Some("a@b.c"));
        req.status_anterior = Some("em análise".to_string());
        req.valor_capa = Some("1.500,00".into());
        req.valor_liberado = Some(900.0.into());

        let change = ProcessService::status_change(req).unwrap();
        assert_eq!(change.transition.de, "em análise");
        assert_eq!(change.values.valor_capa, Some(1500.0));
        assert_eq!(change.values.valor_glosa, None);
        assert_eq!(change.values.valor_liberado, Some(900.0));
    }

    #[test]
    fn test_status_change_rejects_unparsable_value() {
        let mut req = request(Some("novo"), Some("a@b.c"));
        req.valor_glosa = Some("abc".into());
        let err = ProcessService::status_change(req).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_update_status_not_found() {
        let service = ProcessService::new(Arc::new(InMemoryProcessStore::new()));
        let err = service
            .update_status("missing", request(Some("novo"), Some("a@b.c")))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_assign_collaborator_requires_name() {
        let service = ProcessService::new(Arc::new(InMemoryProcessStore::new()));
        let err = service
            .assign_collaborator("x", CollaboratorRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(ref m) if m == MSG_COLLABORATOR_REQUIRED));
    }

    #[tokio::test]
    async fn test_assign_collaborator_same_value_is_success() {
        let store = InMemoryProcessStore::with_processes(vec![Process {
            nup: Some("N1".to_string()),
            ..Default::default()
        }]);
        let service = ProcessService::new(Arc::new(store.clone()));
        let req = CollaboratorRequest {
            novo_colaborador: Some("Bruno".to_string()),
            usuario_email: None,
        };

        service.assign_collaborator("N1", req.clone()).await.unwrap();
        service.assign_collaborator("N1", req).await.unwrap();

        let stored = store.get("N1").await.unwrap();
        assert_eq!(stored.colaborador.as_deref(), Some("Bruno"));
        assert!(stored.atribuido_por.is_none());
    }
}
