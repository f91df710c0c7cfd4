//! In-memory process store for tests and local runs

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{ProcessStore, StoreResult};
use crate::models::{
    CollaboratorAssignment, MonetaryValue, Process, StatusChange, UpdateOutcome,
};
use crate::pagination::PageRequest;
use crate::query::ProcessFilter;

/// Renders timestamps the same way BSON dates come back from MongoDB
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryProcessStore {
    processes: Arc<RwLock<Vec<Process>>>,
}

impl InMemoryProcessStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_processes(processes: Vec<Process>) -> Self {
        Self {
            processes: Arc::new(RwLock::new(processes)),
        }
    }

    /// Snapshot of the record with the given `nup`
    pub async fn get(&self, nup: &str) -> Option<Process> {
        self.processes
            .read()
            .await
            .iter()
            .find(|p| p.nup.as_deref() == Some(nup))
            .cloned()
    }

    async fn matching_sorted(&self, filter: &ProcessFilter) -> Vec<Process> {
        let processes = self.processes.read().await;
        let mut matching: Vec<Process> = processes
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        // Missing dates sort last, as MongoDB orders nulls below any string
        matching.sort_by(|a, b| b.data_importacao.cmp(&a.data_importacao));
        matching
    }
}

fn dashboard_projection(process: Process) -> Process {
    Process {
        id: process.id,
        nup: process.nup,
        numero_processo: process.numero_processo,
        credenciado: process.credenciado,
        status: process.status,
        responsavel: process.responsavel,
        tratamento: process.tratamento,
        tipo_processo: process.tipo_processo,
        producao: process.producao,
        valor_capa: process.valor_capa,
        data_recebimento: process.data_recebimento,
        ultima_atualizacao: process.ultima_atualizacao,
        ..Default::default()
    }
}

#[async_trait]
impl ProcessStore for InMemoryProcessStore {
    async fn count(&self, filter: &ProcessFilter) -> StoreResult<u64> {
        let processes = self.processes.read().await;
        Ok(processes.iter().filter(|p| filter.matches(p)).count() as u64)
    }

    async fn find_page(
        &self,
        filter: &ProcessFilter,
        page: &PageRequest,
    ) -> StoreResult<Vec<Process>> {
        let skip = usize::try_from(page.skip()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit).unwrap_or(usize::MAX);

        Ok(self
            .matching_sorted(filter)
            .await
            .into_iter()
            .skip(skip)
            .take(limit)
            .collect())
    }

    async fn find_for_dashboard(&self, filter: &ProcessFilter) -> StoreResult<Vec<Process>> {
        let processes = self.processes.read().await;
        Ok(processes
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .map(dashboard_projection)
            .collect())
    }

    async fn update_status(&self, nup: &str, change: &StatusChange) -> StoreResult<UpdateOutcome> {
        let mut processes = self.processes.write().await;
        let Some(process) = processes.iter_mut().find(|p| p.nup.as_deref() == Some(nup)) else {
            debug!("No process with nup {} to update", nup);
            return Ok(UpdateOutcome::default());
        };

        process.status = Some(change.new_status().to_string());
        process.ultima_atualizacao = Some(format_timestamp(change.at()));
        process.historico_status.push(change.transition.clone());

        let values = &change.values;
        if let Some(v) = values.valor_capa {
            process.valor_capa = Some(MonetaryValue::Number(v));
        }
        if let Some(v) = values.valor_glosa {
            process.valor_glosa = Some(MonetaryValue::Number(v));
        }
        if let Some(v) = values.valor_liberado {
            process.valor_liberado = Some(MonetaryValue::Number(v));
        }

        Ok(UpdateOutcome {
            matched: 1,
            modified: 1,
        })
    }

    async fn assign_collaborator(
        &self,
        nup: &str,
        assignment: &CollaboratorAssignment,
    ) -> StoreResult<UpdateOutcome> {
        let mut processes = self.processes.write().await;
        let Some(process) = processes.iter_mut().find(|p| p.nup.as_deref() == Some(nup)) else {
            debug!("No process with nup {} to assign", nup);
            return Ok(UpdateOutcome::default());
        };

        let before = (
            process.colaborador.clone(),
            process.data_atribuicao.clone(),
            process.atribuido_por.clone(),
        );

        process.colaborador = Some(assignment.colaborador.clone());
        process.data_atribuicao = Some(format_timestamp(assignment.at));
        process.atribuido_por = assignment.atribuido_por.clone();

        let after = (
            process.colaborador.clone(),
            process.data_atribuicao.clone(),
            process.atribuido_por.clone(),
        );

        Ok(UpdateOutcome {
            matched: 1,
            modified: u64::from(before != after),
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
