//! Dashboard aggregation: per responsible party totals of `valorCapa`

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{Process, ProcessSummary};

/// Fields fetched from the store for the dashboard
pub const DASHBOARD_FIELDS: &[&str] = &[
    "responsavel",
    "valorCapa",
    "nup",
    "credenciado",
    "dataRecebimento",
    "numeroProcesso",
    "producao",
    "status",
    "tipoProcesso",
    "tratamento",
    "ultimaAtualizacao",
];

/// Aggregated figures for one responsible party
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsibleSummary {
    pub nome: String,
    pub qtd: u64,
    pub total: f64,
    pub processos: Vec<ProcessSummary>,
}

impl ResponsibleSummary {
    fn new(nome: String) -> Self {
        Self {
            nome,
            qtd: 0,
            total: 0.0,
            processos: Vec::new(),
        }
    }
}

/// Parse a pt-BR formatted amount such as `"1.500,00"`.
///
/// Every `.` is dropped as a thousands separator and the first `,` becomes
/// the decimal point. The longest numeric prefix is then read, so trailing
/// garbage is ignored (`"12,5 BRL"` is 12.5) and text without a leading
/// number yields `None`.
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned = text.replace('.', "").replacen(',', ".", 1);
    leading_number(cleaned.trim_start())
}

fn leading_number(text: &str) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Amount contributed by a single process
pub fn process_amount(process: &Process) -> f64 {
    process
        .valor_capa
        .as_ref()
        .map(|value| value.amount())
        .unwrap_or(0.0)
}

/// Group processes by `responsavel` and order the groups by total value,
/// largest first. Groups with equal totals keep the order in which their
/// first process was seen.
pub fn summarize(processes: Vec<Process>) -> Vec<ResponsibleSummary> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<ResponsibleSummary> = Vec::new();

    for process in processes {
        let amount = process_amount(&process);
        let nome = process.responsavel.clone().unwrap_or_default();

        let index = *positions.entry(nome.clone()).or_insert_with(|| {
            groups.push(ResponsibleSummary::new(nome));
            groups.len() - 1
        });

        let group = &mut groups[index];
        group.qtd += 1;
        group.total += amount;
        group.processos.push(ProcessSummary::from(process));
    }

    groups.sort_by(|a, b| b.total.total_cmp(&a.total));
    groups
}
