//! Raw provider answers, before normalization.

use chrono::{DateTime, Utc};

use crate::models::{CanonicalRecord, Identifier};

use super::cz_ares::models::{AresSubject, AresVrRecord};
use super::debt_register::DebtReport;
use super::hu_nav::models::NavTaxpayerResponse;
use super::pl_ceidg::models::CeidgFirm;
use super::pl_krs::models::KrsExtract;
use super::pl_white_list::models::WlSubject;
use super::sk_rpo::models::RpoEntity;

/// Provider-specific payload shapes.
#[derive(Debug, Clone)]
pub enum RawPayload {
    SkRpo(Box<RpoEntity>),
    CzAres {
        subject: Box<AresSubject>,
        /// Commercial register detail; absent for entities outside the register.
        register: Option<Box<AresVrRecord>>,
    },
    PlKrs(Box<KrsExtract>),
    PlWhiteList(Box<WlSubject>),
    PlCeidg(Box<CeidgFirm>),
    HuNav(Box<NavTaxpayerResponse>),
    /// Sources (gateways, stubs) that already answer in the canonical schema.
    Canonical(Box<CanonicalRecord>),
}

/// One adapter answer for one entity.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// The identifier that was requested.
    pub identifier: Identifier,
    pub provider: &'static str,
    pub fetched_at: DateTime<Utc>,
    pub payload: RawPayload,
    /// Debtor list answer; `None` when not consulted or the lookup failed.
    pub debts: Option<DebtReport>,
}
