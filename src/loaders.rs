//! Per-entity connection loaders
//!
//! Each loader is a declarative instantiation of the shared pipeline in
//! [`crate::query`]: an audit name, localized entity labels, the
//! sortable-field allow-list (including computed summary fields), and the
//! filter predicate. The node types mirror the documents the scan platform
//! stores: a unique `_key` plus the entity's attributes.

use async_graphql::SimpleObject;
use serde::{Deserialize, Serialize};

use crate::i18n::EntityLabel;
use crate::query::{ConnectionLoader, ConnectionNode, SortKey};
use crate::types::DateTime;

/// One TLS scan result for a domain.
#[derive(Debug, Clone, SimpleObject, Serialize, Deserialize)]
pub struct SslScan {
    #[serde(rename = "_key")]
    pub key: String,
    pub timestamp: DateTime,
    pub strong_ciphers: Vec<String>,
    pub acceptable_ciphers: Vec<String>,
    pub weak_ciphers: Vec<String>,
    pub ccs_injection_vulnerable: bool,
    pub heartbleed_vulnerable: bool,
}

impl ConnectionNode for SslScan {
    const TYPE_NAME: &'static str = "SslScan";

    fn key(&self) -> &str {
        &self.key
    }
}

/// A user's membership in an organization, with the org's display fields
/// denormalized for ordering and search.
#[derive(Debug, Clone, SimpleObject, Serialize, Deserialize)]
pub struct Affiliation {
    #[serde(rename = "_key")]
    pub key: String,
    pub permission: String,
    pub org_key: String,
    pub org_name_en: String,
    pub org_name_fr: String,
    pub org_acronym_en: String,
    pub org_acronym_fr: String,
}

impl ConnectionNode for Affiliation {
    const TYPE_NAME: &'static str = "Affiliation";

    fn key(&self) -> &str {
        &self.key
    }
}

/// A domain claimed by an organization.
#[derive(Debug, Clone, SimpleObject, Serialize, Deserialize)]
pub struct Domain {
    #[serde(rename = "_key")]
    pub key: String,
    pub domain: String,
    pub last_ran: DateTime,
}

impl ConnectionNode for Domain {
    const TYPE_NAME: &'static str = "Domain";

    fn key(&self) -> &str {
        &self.key
    }
}

/// An organization with its scan summary rollups.
#[derive(Debug, Clone, SimpleObject, Serialize, Deserialize)]
pub struct Organization {
    #[serde(rename = "_key")]
    pub key: String,
    pub name_en: String,
    pub name_fr: String,
    pub acronym_en: String,
    pub acronym_fr: String,
    pub verified: bool,
    pub domain_count: u32,
    pub https_pass: u32,
    pub https_fail: u32,
    pub dmarc_pass: u32,
    pub dmarc_fail: u32,
}

impl ConnectionNode for Organization {
    const TYPE_NAME: &'static str = "Organization";

    fn key(&self) -> &str {
        &self.key
    }
}

/// SSL scans for one domain, ordered by scan time, filterable by an
/// inclusive date range.
pub fn ssl_scans_by_domain() -> ConnectionLoader<SslScan> {
    ConnectionLoader::new(
        "loadSslConnectionsByDomainId",
        EntityLabel {
            en: "SSL scan",
            fr: "analyse SSL",
        },
    )
    .sortable("timestamp", |scan: &SslScan| SortKey::Time(scan.timestamp))
    .filtered(|scan, filters| filters.in_date_range(&scan.timestamp))
}

/// Affiliations for one user, searchable by the org's localized names.
pub fn affiliations_by_user() -> ConnectionLoader<Affiliation> {
    ConnectionLoader::new(
        "loadAffiliationConnectionsByUserId",
        EntityLabel {
            en: "affiliation",
            fr: "affiliation",
        },
    )
    .sortable("org-acronym-en", |a: &Affiliation| {
        SortKey::Text(a.org_acronym_en.clone())
    })
    .sortable("org-acronym-fr", |a: &Affiliation| {
        SortKey::Text(a.org_acronym_fr.clone())
    })
    .sortable("org-name-en", |a: &Affiliation| {
        SortKey::Text(a.org_name_en.clone())
    })
    .sortable("org-name-fr", |a: &Affiliation| {
        SortKey::Text(a.org_name_fr.clone())
    })
    .sortable("permission", |a: &Affiliation| {
        SortKey::Text(a.permission.clone())
    })
    .filtered(|a, filters| {
        filters.matches_search(&[
            &a.org_name_en,
            &a.org_name_fr,
            &a.org_acronym_en,
            &a.org_acronym_fr,
        ])
    })
}

/// Verified domains for one organization.
pub fn domains_by_org() -> ConnectionLoader<Domain> {
    ConnectionLoader::new(
        "loadDomainConnectionsByOrgId",
        EntityLabel {
            en: "domain",
            fr: "domaine",
        },
    )
    .sortable("domain", |d: &Domain| SortKey::Text(d.domain.clone()))
    .sortable("last-ran", |d: &Domain| SortKey::Time(d.last_ran))
    .filtered(|d, filters| {
        filters.matches_search(&[&d.domain]) && filters.in_date_range(&d.last_ran)
    })
}

/// Verified organizations, orderable by name or by computed summary counts,
/// searchable by localized names and acronyms.
pub fn verified_organizations() -> ConnectionLoader<Organization> {
    ConnectionLoader::new(
        "loadVerifiedOrgConnections",
        EntityLabel {
            en: "verified organization",
            fr: "organisation vérifiée",
        },
    )
    .sortable("name-en", |o: &Organization| SortKey::Text(o.name_en.clone()))
    .sortable("name-fr", |o: &Organization| SortKey::Text(o.name_fr.clone()))
    .sortable("acronym-en", |o: &Organization| {
        SortKey::Text(o.acronym_en.clone())
    })
    .sortable("acronym-fr", |o: &Organization| {
        SortKey::Text(o.acronym_fr.clone())
    })
    .sortable("domain-count", |o: &Organization| {
        SortKey::Number(o.domain_count as i64)
    })
    .sortable("https-pass", |o: &Organization| {
        SortKey::Number(o.https_pass as i64)
    })
    .sortable("https-fail", |o: &Organization| {
        SortKey::Number(o.https_fail as i64)
    })
    .sortable("dmarc-pass", |o: &Organization| {
        SortKey::Number(o.dmarc_pass as i64)
    })
    .sortable("dmarc-fail", |o: &Organization| {
        SortKey::Number(o.dmarc_fail as i64)
    })
    .filtered(|o, filters| {
        o.verified
            && filters.matches_search(&[&o.name_en, &o.name_fr, &o.acronym_en, &o.acronym_fr])
    })
}
