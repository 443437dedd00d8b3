//! Localized (en/fr) user-facing message selection
//!
//! Only the messages surfaced to API clients are localized; everything
//! written to server logs stays English. The locale is carried on the
//! request context by the caller, there is no global locale state.

use crate::pagination::{LimitArg, PaginationIssue};

/// Request language for user-facing error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    Fr,
}

/// Localized display name of an entity, used inside error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityLabel {
    pub en: &'static str,
    pub fr: &'static str,
}

impl EntityLabel {
    pub fn for_locale(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => self.en,
            Locale::Fr => self.fr,
        }
    }
}

pub(crate) fn pagination_message(
    locale: Locale,
    issue: PaginationIssue,
    entity: &EntityLabel,
) -> String {
    let name = entity.for_locale(locale);
    match (locale, issue) {
        (Locale::En, PaginationIssue::BothLimits) => format!(
            "Requesting both `first` and `last` to paginate the `{name}` connection is not supported."
        ),
        (Locale::Fr, PaginationIssue::BothLimits) => format!(
            "Demander à la fois `first` et `last` pour paginer la connexion `{name}` n'est pas supporté."
        ),
        (Locale::En, PaginationIssue::NoLimit) => format!(
            "You must provide a `first` or `last` value to properly paginate the `{name}` connection."
        ),
        (Locale::Fr, PaginationIssue::NoLimit) => format!(
            "Vous devez fournir une valeur `first` ou `last` pour paginer correctement la connexion `{name}`."
        ),
        (Locale::En, PaginationIssue::Negative { arg, .. }) => format!(
            "`{}` on the `{name}` connection cannot be less than zero.",
            arg.name()
        ),
        (Locale::Fr, PaginationIssue::Negative { arg, .. }) => format!(
            "`{}` sur la connexion `{name}` ne peut être inférieur à zéro.",
            arg.name()
        ),
        (Locale::En, PaginationIssue::ExceedsMax { arg, value }) => format!(
            "Requesting `{value}` records on the `{name}` connection exceeds the `{}` limit of 100 records.",
            arg.name()
        ),
        (Locale::Fr, PaginationIssue::ExceedsMax { arg, value }) => format!(
            "Demander `{value}` enregistrements sur la connexion `{name}` dépasse la limite de 100 enregistrements de `{}`.",
            arg.name()
        ),
    }
}

pub(crate) fn invalid_cursor(locale: Locale) -> String {
    match locale {
        Locale::En => "Invalid cursor provided.".to_string(),
        Locale::Fr => "Curseur fourni invalide.".to_string(),
    }
}

pub(crate) fn not_found(locale: Locale, entity: &EntityLabel) -> String {
    match locale {
        Locale::En => format!(
            "No {} could be found for the cursor provided.",
            entity.en
        ),
        Locale::Fr => format!(
            "Aucune {} n'a pu être trouvée pour le curseur fourni.",
            entity.fr
        ),
    }
}

pub(crate) fn unable_to_load(locale: Locale, entity: &EntityLabel) -> String {
    match locale {
        Locale::En => format!("Unable to load {}(s). Please try again.", entity.en),
        Locale::Fr => format!(
            "Impossible de charger le(s) {}. Veuillez réessayer.",
            entity.fr
        ),
    }
}
