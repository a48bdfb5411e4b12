//! Causal relation labels
//!
//! The causal dataset asserts four forward relations. Each one is stored
//! together with its inverse so a lookup from either endpoint succeeds:
//! - `phosphorylates` / `is-phosphorylated-by`
//! - `dephosphorylates` / `is-dephosphorylated-by`
//! - `upregulates-expression` / `expression-is-upregulated-by`
//! - `downregulates-expression` / `expression-is-downregulated-by`

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Wildcard relation accepted by target lookups: matches every label.
pub const MODULATES: &str = "MODULATES";

/// Relation used by the interaction network to tag upstream regulators.
pub const CONTROLS_STATE_CHANGE_OF: &str = "controls-state-change-of";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CausalRelation {
    Phosphorylates,
    IsPhosphorylatedBy,
    Dephosphorylates,
    IsDephosphorylatedBy,
    UpregulatesExpression,
    ExpressionIsUpregulatedBy,
    DownregulatesExpression,
    ExpressionIsDownregulatedBy,
}

impl CausalRelation {
    pub fn as_str(&self) -> &'static str {
        match self {
            CausalRelation::Phosphorylates => "phosphorylates",
            CausalRelation::IsPhosphorylatedBy => "is-phosphorylated-by",
            CausalRelation::Dephosphorylates => "dephosphorylates",
            CausalRelation::IsDephosphorylatedBy => "is-dephosphorylated-by",
            CausalRelation::UpregulatesExpression => "upregulates-expression",
            CausalRelation::ExpressionIsUpregulatedBy => "expression-is-upregulated-by",
            CausalRelation::DownregulatesExpression => "downregulates-expression",
            CausalRelation::ExpressionIsDownregulatedBy => "expression-is-downregulated-by",
        }
    }

    pub fn all() -> &'static [CausalRelation] {
        &[
            CausalRelation::Phosphorylates,
            CausalRelation::IsPhosphorylatedBy,
            CausalRelation::Dephosphorylates,
            CausalRelation::IsDephosphorylatedBy,
            CausalRelation::UpregulatesExpression,
            CausalRelation::ExpressionIsUpregulatedBy,
            CausalRelation::DownregulatesExpression,
            CausalRelation::ExpressionIsDownregulatedBy,
        ]
    }

    /// Label of the mirrored row (endpoints swapped)
    pub fn inverse(&self) -> CausalRelation {
        match self {
            CausalRelation::Phosphorylates => CausalRelation::IsPhosphorylatedBy,
            CausalRelation::IsPhosphorylatedBy => CausalRelation::Phosphorylates,
            CausalRelation::Dephosphorylates => CausalRelation::IsDephosphorylatedBy,
            CausalRelation::IsDephosphorylatedBy => CausalRelation::Dephosphorylates,
            CausalRelation::UpregulatesExpression => CausalRelation::ExpressionIsUpregulatedBy,
            CausalRelation::ExpressionIsUpregulatedBy => CausalRelation::UpregulatesExpression,
            CausalRelation::DownregulatesExpression => CausalRelation::ExpressionIsDownregulatedBy,
            CausalRelation::ExpressionIsDownregulatedBy => CausalRelation::DownregulatesExpression,
        }
    }
}

impl FromStr for CausalRelation {
    type Err = crate::Error;

    /// Labels are matched exactly; there is no fallback.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CausalRelation::all()
            .iter()
            .find(|rel| rel.as_str() == s)
            .copied()
            .ok_or_else(|| crate::Error::UnknownRelation(s.to_string()))
    }
}

impl std::fmt::Display for CausalRelation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Relation filter for outgoing-edge lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationFilter {
    /// `MODULATES`: every outgoing edge
    Any,
    /// Exact label match. Unknown labels are kept verbatim and simply match nothing.
    Label(String),
}

impl RelationFilter {
    pub fn parse(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case(MODULATES) {
            RelationFilter::Any
        } else {
            RelationFilter::Label(label.trim().to_string())
        }
    }
}
