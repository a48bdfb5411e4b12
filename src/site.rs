//! Gene/phosphosite tokens
//!
//! Dataset entries name an endpoint as `GENE` or `GENE-SITE`, e.g. `AKT1-S473S`.
//! The site string keeps the upstream formatting: a residue letter, the
//! position digits and a trailing residue letter that carries no information.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Placeholder stored when a token has no site suffix.
pub const BLANK_SITE: &str = " ";

static SITE_PATTERN: OnceLock<Regex> = OnceLock::new();

fn site_pattern() -> &'static Regex {
    SITE_PATTERN.get_or_init(|| Regex::new(r"([TYS][0-9]+)[TYS]").expect("site pattern is a valid regex"))
}

/// Canonical form of a gene identifier as stored in every table
pub fn normalize_gene(gene: &str) -> String {
    gene.trim().to_uppercase()
}

/// A (gene, phosphosite) endpoint as stored in the correlation and causality tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeneSite {
    pub gene: String,
    /// Raw site string, or [`BLANK_SITE`] when absent
    pub site: String,
}

impl GeneSite {
    pub fn new(gene: impl Into<String>, site: impl Into<String>) -> Self {
        Self {
            gene: gene.into(),
            site: site.into(),
        }
    }

    /// Parse a dataset token. The token is upper-cased and split on `-`;
    /// only the first two parts are kept.
    pub fn parse(token: &str) -> Self {
        let upper = normalize_gene(token);
        let mut parts = upper.split('-');
        let gene = parts.next().unwrap_or_default().to_string();
        let site = match parts.next() {
            Some(s) => s.to_string(),
            None => BLANK_SITE.to_string(),
        };
        Self { gene, site }
    }

    pub fn has_site(&self) -> bool {
        !self.site.trim().is_empty()
    }

    /// Build an endpoint from separately supplied gene and site; an empty site
    /// becomes [`BLANK_SITE`].
    pub fn from_parts(gene: &str, site: &str) -> Self {
        let site = site.trim();
        Self {
            gene: normalize_gene(gene),
            site: if site.is_empty() { BLANK_SITE.to_string() } else { site.to_uppercase() },
        }
    }

    /// Phosphorylation modifications encoded in the site string
    pub fn modifications(&self) -> Vec<SiteModification> {
        parse_modifications(&self.site)
    }
}

impl fmt::Display for GeneSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_site() {
            write!(f, "{}-{}", self.gene, self.site)
        } else {
            write!(f, "{}", self.gene)
        }
    }
}

/// A single residue modification extracted from a site string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteModification {
    pub mod_type: String,
    pub residue: String,
    pub position: String,
    pub is_modified: bool,
}

impl SiteModification {
    pub fn phosphorylation(residue: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            mod_type: "phosphorylation".to_string(),
            residue: residue.into(),
            position: position.into(),
            is_modified: true,
        }
    }
}

/// Extract every `[TYS]<digits>[TYS]` occurrence, dropping the trailing letter.
pub fn parse_modifications(site: &str) -> Vec<SiteModification> {
    site_pattern()
        .captures_iter(site)
        .filter_map(|caps| caps.get(1))
        .map(|m| {
            let (residue, position) = m.as_str().split_at(1);
            SiteModification::phosphorylation(residue, position)
        })
        .collect()
}

/// Strip the leading residue letter and the trailing artifact letter,
/// e.g. `S473S` -> `473`. Blank or single-letter sites give an empty string.
pub fn trim_site(site: &str) -> String {
    let chars: Vec<char> = site.chars().collect();
    if chars.len() < 2 {
        return String::new();
    }
    chars[1..chars.len() - 1].iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_site() {
        let gs = GeneSite::parse("akt1-s473s");
        assert_eq!(gs.gene, "AKT1");
        assert_eq!(gs.site, "S473S");
        assert!(gs.has_site());
        assert_eq!(gs.to_string(), "AKT1-S473S");
    }

    #[test]
    fn test_parse_without_site() {
        let gs = GeneSite::parse("BRAF");
        assert_eq!(gs.gene, "BRAF");
        assert_eq!(gs.site, BLANK_SITE);
        assert!(!gs.has_site());
        assert_eq!(gs.to_string(), "BRAF");
    }

    #[test]
    fn test_from_parts() {
        assert_eq!(GeneSite::from_parts(" akt1 ", ""), GeneSite::new("AKT1", BLANK_SITE));
        assert_eq!(GeneSite::from_parts("AKT1", "s473s"), GeneSite::new("AKT1", "S473S"));
    }

    #[test]
    fn test_modifications() {
        let mods = parse_modifications("S133S");
        assert_eq!(mods.len(), 1);
        assert_eq!(mods[0].residue, "S");
        assert_eq!(mods[0].position, "133");
        assert_eq!(mods[0].mod_type, "phosphorylation");
        assert!(mods[0].is_modified);

        let multi = parse_modifications("T202T;Y204Y");
        assert_eq!(multi.len(), 2);
        assert_eq!(multi[1].residue, "Y");
        assert_eq!(multi[1].position, "204");

        assert!(parse_modifications(BLANK_SITE).is_empty());
    }

    #[test]
    fn test_trim_site() {
        assert_eq!(trim_site("S473S"), "473");
        assert_eq!(trim_site(BLANK_SITE), "");
        assert_eq!(trim_site(""), "");
    }
}
