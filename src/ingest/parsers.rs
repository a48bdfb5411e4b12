//! Line parsers for the five dataset formats

use super::framework::{non_numeric_at, parse_f64, require_fields, Dataset, DatasetParser};
use crate::record::{
    CausalRecord, CorrelationRecord, MutationSignificanceRecord, MutexRecord, SifRelationRecord,
};
use crate::relation::CausalRelation;
use crate::site::GeneSite;

/// `gene1-site \t gene2-site \t correlation \t p-value`
pub struct CorrelationParser;

impl DatasetParser for CorrelationParser {
    type Record = CorrelationRecord;

    fn dataset(&self) -> Dataset {
        Dataset::Correlations
    }

    /// Entries with `/` are incorrectly formatted upstream
    fn skip_line(&self, line: &str) -> bool {
        line.contains('/')
    }

    fn parse_fields(&self, fields: &[&str]) -> Result<Self::Record, String> {
        require_fields(fields, 4)?;
        Ok(CorrelationRecord {
            first: GeneSite::parse(fields[0]),
            second: GeneSite::parse(fields[1]),
            correlation: parse_f64(fields[2], "correlation")?,
            p_value: parse_f64(fields[3], "p-value")?,
        })
    }
}

/// `source-site \t relation \t target-site \t uri uri ...`
pub struct CausalityParser;

impl DatasetParser for CausalityParser {
    type Record = CausalRecord;

    fn dataset(&self) -> Dataset {
        Dataset::Causality
    }

    fn parse_fields(&self, fields: &[&str]) -> Result<Self::Record, String> {
        require_fields(fields, 3)?;
        let relation: CausalRelation = fields[1].trim().parse().map_err(|e: crate::Error| e.to_string())?;
        let source_uris = fields
            .get(3)
            .map(|uris| uris.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        Ok(CausalRecord {
            source: GeneSite::parse(fields[0]),
            target: GeneSite::parse(fields[2]),
            relation,
            source_uris,
        })
    }
}

/// Fixed-column scores file: gene at index 1, p-value at index 17
pub struct MutationSignificanceParser;

const MUTSIG_GENE_COLUMN: usize = 1;
const MUTSIG_P_VALUE_COLUMN: usize = 17;

impl DatasetParser for MutationSignificanceParser {
    type Record = MutationSignificanceRecord;

    fn dataset(&self) -> Dataset {
        Dataset::MutationSignificance
    }

    fn is_header(&self, fields: &[&str]) -> bool {
        non_numeric_at(fields, MUTSIG_P_VALUE_COLUMN + 1, MUTSIG_P_VALUE_COLUMN)
    }

    fn parse_fields(&self, fields: &[&str]) -> Result<Self::Record, String> {
        require_fields(fields, MUTSIG_P_VALUE_COLUMN + 1)?;
        Ok(MutationSignificanceRecord {
            gene: fields[MUTSIG_GENE_COLUMN].trim().to_uppercase(),
            p_value: parse_f64(fields[MUTSIG_P_VALUE_COLUMN], "p-value")?,
        })
    }
}

/// `gene1 \t relation \t gene2`
pub struct SifRelationParser;

impl DatasetParser for SifRelationParser {
    type Record = SifRelationRecord;

    fn dataset(&self) -> Dataset {
        Dataset::SifRelations
    }

    fn parse_fields(&self, fields: &[&str]) -> Result<Self::Record, String> {
        require_fields(fields, 3)?;
        Ok(SifRelationRecord {
            gene1: fields[0].trim().to_uppercase(),
            gene2: fields[2].trim().to_uppercase(),
            relation: fields[1].trim().to_string(),
        })
    }
}

/// `score \t _ \t gene1 \t gene2 [\t gene3]`
pub struct MutexParser;

impl DatasetParser for MutexParser {
    type Record = MutexRecord;

    fn dataset(&self) -> Dataset {
        Dataset::Mutex
    }

    fn is_header(&self, fields: &[&str]) -> bool {
        non_numeric_at(fields, 4, 0)
    }

    fn parse_fields(&self, fields: &[&str]) -> Result<Self::Record, String> {
        require_fields(fields, 4)?;
        let gene3 = fields
            .get(4)
            .map(|g| g.trim().to_uppercase())
            .filter(|g| !g.is_empty());

        Ok(MutexRecord {
            gene1: fields[2].trim().to_uppercase(),
            gene2: fields[3].trim().to_uppercase(),
            gene3,
            score: parse_f64(fields[0], "score")?,
        })
    }
}
