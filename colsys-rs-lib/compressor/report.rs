use std::collections::BTreeMap;
use std::time::Duration;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::compressor::options::Mode;

/// Everything measured during one solve call.
#[derive(Clone, Debug)]
pub struct SolveReport {
    pub mode: Mode,
    pub text_len: usize,
    /// Number of phrases in the optimal parse.
    pub phrase_count: usize,
    /// Distinct terminal symbols in the text.
    pub distinct_symbols: usize,
    /// Number of active cut rules.
    pub truncation_count: usize,
    pub variables: usize,
    pub hard_clauses: usize,
    pub soft_clauses: usize,
    /// Hard clause length -> count.
    pub clause_lengths: BTreeMap<usize, usize>,
    /// Time spent scanning candidates and building the formula.
    pub time_encode: Duration,
    /// Wall time of the whole solve call.
    pub time_total: Duration,
}

impl SolveReport {
    /// Parse-based size: phrases plus cuts. Bounded by the alphabet size
    /// from below and the text length from above.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.phrase_count + self.truncation_count
    }

    /// Grammar size counting each distinct terminal once instead of each
    /// unit-length phrase.
    #[must_use]
    pub fn grammar_size(&self) -> usize {
        self.phrase_count.saturating_sub(1) + self.distinct_symbols + self.truncation_count
    }

    /// Render the report as a two-column table.
    #[must_use]
    pub fn to_table(&self) -> String {
        let lengths = self
            .clause_lengths
            .iter()
            .map(|(len, count)| format!("{len}:{count}"))
            .collect::<Vec<_>>()
            .join(" ");
        let rows = vec![
            Row::new("mode", self.mode.to_string()),
            Row::new("text length", self.text_len.to_string()),
            Row::new("rules", self.rule_count().to_string()),
            Row::new("grammar size", self.grammar_size().to_string()),
            Row::new("phrases", self.phrase_count.to_string()),
            Row::new("cuts", self.truncation_count.to_string()),
            Row::new("variables", self.variables.to_string()),
            Row::new("hard clauses", self.hard_clauses.to_string()),
            Row::new("soft clauses", self.soft_clauses.to_string()),
            Row::new("clause lengths", lengths),
            Row::new("encode time", format!("{:?}", self.time_encode)),
            Row::new("total time", format!("{:?}", self.time_total)),
        ];
        let mut table = Table::new(rows);
        table.with(Style::psql());
        table.to_string()
    }
}

#[derive(Tabled)]
struct Row {
    metric: &'static str,
    value: String,
}

impl Row {
    fn new(metric: &'static str, value: String) -> Self {
        Row { metric, value }
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::SolveReport;
    use crate::compressor::options::Mode;

    fn report(phrases: usize, symbols: usize, cuts: usize) -> SolveReport {
        SolveReport {
            mode: Mode::Collage,
            text_len: 0,
            phrase_count: phrases,
            distinct_symbols: symbols,
            truncation_count: cuts,
            variables: 0,
            hard_clauses: 0,
            soft_clauses: 0,
            clause_lengths: BTreeMap::new(),
            time_encode: Duration::ZERO,
            time_total: Duration::ZERO,
        }
    }

    #[test]
    fn size_metrics() {
        // "aaaa" parsed as a | run(a,4): two phrases, one symbol.
        let r = report(2, 1, 0);
        assert_eq!(r.rule_count(), 2);
        assert_eq!(r.grammar_size(), 2);
        // One cut adds to both metrics.
        let r = report(3, 2, 1);
        assert_eq!(r.rule_count(), 4);
        assert_eq!(r.grammar_size(), 5);
        // Degenerate empty text.
        let r = report(0, 0, 0);
        assert_eq!(r.rule_count(), 0);
        assert_eq!(r.grammar_size(), 0);
    }

    #[test]
    fn table_renders_all_rows() {
        let table = report(2, 1, 0).to_table();
        assert!(table.contains("grammar size"));
        assert!(table.contains("collage"));
    }
}
