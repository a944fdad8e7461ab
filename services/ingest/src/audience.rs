//! Section-heuristic parser for the Instagram "Público" (audience) export.
//!
//! The file concatenates four tables with free-text titles between them:
//! age x gender (one row per bracket), then top cities, top countries and top
//! pages, each written horizontally as a line of names followed by a line of
//! values. There is no stable schema across locales or export versions, so
//! sections are found by substring and rows by shape. Lines that do not fit
//! are dropped and noted in `errors`; parsing never fails.

use serde::Serialize;
use tracing::debug;

use crate::coerce::{self, fold, parse_number};
use crate::model::{AgeGenderShare, CategoryShare, PageShare};
use crate::tabular::split_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    None,
    Age,
    Cities,
    Countries,
    Pages,
}

impl Section {
    /// Section introduced by a title line, if any. Checked in this order.
    /// Single-word markers match word prefixes ("principais" is not "pais").
    fn from_marker(folded_line: &str) -> Option<Section> {
        const MARKERS: &[(Section, &[&str])] = &[
            (Section::Age, &["faixa", "age range"]),
            (Section::Cities, &["cidades", "cities"]),
            (Section::Countries, &["pais", "countries"]),
            (Section::Pages, &["paginas", "pages"]),
        ];
        let words: Vec<&str> = folded_line
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        MARKERS
            .iter()
            .find(|(_, needles)| {
                needles.iter().any(|needle| {
                    if needle.contains(' ') {
                        folded_line.contains(needle)
                    } else {
                        words.iter().any(|w| w.starts_with(needle))
                    }
                })
            })
            .map(|(section, _)| *section)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::None => "none",
            Section::Age => "age",
            Section::Cities => "cities",
            Section::Countries => "countries",
            Section::Pages => "pages",
        }
    }
}

/// Pairing state for the horizontal sections.
#[derive(Debug, Clone, PartialEq)]
enum Pairing {
    Idle,
    AwaitingValues(Vec<String>),
}

/// A names line that never got its values line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnpairedHeader {
    pub section: Section,
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudienceReport {
    pub idade_genero: Vec<AgeGenderShare>,
    pub cidades: Vec<CategoryShare>,
    pub paises: Vec<CategoryShare>,
    pub paginas: Vec<PageShare>,
    pub sections_found: Vec<Section>,
    pub unpaired: Vec<UnpairedHeader>,
    pub errors: Vec<String>,
}

impl AudienceReport {
    pub fn is_empty(&self) -> bool {
        self.idade_genero.is_empty()
            && self.cidades.is_empty()
            && self.paises.is_empty()
            && self.paginas.is_empty()
    }
}

struct SectionParser {
    section: Section,
    pairing: Pairing,
    report: AudienceReport,
}

impl SectionParser {
    fn new() -> Self {
        Self {
            section: Section::None,
            pairing: Pairing::Idle,
            report: AudienceReport::default(),
        }
    }

    fn enter(&mut self, section: Section) {
        self.flush_pending();
        self.section = section;
        if !self.report.sections_found.contains(&section) {
            self.report.sections_found.push(section);
        }
    }

    fn flush_pending(&mut self) {
        if let Pairing::AwaitingValues(names) =
            std::mem::replace(&mut self.pairing, Pairing::Idle)
        {
            debug!(section = self.section.as_str(), "names line without values");
            self.report.unpaired.push(UnpairedHeader {
                section: self.section,
                names,
            });
        }
    }

    fn line(&mut self, line_num: usize, line: &str) {
        let folded = fold(line);
        if let Some(section) = Section::from_marker(&folded) {
            self.enter(section);
            return;
        }

        match self.section {
            Section::None => {}
            Section::Age => self.age_line(line_num, line, &folded),
            Section::Cities | Section::Countries | Section::Pages => {
                self.list_line(line_num, line)
            }
        }
    }

    fn age_line(&mut self, line_num: usize, line: &str, folded: &str) {
        if ["mulheres", "homens", "women"]
            .iter()
            .any(|h| folded.contains(h))
        {
            return;
        }

        let fields = split_line(line);
        let Some(bracket) = fields.first() else {
            return;
        };
        if !bracket.chars().any(|c| c.is_ascii_digit() || c == '+') {
            self.report
                .errors
                .push(format!("line {line_num}: not an age bracket: {line}"));
            return;
        }

        self.report.idade_genero.push(AgeGenderShare::new(
            bracket.clone(),
            parse_number(fields.get(1).map(String::as_str)),
            parse_number(fields.get(2).map(String::as_str)),
        ));
    }

    fn list_line(&mut self, line_num: usize, line: &str) {
        let fields = split_line(line);

        match std::mem::replace(&mut self.pairing, Pairing::Idle) {
            Pairing::Idle => {
                let has_name = fields.iter().any(|f| {
                    !f.is_empty() && coerce::parse_number_checked(Some(f)).defaulted
                });
                if has_name {
                    self.pairing = Pairing::AwaitingValues(fields);
                } else {
                    self.report
                        .errors
                        .push(format!("line {line_num}: values without a names line: {line}"));
                }
            }
            Pairing::AwaitingValues(names) => {
                for (name, value) in names.iter().zip(fields.iter()) {
                    if name.is_empty() {
                        continue;
                    }
                    let porcentagem = parse_number(Some(value));
                    match self.section {
                        Section::Pages => self.report.paginas.push(PageShare {
                            nome: name.clone(),
                            porcentagem,
                        }),
                        Section::Countries => self.report.paises.push(CategoryShare {
                            categoria: name.clone(),
                            porcentagem,
                        }),
                        _ => self.report.cidades.push(CategoryShare {
                            categoria: name.clone(),
                            porcentagem,
                        }),
                    }
                }
            }
        }
    }

    fn finish(mut self) -> AudienceReport {
        self.flush_pending();
        self.report
    }
}

/// Splits one audience export into its sub-tables.
pub fn parse_audience(text: &str) -> AudienceReport {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut parser = SectionParser::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("sep=") {
            continue;
        }
        parser.line(idx + 1, line);
    }

    parser.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_EXPORT: &str = "\
sep=,
\"Faixa etária e gênero\"
\"Faixa etária\",\"Mulheres\",\"Homens\"
\"18-24\",\"10,5\",\"5\"
\"25-34\",\"20\",\"12,5\"
\"65+\",\"1\",\"0,5\"

\"Principais cidades\"
\"São Paulo\",\"Rio de Janeiro\",\"Belo Horizonte\"
\"12,3\",\"8\",\"3,1\"

\"Principais países\"
\"Brasil\",\"Portugal\"
\"90\",\"4,2\"

\"Principais páginas\"
\"Página A\",\"Página B\"
\"30\",\"20\"
";

    #[test]
    fn test_parse_full_export() {
        let report = parse_audience(FULL_EXPORT);

        assert_eq!(report.idade_genero.len(), 3);
        assert_eq!(report.idade_genero[0].categoria, "18-24");
        assert_eq!(report.idade_genero[0].valor_mulheres, 10.5);
        assert_eq!(report.idade_genero[0].porcentagem, 15.5);
        assert_eq!(report.idade_genero[2].categoria, "65+");

        assert_eq!(report.cidades.len(), 3);
        assert_eq!(report.cidades[0].categoria, "São Paulo");
        assert_eq!(report.cidades[0].porcentagem, 12.3);

        assert_eq!(report.paises.len(), 2);
        assert_eq!(report.paises[1].porcentagem, 4.2);

        assert_eq!(report.paginas.len(), 2);
        assert_eq!(report.paginas[0].nome, "Página A");

        assert_eq!(
            report.sections_found,
            vec![Section::Age, Section::Cities, Section::Countries, Section::Pages]
        );
        assert!(report.unpaired.is_empty());
    }

    #[test]
    fn test_age_then_cities_leaves_other_sections_empty() {
        let csv = "Age range\n\"18-24\",10,5\nTop cities\nLisboa,Porto\n60,40\n";
        let report = parse_audience(csv);
        assert!(!report.idade_genero.is_empty());
        assert!(!report.cidades.is_empty());
        assert!(report.paises.is_empty());
        assert!(report.paginas.is_empty());
    }

    #[test]
    fn test_age_row_shape() {
        let report = parse_audience("Faixa etária\n\"18-24\",10,5\n");
        assert_eq!(
            report.idade_genero,
            vec![AgeGenderShare {
                categoria: "18-24".to_string(),
                valor_mulheres: 10.0,
                valor_homens: 5.0,
                porcentagem: 15.0,
            }]
        );
    }

    #[test]
    fn test_age_rejects_non_bracket_rows() {
        let report = parse_audience("Faixa etária\nTotal,10,5\n\"18-24\",1,1\n");
        assert_eq!(report.idade_genero.len(), 1);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_names_line_without_values_is_unpaired() {
        let report = parse_audience("Principais cidades\nLisboa,Porto\nPrincipais países\n");
        assert!(report.cidades.is_empty());
        assert_eq!(report.unpaired.len(), 1);
        assert_eq!(report.unpaired[0].section, Section::Cities);
        assert_eq!(report.unpaired[0].names, vec!["Lisboa", "Porto"]);
    }

    #[test]
    fn test_names_line_at_end_of_file_is_unpaired() {
        let report = parse_audience("Top pages\nPage A,Page B\n");
        assert!(report.paginas.is_empty());
        assert_eq!(report.unpaired.len(), 1);
    }

    #[test]
    fn test_each_pair_consumed_once() {
        let report = parse_audience("Cities\nA,B\n1,2\n3,4\n");
        assert_eq!(report.cidades.len(), 2);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_no_sections_returns_empty_report() {
        let report = parse_audience("just,some\nrandom,text\n");
        assert!(report.is_empty());
        assert!(report.sections_found.is_empty());
    }
}
