use serde::{Deserialize, Serialize};

/// Coarse food-category bucket derived from the establishment's CNAE
/// classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Grupo {
    #[serde(rename = "In natura")]
    InNatura,
    #[serde(rename = "Misto")]
    Misto,
    #[serde(rename = "Ultraprocessado")]
    Ultraprocessado,
    #[serde(rename = "Outros")]
    Outros,
}

impl Grupo {
    /// Stable machine form, used in metric names (`total_in_natura`).
    pub fn as_key(&self) -> &'static str {
        match self {
            Grupo::InNatura => "in_natura",
            Grupo::Misto => "misto",
            Grupo::Ultraprocessado => "ultraprocessado",
            Grupo::Outros => "outros",
        }
    }

    /// Display form, used in breakdown keys and listings.
    pub fn as_label(&self) -> &'static str {
        match self {
            Grupo::InNatura => "In natura",
            Grupo::Misto => "Misto",
            Grupo::Ultraprocessado => "Ultraprocessado",
            Grupo::Outros => "Outros",
        }
    }

    /// Best-effort parse of the free-text `classificacao_grupo` column.
    pub fn parse(raw: &str) -> Grupo {
        let upper = crate::normalize::normalize(raw);
        if upper.contains("NATURA") {
            Grupo::InNatura
        } else if upper.contains("MISTO") {
            Grupo::Misto
        } else if upper.contains("ULTRA") {
            Grupo::Ultraprocessado
        } else {
            Grupo::Outros
        }
    }

    /// The groups that get materialized `total_<grupo>` metrics.
    pub const RECOGNIZED: [Grupo; 3] = [Grupo::InNatura, Grupo::Misto, Grupo::Ultraprocessado];
}

/// One establishment row as read from the source table. Quantities arrive
/// as locale-formatted text and go through the numeric coercer.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEstablishmentRecord {
    pub bairro: String,
    #[serde(default)]
    pub classificacao_grupo: String,
    #[serde(default)]
    pub classificacao_cnae: String,
    #[serde(default)]
    pub quantidade: String,
    /// Population carried over by earlier consolidations; only used as a
    /// fallback when the census has no row for the bairro.
    #[serde(rename = "Total_de_pessoas_2022", default)]
    pub populacao: Option<String>,
}

/// One census/boundary row.
#[derive(Debug, Clone, Deserialize)]
pub struct CensusRow {
    pub nome: String,
    #[serde(rename = "Shape_Area", default)]
    pub shape_area: Option<String>,
    #[serde(rename = "Total_de_pessoas_2022", default)]
    pub populacao: Option<String>,
}

/// A validated, normalized establishment row. All downstream logic
/// operates on these, never on free-form maps.
#[derive(Debug, Clone, Serialize)]
pub struct CleanRecord {
    pub bairro: String,
    pub classificacao_grupo: String,
    pub classificacao_cnae: String,
    pub quantidade: i64,
    pub dataset: String,
    #[serde(skip)]
    pub grupo: Grupo,
}

/// Ordered (field name, string value) view of a row, consumed by the
/// generic search/filter/summation layer.
pub trait FieldView {
    fn fields(&self) -> Vec<(&'static str, String)>;
}

impl FieldView for CleanRecord {
    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("bairro", self.bairro.clone()),
            ("classificacao_grupo", self.classificacao_grupo.clone()),
            ("classificacao_cnae", self.classificacao_cnae.clone()),
            ("quantidade", self.quantidade.to_string()),
            ("dataset", self.dataset.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grupo_parse_handles_source_spellings() {
        assert_eq!(Grupo::parse("In natura"), Grupo::InNatura);
        assert_eq!(Grupo::parse("IN NATURA"), Grupo::InNatura);
        assert_eq!(Grupo::parse("Misto"), Grupo::Misto);
        assert_eq!(Grupo::parse("Ultraprocessado"), Grupo::Ultraprocessado);
        assert_eq!(Grupo::parse("ultra processado"), Grupo::Ultraprocessado);
        assert_eq!(Grupo::parse("feira"), Grupo::Outros);
    }

    #[test]
    fn clean_record_field_view_is_ordered() {
        let rec = CleanRecord {
            bairro: "COPACABANA".into(),
            classificacao_grupo: "Misto".into(),
            classificacao_cnae: "Restaurantes e similares".into(),
            quantidade: 4,
            dataset: "restaurantes".into(),
            grupo: Grupo::Misto,
        };
        let names: Vec<&str> = rec.fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "bairro",
                "classificacao_grupo",
                "classificacao_cnae",
                "quantidade",
                "dataset"
            ]
        );
    }
}
