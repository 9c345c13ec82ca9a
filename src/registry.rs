use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::Grupo;

/// Sentinel slug for category codes the registry does not know.
pub const UNCLASSIFIED_SLUG: &str = "nao-classificado";

/// Static registry entry mapping a CNAE classification label to a dataset
/// slug and a coarse group.
#[derive(Debug, Clone)]
pub struct DatasetDescriptor {
    pub slug: &'static str,
    pub categoria: &'static str,
    pub rotulo: &'static str,
    pub grupo: Grupo,
}

/// The fixed dataset registry, loaded once at process start. Matching is
/// exact-string on the trimmed category code.
pub static DATASETS: Lazy<Vec<DatasetDescriptor>> = Lazy::new(|| {
    vec![
        DatasetDescriptor {
            slug: "feiras-livres",
            categoria: "Feira livre",
            rotulo: "Feiras livres",
            grupo: Grupo::InNatura,
        },
        DatasetDescriptor {
            slug: "hortifrutis",
            categoria: "Comércio varejista de hortifrutigranjeiros",
            rotulo: "Hortifrútis e sacolões",
            grupo: Grupo::InNatura,
        },
        DatasetDescriptor {
            slug: "mercearias",
            categoria: "Comércio varejista de mercadorias em geral - mercearias e armazéns",
            rotulo: "Mercearias e armazéns",
            grupo: Grupo::Misto,
        },
        DatasetDescriptor {
            slug: "supermercados",
            categoria: "Comércio varejista de mercadorias em geral - supermercados",
            rotulo: "Supermercados",
            grupo: Grupo::Misto,
        },
        DatasetDescriptor {
            slug: "restaurantes",
            categoria: "Restaurantes e similares",
            rotulo: "Restaurantes e lanchonetes",
            grupo: Grupo::Misto,
        },
        DatasetDescriptor {
            slug: "conveniencias",
            categoria: "Lojas de conveniência",
            rotulo: "Lojas de conveniência",
            grupo: Grupo::Ultraprocessado,
        },
    ]
});

/// Restaurants and snack bars always classify as "Misto", whatever the
/// source row claims. Folds the old one-off reclassification pass into
/// the ingest path.
static RESTAURANTE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)restaurante|lanchonete").unwrap());

/// Outcome of classifying one raw record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub dataset: &'static str,
    pub grupo: Grupo,
}

/// Maps a raw record's category code (and its free-text group column, used
/// only when the registry has no entry) to a dataset slug and group.
pub fn classify(categoria: &str, grupo_texto: &str) -> Classification {
    let cat = categoria.trim();

    if let Some(desc) = DATASETS.iter().find(|d| d.categoria == cat) {
        return Classification {
            dataset: desc.slug,
            grupo: desc.grupo,
        };
    }

    let grupo = if RESTAURANTE_RE.is_match(cat) {
        Grupo::Misto
    } else {
        Grupo::parse(grupo_texto)
    };

    Classification {
        dataset: UNCLASSIFIED_SLUG,
        grupo,
    }
}

/// Looks up a descriptor by slug. `None` for unknown slugs, including the
/// sentinel (which has no registry entry).
pub fn dataset_by_slug(slug: &str) -> Option<&'static DatasetDescriptor> {
    DATASETS.iter().find(|d| d.slug == slug)
}

/// True for every slug a listing endpoint may serve: registry slugs plus
/// the sentinel bucket.
pub fn is_known_slug(slug: &str) -> bool {
    slug == UNCLASSIFIED_SLUG || dataset_by_slug(slug).is_some()
}
