use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::aggregate;
use crate::config::Config;
use crate::error::Result;
use crate::metrics as obs;
use crate::snapshot::Snapshot;
use crate::types::{CensusRow, RawEstablishmentRecord};

/// Sniffs the field delimiter from the header line. The informal-commerce
/// exports use `;`, the consolidated tables use `,`.
fn sniff_delimiter(content: &str) -> u8 {
    let header = content.lines().next().unwrap_or("");
    if header.matches(';').count() > header.matches(',').count() {
        b';'
    } else {
        b','
    }
}

/// Reads one CSV table into typed rows. A missing or unreadable file is
/// fatal; individual rows that fail to deserialize are skipped with a
/// warning.
fn load_table<T: DeserializeOwned>(path: &Path, table: &'static str) -> Result<Vec<T>> {
    let content = fs::read_to_string(path)?;
    let delimiter = sniff_delimiter(&content);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for (i, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => {
                warn!(tabela = table, linha = i + 2, erro = %e, "linha malformada ignorada");
                obs::record_row_skipped("deserialize_error");
            }
        }
    }

    info!(tabela = table, linhas = rows.len(), caminho = %path.display(), "tabela carregada");
    Ok(rows)
}

pub fn load_establishments(path: &Path) -> Result<Vec<RawEstablishmentRecord>> {
    load_table(path, "estabelecimentos")
}

pub fn load_census(path: &Path) -> Result<Vec<CensusRow>> {
    load_table(path, "censo")
}

/// Loads both source tables and builds a fresh snapshot. Called at startup
/// and by the admin reload trigger; failures here are fatal at startup and
/// surfaced to the caller on reload.
pub fn load_and_build(config: &Config) -> Result<Snapshot> {
    let records = load_establishments(Path::new(&config.data.estabelecimentos_csv))?;
    let census = load_census(Path::new(&config.data.censo_csv))?;
    Ok(aggregate::build_snapshot(&records, &census))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_comma_separated_establishments() {
        let file = write_csv(
            "bairro,classificacao_grupo,classificacao_cnae,quantidade\n\
             Copacabana,Ultraprocessado,Lojas de conveniência,10\n\
             Tijuca,In natura,Feira livre,5\n",
        );
        let rows = load_establishments(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].bairro, "Copacabana");
        assert_eq!(rows[0].quantidade, "10");
    }

    #[test]
    fn sniffs_semicolon_delimiter() {
        let file = write_csv(
            "bairro;classificacao_grupo;classificacao_cnae;quantidade\n\
             Madureira;Misto;Mercearias;3\n",
        );
        let rows = load_establishments(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].bairro, "Madureira");
    }

    #[test]
    fn census_optional_columns_default() {
        let file = write_csv("nome\nCopacabana\n");
        let rows = load_census(file.path()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].populacao, None);
        assert_eq!(rows[0].shape_area, None);
    }

    #[test]
    fn missing_file_is_fatal() {
        assert!(load_establishments(Path::new("/nope/dados.csv")).is_err());
    }
}
