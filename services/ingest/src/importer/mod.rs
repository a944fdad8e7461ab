//! Archive importer: one ZIP export in, one platform aggregate out.
//!
//! Entries are decoded to text (spreadsheets are re-serialized as CSV), then
//! routed to a normalizer by their folded path through an ordered route
//! table per platform. First match wins. Only a complete recognition failure
//! is an error; anything else is recorded in [`ImportDiagnostics`].

mod instagram;
mod tiktok;
mod youtube;

use std::collections::BTreeMap;
use std::io::{Cursor, Read};

use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use encoding_rs::{Encoding, WINDOWS_1252};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::audience::Section;
use crate::coerce::{fold, CoercionStats};
use crate::error::{IngestError, Result};
use crate::model::{Aggregate, Network};

/// Characters of the audience file kept for display.
const PREVIEW_CHARS: usize = 500;

/// Largest uncompressed entry read from an archive.
const ENTRY_LIMIT: u64 = 256 * 1024 * 1024;

// =============================================================================
// Diagnostics
// =============================================================================

/// Where one archive entry went.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutcome {
    pub name: String,
    /// Route name, or `None` when the entry was not recognized.
    pub route: Option<String>,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDiagnostics {
    pub network: Network,
    pub archive_sha256: String,
    pub entries_seen: usize,
    pub files: Vec<FileOutcome>,
    pub sections_found: Vec<Section>,
    pub section_counts: BTreeMap<String, usize>,
    pub audience_preview: Option<String>,
    pub errors: Vec<String>,
    pub coercion: CoercionStats,
}

impl ImportDiagnostics {
    fn new(network: Network, archive: &[u8]) -> Self {
        Self {
            network,
            archive_sha256: format!("{:x}", Sha256::digest(archive)),
            entries_seen: 0,
            files: Vec::new(),
            sections_found: Vec::new(),
            section_counts: BTreeMap::new(),
            audience_preview: None,
            errors: Vec::new(),
            coercion: CoercionStats::default(),
        }
    }

    fn routed(&mut self, name: &str, route: &str, rows: usize) {
        debug!(entry = name, route, rows, "routed entry");
        self.files.push(FileOutcome {
            name: name.to_string(),
            route: Some(route.to_string()),
            rows,
        });
    }

    fn unrecognized(&mut self, name: &str) {
        debug!(entry = name, "no route matched");
        self.files.push(FileOutcome {
            name: name.to_string(),
            route: None,
            rows: 0,
        });
    }

    pub fn recognized(&self) -> usize {
        self.files.iter().filter(|f| f.route.is_some()).count()
    }
}

/// Result of a successful import.
#[derive(Debug, Clone, PartialEq)]
pub struct Imported {
    pub aggregate: Aggregate,
    pub diagnostics: ImportDiagnostics,
}

// =============================================================================
// Routing
// =============================================================================

/// Substring test over a folded entry path.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Matcher {
    /// At least one must occur.
    pub any: &'static [&'static str],
    /// When non-empty, at least one must also occur.
    pub requires: &'static [&'static str],
    /// None may occur.
    pub excludes: &'static [&'static str],
}

impl Matcher {
    pub const fn any(any: &'static [&'static str]) -> Self {
        Self {
            any,
            requires: &[],
            excludes: &[],
        }
    }

    pub const fn requiring(self, requires: &'static [&'static str]) -> Self {
        Self { requires, ..self }
    }

    pub const fn excluding(self, excludes: &'static [&'static str]) -> Self {
        Self { excludes, ..self }
    }

    pub fn matches(&self, folded: &str) -> bool {
        self.any.iter().any(|n| folded.contains(n))
            && (self.requires.is_empty() || self.requires.iter().any(|n| folded.contains(n)))
            && !self.excludes.iter().any(|n| folded.contains(n))
    }
}

pub(crate) struct Route<H> {
    pub name: &'static str,
    pub matcher: Matcher,
    pub handler: H,
}

/// First route whose matcher accepts `folded`.
pub(crate) fn find_route<'a, H>(routes: &'a [Route<H>], folded: &str) -> Option<&'a Route<H>> {
    routes.iter().find(|route| route.matcher.matches(folded))
}

// =============================================================================
// Entries
// =============================================================================

/// A decoded archive entry.
pub(crate) struct Entry {
    pub name: String,
    pub folded: String,
    pub text: String,
}

/// Decodes exported text: BOM first, then strict UTF-8, then Windows-1252.
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text.into_owned();
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
            text.into_owned()
        }
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|d| d.to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

/// First sheet of a workbook as CSV text.
pub fn spreadsheet_to_csv(entry: &str, bytes: Vec<u8>) -> Result<String> {
    let spreadsheet_err = |reason: String| IngestError::Spreadsheet {
        entry: entry.to_string(),
        reason,
    };

    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| spreadsheet_err(e.to_string()))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| spreadsheet_err("workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| spreadsheet_err(e.to_string()))?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    for row in range.rows() {
        writer.write_record(row.iter().map(cell_text))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| IngestError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn extension(name: &str) -> Option<String> {
    let file = name.rsplit('/').next().unwrap_or(name);
    file.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Reads every tabular entry. Directories, `__MACOSX` metadata and
/// non-tabular files are skipped; unreadable spreadsheets are noted.
/// Reads at most `limit` bytes without trusting any declared size. `None`
/// when the source holds more.
fn read_bounded(reader: impl Read, limit: u64) -> std::io::Result<Option<Vec<u8>>> {
    let mut bytes = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
    Ok((bytes.len() as u64 <= limit).then_some(bytes))
}

fn read_entries(archive_bytes: &[u8], diagnostics: &mut ImportDiagnostics) -> Result<Vec<Entry>> {
    let mut archive = ZipArchive::new(Cursor::new(archive_bytes))?;
    let mut entries = Vec::with_capacity(archive.len());

    for idx in 0..archive.len() {
        let mut file = archive.by_index(idx)?;
        let name = file.name().to_string();
        if file.is_dir() || name.starts_with("__MACOSX") {
            continue;
        }
        diagnostics.entries_seen += 1;

        let Some(bytes) = read_bounded(&mut file, ENTRY_LIMIT)? else {
            warn!("skipping {name}: larger than {ENTRY_LIMIT} bytes");
            diagnostics
                .errors
                .push(format!("{name}: entry larger than {ENTRY_LIMIT} bytes"));
            continue;
        };

        let text = match extension(&name).as_deref() {
            Some("csv") => decode_text(&bytes),
            Some("xlsx") | Some("xls") => match spreadsheet_to_csv(&name, bytes) {
                Ok(text) => text,
                Err(e) => {
                    warn!("skipping {name}: {e}");
                    diagnostics.errors.push(e.to_string());
                    continue;
                }
            },
            _ => {
                debug!("skipping non-tabular entry {name}");
                continue;
            }
        };

        entries.push(Entry {
            folded: fold(&name),
            name,
            text,
        });
    }

    Ok(entries)
}

// =============================================================================
// Import
// =============================================================================

/// Imports one export archive for `network`.
///
/// Fails with [`IngestError::NoValidFiles`] when no entry was recognized;
/// partial recognition is accepted. Summary totals are recomputed from the
/// freshly built records.
pub fn import_archive(archive_bytes: &[u8], network: Network) -> Result<Imported> {
    let mut diagnostics = ImportDiagnostics::new(network, archive_bytes);
    let entries = read_entries(archive_bytes, &mut diagnostics)?;

    let aggregate = match network {
        Network::Youtube => Aggregate::Youtube(youtube::import(&entries, &mut diagnostics)),
        Network::Instagram => Aggregate::Instagram(instagram::import(&entries, &mut diagnostics)),
        Network::Tiktok => Aggregate::Tiktok(tiktok::import(&entries, &mut diagnostics)),
    };

    if diagnostics.recognized() == 0 {
        warn!(
            network = network.as_str(),
            entries = diagnostics.entries_seen,
            "no recognizable files in archive"
        );
        return Err(IngestError::NoValidFiles { network });
    }

    info!(
        network = network.as_str(),
        recognized = diagnostics.recognized(),
        entries = diagnostics.entries_seen,
        defaulted = diagnostics.coercion.total(),
        "import complete"
    );

    Ok(Imported {
        aggregate,
        diagnostics,
    })
}


#[cfg(test)]
mod tests {
    use super::fixtures::zip_archive;
    use super::*;

    // -------------------------------------------------------------------------
    // Decoding
    // -------------------------------------------------------------------------

    #[test]
    fn test_decode_text_utf8_with_bom() {
        assert_eq!(decode_text("\u{feff}Título".as_bytes()), "Título");
    }

    #[test]
    fn test_decode_text_utf16le_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "Data".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_text(&bytes), "Data");
    }

    #[test]
    fn test_decode_text_windows_1252_fallback() {
        // "Público" in Windows-1252
        let bytes = [0x50, 0xFA, 0x62, 0x6C, 0x69, 0x63, 0x6F];
        assert_eq!(decode_text(&bytes), "Público");
    }

    #[test]
    fn test_read_bounded_stops_past_limit() {
        let fits = read_bounded(Cursor::new(vec![7u8; 16]), 16).unwrap();
        assert_eq!(fits.map(|b| b.len()), Some(16));

        let too_big = read_bounded(Cursor::new(vec![7u8; 17]), 16).unwrap();
        assert!(too_big.is_none());

        assert_eq!(read_bounded(Cursor::new(Vec::new()), 0).unwrap(), Some(Vec::new()));
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("a/b/Dados da tabela.CSV").as_deref(), Some("csv"));
        assert_eq!(extension("folder.v2/README").as_deref(), None);
    }

    // -------------------------------------------------------------------------
    // Routing
    // -------------------------------------------------------------------------

    #[test]
    fn test_matcher_requires_and_excludes() {
        let matcher = Matcher::any(&["conteudo"])
            .requiring(&["dados da tabela"])
            .excluding(&["tipo de conteudo"]);
        assert!(matcher.matches("conteudo 2024/dados da tabela.csv"));
        assert!(!matcher.matches("conteudo 2024/dados do grafico.csv"));
        assert!(!matcher.matches("tipo de conteudo 2024/dados da tabela.csv"));
    }

    #[test]
    fn test_find_route_first_match_wins() {
        let routes = [
            Route {
                name: "first",
                matcher: Matcher::any(&["a"]),
                handler: 1,
            },
            Route {
                name: "second",
                matcher: Matcher::any(&["ab"]),
                handler: 2,
            },
        ];
        assert_eq!(find_route(&routes, "abc").map(|r| r.handler), Some(1));
        assert!(find_route(&routes, "xyz").is_none());
    }

    // -------------------------------------------------------------------------
    // Archive handling
    // -------------------------------------------------------------------------

    #[test]
    fn test_unrecognized_archive_is_an_error() {
        let zip = zip_archive(&[("notes.csv", b"a,b\n1,2\n"), ("readme.txt", b"hello")]);
        for network in Network::ALL {
            let err = import_archive(&zip, network).unwrap_err();
            assert!(matches!(err, IngestError::NoValidFiles { network: n } if n == network));
        }
    }

    #[test]
    fn test_not_a_zip_is_an_error() {
        assert!(matches!(
            import_archive(b"plain text", Network::Instagram),
            Err(IngestError::Zip(_))
        ));
    }

    #[test]
    fn test_skips_directories_and_macos_metadata() {
        let zip = zip_archive(&[
            ("export/", b""),
            ("__MACOSX/export/._Visualizações.csv", b"\x00\x01garbage"),
            ("export/Visualizações.csv", b"Data,Valor\n2024-01-01,5\n"),
        ]);
        let imported = import_archive(&zip, Network::Instagram).unwrap();
        assert_eq!(imported.diagnostics.entries_seen, 1);
        assert_eq!(imported.diagnostics.recognized(), 1);
    }

    #[test]
    fn test_diagnostics_carry_archive_hash() {
        let zip = zip_archive(&[("Visualizações.csv", b"Data,Valor\n2024-01-01,5\n")]);
        let imported = import_archive(&zip, Network::Instagram).unwrap();
        let hash = &imported.diagnostics.archive_sha256;
        assert_eq!(hash.len(), 64);
        assert_eq!(*hash, format!("{:x}", Sha256::digest(&zip)));
    }

    #[test]
    fn test_partial_recognition_is_accepted() {
        let zip = zip_archive(&[
            ("Visualizações.csv", b"Data,Valor\n2024-01-01,5\n"),
            ("Something else.csv", b"x,y\n1,2\n"),
        ]);
        let imported = import_archive(&zip, Network::Instagram).unwrap();
        assert_eq!(imported.diagnostics.files.len(), 2);
        assert_eq!(imported.diagnostics.recognized(), 1);
        assert!(imported.diagnostics.files[1].route.is_none());
    }
}
