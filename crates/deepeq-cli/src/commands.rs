use std::io::Write;
use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use deepeq_diff::{Reflect, Session, SessionConfig, Style};
use deepeq_types::{Record, Sequence, TypeName, Value};
use serde_json::Value as Json;
use tracing::debug;

use crate::cli::Cli;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let session = build_session(&cli, std::io::stdout())?;
    if !summary_colored(&session) {
        colored::control::set_override(false);
    }
    match compare_files(&session, &cli.left, &cli.right) {
        Ok(()) => {
            println!("{} documents are equal", "✓".green().bold());
            Ok(())
        }
        Err(err) => {
            println!("{} documents differ", "✗".red().bold());
            Err(err)
        }
    }
}

/// Session settings: the config file first, command-line flags on top.
pub fn build_session(cli: &Cli, sink: impl Write + Send + 'static) -> anyhow::Result<Session> {
    let mut builder = Session::builder().sink(sink);
    if let Some(path) = &cli.config {
        let config = SessionConfig::load(path)?;
        debug!(?config, "loaded session config");
        builder = builder.config(&config);
    }
    if cli.verbose {
        builder = builder.verbose();
    }
    if cli.color {
        builder = builder.style(Style::Ansi);
    }
    if cli.sort_keys {
        builder = builder.sort_map_keys(true);
    }
    Ok(builder.exclude_fields(cli.exclude.iter().cloned()).build())
}

/// The summary line follows the report's palette, however it was chosen.
pub fn summary_colored(session: &Session) -> bool {
    !session.reporter().palette().is_plain()
}

pub fn compare_files(session: &Session, left: &Path, right: &Path) -> anyhow::Result<()> {
    let sorted = session.sorts_map_keys();
    let a = lower(&load_document(left)?, sorted);
    let b = lower(&load_document(right)?, sorted);
    session
        .equal_values(&a, &b)
        .with_context(|| format!("{} and {} differ", left.display(), right.display()))
}

/// Parse a JSON or TOML document, chosen by file extension.
pub fn load_document(path: &Path) -> anyhow::Result<Json> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let ext = path.extension().and_then(|ext| ext.to_str()).unwrap_or_default();
    let doc = match ext {
        "json" => serde_json::from_str(&text)
            .with_context(|| format!("invalid JSON in {}", path.display()))?,
        "toml" => toml::from_str(&text)
            .with_context(|| format!("invalid TOML in {}", path.display()))?,
        other => bail!("unsupported document format {other:?} for {}", path.display()),
    };
    Ok(doc)
}

/// Objects become `Object` records so their keys can be excluded by name.
/// With `sorted`, record fields follow key order instead of document order.
pub fn lower(doc: &Json, sorted: bool) -> Value {
    match doc {
        Json::Object(entries) => {
            let mut fields: Vec<_> = entries.iter().collect();
            if sorted {
                fields.sort_by(|(a, _), (b, _)| a.cmp(b));
            }
            let mut record = Record::new(TypeName::bare("Object"));
            for (key, value) in fields {
                record.push(key.clone(), lower(value, sorted));
            }
            Value::Struct(record)
        }
        Json::Array(items) => {
            let items = items.iter().map(|item| lower(item, sorted)).collect();
            Value::Seq(Sequence::growable("Array", items))
        }
        scalar => scalar.reflect(),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::Parser;
    use deepeq_diff::{CompareError, SharedBuffer, Taxonomy};
    use deepeq_types::Kind;

    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }

    fn taxonomy(err: &anyhow::Error) -> Option<Taxonomy> {
        err.downcast_ref::<CompareError>().map(CompareError::kind)
    }

    #[test]
    fn json_and_toml_documents_compare_equal() {
        let dir = tempfile::tempdir().unwrap();
        let json = write(&dir, "a.json", r#"{"name": "svc", "ports": [80, 443]}"#);
        let toml = write(&dir, "b.toml", "name = \"svc\"\nports = [80, 443]\n");

        let session = Session::builder().sink(std::io::sink()).build();
        compare_files(&session, &json, &toml).unwrap();
    }

    #[test]
    fn mismatch_reports_path_and_taxonomy() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(&dir, "a.json", r#"{"name": "svc", "ports": [80, 443]}"#);
        let b = write(&dir, "b.json", r#"{"name": "svc", "ports": [80, 8443]}"#);

        let out = SharedBuffer::new();
        let session = Session::builder().sink(out.clone()).build();
        let err = compare_files(&session, &a, &b).unwrap_err();

        assert_eq!(taxonomy(&err), Some(Taxonomy::NotEqual));
        assert_eq!(
            out.contents(),
            "(Object)[FAIL]\nports: (Array)[FAIL]\n\t1: (i64) 443 != 8443\n"
        );
    }

    #[test]
    fn excluded_keys_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(&dir, "a.json", r#"{"id": 1, "name": "x"}"#);
        let b = write(&dir, "b.json", r#"{"id": 2, "name": "x"}"#);
        let cli = Cli::parse_from([
            "deepeq",
            a.to_str().unwrap(),
            b.to_str().unwrap(),
            "--exclude",
            "Object::id",
        ]);

        let session = build_session(&cli, std::io::sink()).unwrap();
        compare_files(&session, &cli.left, &cli.right).unwrap();
    }

    #[test]
    fn config_file_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let config = write(&dir, "deepeq.toml", "verbose = true\nexclude = [\"Object::id\"]\n");
        let cli = Cli::parse_from(["deepeq", "a.json", "b.json", "--config", config.to_str().unwrap()]);

        let session = build_session(&cli, std::io::sink()).unwrap();
        assert!(session.reporter().verbose());
        assert!(session.is_excluded("Object::id"));
    }

    #[test]
    fn summary_colour_follows_configured_style() {
        let dir = tempfile::tempdir().unwrap();
        let config = write(&dir, "deepeq.toml", "style = \"ansi\"\n");
        let cli = Cli::parse_from(["deepeq", "a.json", "b.json", "--config", config.to_str().unwrap()]);
        assert!(!cli.color);
        assert!(summary_colored(&build_session(&cli, std::io::sink()).unwrap()));

        let plain = Cli::parse_from(["deepeq", "a.json", "b.json"]);
        assert!(!summary_colored(&build_session(&plain, std::io::sink()).unwrap()));

        let flagged = Cli::parse_from(["deepeq", "a.json", "b.json", "--color"]);
        assert!(summary_colored(&build_session(&flagged, std::io::sink()).unwrap()));
    }

    #[test]
    fn number_kinds_must_match() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(&dir, "a.json", "[1]");
        let b = write(&dir, "b.json", "[1.0]");

        let session = Session::builder().sink(std::io::sink()).build();
        let err = compare_files(&session, &a, &b).unwrap_err();
        assert_eq!(taxonomy(&err), Some(Taxonomy::DifferingKinds));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "doc.yaml", "a: 1");
        let err = load_document(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported document format"));
    }

    #[test]
    fn lower_maps_objects_to_records() {
        let doc: Json = serde_json::from_str(r#"{"a": {"b": null}}"#).unwrap();
        let value = lower(&doc, false);
        assert_eq!(value.kind(), Kind::Struct);
        assert_eq!(value.to_string(), "Object { a: Object { b: () } }");
    }

    #[test]
    fn sorted_lowering_orders_fields() {
        let doc: Json = serde_json::from_str(r#"{"b": 2, "a": 1}"#).unwrap();
        assert_eq!(lower(&doc, false).to_string(), "Object { b: 2, a: 1 }");
        assert_eq!(lower(&doc, true).to_string(), "Object { a: 1, b: 2 }");
    }
}
