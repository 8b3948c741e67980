// SPDX-License-Identifier: PMPL-1.0-or-later

//! Engine: owns the active catalog and serves every operation against it
//!
//! Loads build a complete [`Catalog`] off to the side and publish it with a
//! single atomic swap. Readers take one snapshot of the active catalog per
//! call, so a concurrent reload never mixes two catalogs inside one result.
//! A failed load leaves the previous catalog active.
//!
//! Every public call except [`Engine::last_error`] first clears the
//! last-error text; a failing call leaves its message there.

use crate::catalog::Catalog;
use crate::check::{self, CheckReport, StatusCode};
use crate::error::{CatalogError, Result};
use crate::format::{self, binary, text};
use crate::marshal;
use crate::plural::PluralRule;
use crate::resolve::Resolver;
use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
struct LoadSource {
    path: PathBuf,
    strict: bool,
}

/// A localization engine instance.
#[derive(Debug, Default)]
pub struct Engine {
    active: ArcSwapOption<Catalog>,
    source: Mutex<Option<LoadSource>>,
    last_error: Mutex<Option<String>>,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current catalog, if any.
    pub fn catalog(&self) -> Option<Arc<Catalog>> {
        self.active.load_full()
    }

    /// Message of the most recent failure, cleared by the next call.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    fn begin(&self) {
        *self.last_error.lock() = None;
    }

    fn record<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            *self.last_error.lock() = Some(err.to_string());
        }
        result
    }

    fn publish(&self, catalog: Catalog, origin: &str) -> usize {
        let entries = catalog.len();
        info!(
            entries,
            origin,
            locale = %catalog.metadata().locale,
            plural = %catalog.plural_rule(),
            "catalog published"
        );
        self.active.store(Some(Arc::new(catalog)));
        entries
    }

    // --- loading ---

    /// Parse a text catalog from memory. Returns the number of entries.
    pub fn load_text(&self, src: &str, strict: bool) -> Result<usize> {
        self.begin();
        let catalog = self.record(text::parse(src, strict))?;
        Ok(self.publish(catalog, "text"))
    }

    /// Decode a binary catalog from memory.
    pub fn load_binary(&self, data: &[u8], strict: bool) -> Result<usize> {
        self.begin();
        let catalog = self.record(binary::decode(data, strict))?;
        Ok(self.publish(catalog, "binary"))
    }

    /// Load an authored catalog file and remember it for [`Engine::reload`].
    ///
    /// A file that starts with the binary magic is decoded as binary, so a
    /// catalog swapped for its exported form still loads.
    pub fn load_text_file(&self, path: impl AsRef<Path>, strict: bool) -> Result<usize> {
        self.load_file(path, strict)
    }

    /// Load a catalog file in either format and remember it for
    /// [`Engine::reload`].
    pub fn load_file(&self, path: impl AsRef<Path>, strict: bool) -> Result<usize> {
        self.begin();
        self.load_path(path.as_ref(), strict)
    }

    /// Load the remembered file again with its original strictness.
    pub fn reload(&self) -> Result<usize> {
        self.begin();
        let source = self.source.lock().clone();
        let source = self.record(
            source.ok_or_else(|| CatalogError::State("no catalog file loaded yet".into())),
        )?;
        debug!(path = %source.path.display(), strict = source.strict, "reloading catalog");
        self.load_path(&source.path, source.strict)
    }

    fn load_path(&self, path: &Path, strict: bool) -> Result<usize> {
        *self.source.lock() = Some(LoadSource {
            path: path.to_path_buf(),
            strict,
        });

        let parsed = fs::read(path)
            .map_err(CatalogError::from)
            .and_then(|data| format::parse_bytes(&data, strict));
        let catalog = self.record(parsed)?;
        Ok(self.publish(catalog, &path.display().to_string()))
    }

    // --- lookups ---

    fn with_resolver<R>(&self, f: impl FnOnce(Resolver<'_>) -> R) -> R {
        match self.catalog() {
            Some(catalog) => f(Resolver::new(&catalog)),
            None => f(Resolver::new(&Catalog::default())),
        }
    }

    /// Resolve `token` with positional arguments.
    pub fn translate<S: AsRef<str>>(&self, token: &str, args: &[S]) -> String {
        self.begin();
        self.with_resolver(|r| r.translate(token, args))
    }

    /// Resolve `token`, choosing the plural variant for `count`.
    pub fn translate_plural<S: AsRef<str>>(&self, token: &str, count: i64, args: &[S]) -> String {
        self.begin();
        self.with_resolver(|r| r.translate_plural(token, count, args))
    }

    /// Table of all entries in key order.
    pub fn dump(&self) -> String {
        self.begin();
        let mut out = String::new();
        out.push_str("Token        | Label                  | Text\n");
        out.push_str(&"-".repeat(60));
        out.push('\n');

        if let Some(catalog) = self.catalog() {
            for (key, text) in catalog.entries() {
                let label = catalog.label(key).unwrap_or("");
                out.push_str(&format!("{:<12} | {:<22} | {}\n", key, label, text));
            }
        }
        out
    }

    /// Entries whose text or label contains `query`, case-insensitively.
    pub fn find(&self, query: &str) -> String {
        self.begin();
        let needle = query.to_lowercase();
        let mut out = String::new();

        if let Some(catalog) = self.catalog() {
            for (key, text) in catalog.entries() {
                let label = catalog.label(key).unwrap_or("");
                if text.to_lowercase().contains(&needle)
                    || (!label.is_empty() && label.to_lowercase().contains(&needle))
                {
                    out.push_str(&format!("{}({}): {}\n", key, label, text));
                }
            }
        }

        if out.is_empty() {
            out.push_str("(no matches)\n");
        }
        out
    }

    // --- validation and export ---

    /// Structured validator report for the active catalog.
    pub fn check_report(&self) -> CheckReport {
        self.begin();
        check::check(self.catalog().as_deref())
    }

    /// Plain-text validator report and its status code.
    pub fn check(&self) -> (String, StatusCode) {
        let report = self.check_report();
        (report.render(), report.status)
    }

    /// Encode the active catalog as binary v2 and write it to `path`,
    /// creating parent directories.
    pub fn export_binary(&self, path: impl AsRef<Path>) -> Result<()> {
        self.begin();
        let path = path.as_ref();
        let result = self.export_to(path);
        if result.is_ok() {
            debug!(path = %path.display(), "catalog exported");
        }
        self.record(result)
    }

    fn export_to(&self, path: &Path) -> Result<()> {
        let catalog = self
            .catalog()
            .ok_or_else(|| CatalogError::State("no catalog loaded".into()))?;
        let bytes = binary::encode(&catalog)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }

    // --- metadata ---

    pub fn locale(&self) -> String {
        self.begin();
        self.catalog()
            .map(|c| c.metadata().locale.clone())
            .unwrap_or_default()
    }

    pub fn fallback(&self) -> String {
        self.begin();
        self.catalog()
            .map(|c| c.metadata().fallback.clone())
            .unwrap_or_default()
    }

    pub fn note(&self) -> String {
        self.begin();
        self.catalog()
            .map(|c| c.metadata().note.clone())
            .unwrap_or_default()
    }

    pub fn plural_rule(&self) -> PluralRule {
        self.begin();
        self.catalog().map(|c| c.plural_rule()).unwrap_or_default()
    }

    // --- host buffers ---

    /// Copy a result into a host buffer, recording an oversize failure as
    /// the last error. Returns the full length of `result`.
    pub fn copy_out(&self, result: &str, buf: Option<&mut [u8]>) -> Result<usize> {
        self.record(marshal::copy_to_buffer(result, buf))
    }

    /// [`Engine::translate`] into a host buffer.
    pub fn translate_into<S: AsRef<str>>(
        &self,
        token: &str,
        args: &[S],
        buf: Option<&mut [u8]>,
    ) -> Result<usize> {
        let result = self.translate(token, args);
        self.copy_out(&result, buf)
    }

    /// Last error copied into a host buffer. Does not clear it.
    pub fn last_error_into(&self, buf: Option<&mut [u8]>) -> Result<usize> {
        let message = self.last_error().unwrap_or_default();
        marshal::copy_to_buffer(&message, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_ARGS: [&str; 0] = [];

    #[test]
    fn engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn failed_load_keeps_previous_catalog() {
        let engine = Engine::new();
        engine.load_text("aaaaaa: first\n", true).unwrap();
        assert!(engine.last_error().is_none());

        let err = engine.load_text("aaaaaa: a\naaaaaa: b\n", false).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateKey { .. }));
        assert!(engine.last_error().unwrap().contains("duplicate token"));
        assert_eq!(engine.translate("aaaaaa", &NO_ARGS), "first");
        assert!(engine.last_error().is_none());
    }

    #[test]
    fn reload_without_source_is_state_error() {
        let engine = Engine::new();
        assert!(matches!(engine.reload(), Err(CatalogError::State(_))));
        assert!(engine.last_error().is_some());
    }

    #[test]
    fn unloaded_engine() {
        let engine = Engine::new();
        assert_eq!(engine.translate("AABBCC", &NO_ARGS), "⟦aabbcc⟧");
        assert_eq!(engine.find("x"), "(no matches)\n");
        assert_eq!(engine.locale(), "");
        assert_eq!(engine.plural_rule(), PluralRule::Default);
        let (report, status) = engine.check();
        assert_eq!(status, 2);
        assert!(report.starts_with("CHECK: FAIL\n"));
        assert!(matches!(
            engine.export_binary("unused.bin"),
            Err(CatalogError::State(_))
        ));
    }

    #[test]
    fn dump_and_find() {
        let engine = Engine::new();
        engine
            .load_text("bbbbbb(Farewell): Goodbye\naaaaaa(Greeting): Hello World\n", true)
            .unwrap();

        let dump = engine.dump();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines[0], "Token        | Label                  | Text");
        assert_eq!(lines[1], "-".repeat(60));
        assert_eq!(lines[2], "aaaaaa       | Greeting               | Hello World");
        assert_eq!(lines[3], "bbbbbb       | Farewell               | Goodbye");

        assert_eq!(engine.find("WORLD"), "aaaaaa(Greeting): Hello World\n");
        assert_eq!(engine.find("farewell"), "bbbbbb(Farewell): Goodbye\n");
        assert_eq!(engine.find("nothing"), "(no matches)\n");
    }

    #[test]
    fn oversize_result_is_recorded() {
        let engine = Engine::new();
        let huge = "x".repeat(marshal::RESULT_SIZE_LIMIT);
        assert!(engine.copy_out(&huge, None).is_err());
        assert!(engine.last_error().unwrap().starts_with("RESULT_TOO_LARGE"));

        let mut buf = [0u8; 64];
        let len = engine.last_error_into(Some(&mut buf)).unwrap();
        assert!(len > 0);
        assert_eq!(buf[len], 0);

        assert_eq!(Engine::new().last_error_into(None).unwrap(), 0);
    }

    #[test]
    fn translate_into_buffer() {
        let engine = Engine::new();
        engine.load_text("aaaaaa: Hello %0\n", true).unwrap();
        let mut buf = [0u8; 6];
        let len = engine.translate_into("aaaaaa", &["=you"], Some(&mut buf)).unwrap();
        assert_eq!(len, 9);
        assert_eq!(&buf, b"Hello\0");
    }
}
