//! Meta-kernel resolution (`KERNELS_TO_LOAD` with `PATH_SYMBOLS` substitution)

use std::path::{Path, PathBuf};

use crate::error::{EphemerisError, EphemerisResult};
use crate::kernel_pool::KernelPool;

/// Kind of kernel file, decided by extension
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KernelKind {
    /// Binary kernel ANISE can load (SPK, binary PCK, ANISE planetary constants)
    Binary,
    /// Text kernel for the kernel pool (frames, instruments, constants, clocks)
    Text,
    /// Kernel type this backend cannot use (e.g. CK attitude)
    Unsupported,
}

impl KernelKind {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "bsp" | "bpc" | "pca" | "epa" | "anise" => Self::Binary,
            "tf" | "ti" | "tpc" | "tls" | "tsc" | "tm" | "txt" | "ker" => Self::Text,
            _ => Self::Unsupported,
        }
    }
}

/// Kernel paths listed by a meta-kernel already parsed into `pool`.
///
/// `$SYMBOL` occurrences are replaced using `PATH_SYMBOLS` / `PATH_VALUES`.
/// Entries ending in `+` continue on the next entry. Relative paths resolve
/// against the working directory first, then against `base_dir`.
pub fn kernels_to_load(pool: &KernelPool, base_dir: Option<&Path>) -> EphemerisResult<Vec<PathBuf>> {
    let entries = pool
        .strings("KERNELS_TO_LOAD")
        .ok_or_else(|| EphemerisError::MetaKernel("KERNELS_TO_LOAD is not defined".to_string()))?;

    let symbols = pool.strings("PATH_SYMBOLS").unwrap_or(&[]);
    let values = pool.strings("PATH_VALUES").unwrap_or(&[]);
    if symbols.len() != values.len() {
        return Err(EphemerisError::MetaKernel(format!(
            "PATH_SYMBOLS has {} entries but PATH_VALUES has {}",
            symbols.len(),
            values.len()
        )));
    }

    let mut joined: Vec<String> = Vec::new();
    let mut pending = String::new();
    for entry in entries {
        if let Some(stem) = entry.strip_suffix('+') {
            pending.push_str(stem);
            continue;
        }
        pending.push_str(entry);
        joined.push(std::mem::take(&mut pending));
    }
    if !pending.is_empty() {
        return Err(EphemerisError::MetaKernel(format!(
            "continued entry '{}' never terminated",
            pending
        )));
    }

    joined
        .iter()
        .map(|entry| {
            let expanded = substitute_symbols(entry, symbols, values)?;
            Ok(resolve(PathBuf::from(expanded), base_dir))
        })
        .collect()
}

fn substitute_symbols(entry: &str, symbols: &[String], values: &[String]) -> EphemerisResult<String> {
    let mut out = String::with_capacity(entry.len());
    let mut rest = entry;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let symbol = &after[..len];
        let idx = symbols
            .iter()
            .position(|s| s == symbol)
            .ok_or_else(|| EphemerisError::MetaKernel(format!("undefined path symbol ${}", symbol)))?;
        out.push_str(&values[idx]);
        rest = &after[len..];
    }
    out.push_str(rest);
    Ok(out)
}

fn resolve(path: PathBuf, base_dir: Option<&Path>) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path;
    }
    match base_dir {
        Some(dir) if dir.join(&path).exists() => dir.join(&path),
        _ => path,
    }
}
