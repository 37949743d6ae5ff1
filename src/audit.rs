//! Offline consistency tooling for the listing image directory.
//!
//! `analyze` is read-only and keeps going past anything it cannot classify;
//! `repair` renumbers one listing's images and aborts on the first error
//! rather than risk touching valid files. Both sides of the tooling parse
//! names through the same codec the upload path uses.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::naming::{ImageName, MAX_SEQUENCE};

/// Scratch subdirectory used by the two-phase move. If a repair run is
/// interrupted it survives as the recovery source for the renamed files.
pub const SCRATCH_DIR: &str = "repair-tmp";

#[derive(Debug, Clone, Serialize)]
pub struct GroupReport {
    pub user_id_hex: String,
    pub listing_code: String,
    /// Sequence numbers present, sorted ascending, duplicates kept.
    pub sequence: Vec<u32>,
    /// Numbers absent from 1..=max(sequence).
    pub missing: Vec<u32>,
    pub contiguous: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserReport {
    pub user_id_hex: String,
    pub total_images: u64,
    pub listing_count: u64,
    pub by_extension: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub directory: PathBuf,
    pub total_entries: usize,
    pub valid: usize,
    /// Entry names that do not parse as image names (foreign files,
    /// subdirectories, leftovers). Recorded and skipped.
    pub invalid: Vec<String>,
    pub groups: Vec<GroupReport>,
    pub users: Vec<UserReport>,
    pub total_bytes: u64,
    pub average_bytes: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepairOutcome {
    /// (old name, new name) for every file of the group, in final order.
    pub renames: Vec<(String, String)>,
    /// How many of those pairs actually changed name.
    pub changed: usize,
}

struct ValidFile {
    name: ImageName,
    size: u64,
}

/// Scan the directory and report on naming consistency. Mutates nothing.
pub fn analyze(dir: &Path) -> Result<AnalysisReport> {
    let mut report = AnalysisReport {
        directory: dir.to_path_buf(),
        total_entries: 0,
        valid: 0,
        invalid: Vec::new(),
        groups: Vec::new(),
        users: Vec::new(),
        total_bytes: 0,
        average_bytes: 0,
    };

    if !dir.exists() {
        return Ok(report);
    }

    let mut valid_files: Vec<ValidFile> = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("reading entry in {}", dir.display()))?;
        let filename = entry.file_name().to_string_lossy().into_owned();
        report.total_entries += 1;

        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        let parsed = if is_file { ImageName::decode(&filename) } else { None };
        match parsed {
            Some(name) => {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                valid_files.push(ValidFile { name, size });
            }
            None => report.invalid.push(filename),
        }
    }
    report.invalid.sort();
    report.valid = valid_files.len();

    let mut groups: BTreeMap<(String, String), Vec<u32>> = BTreeMap::new();
    let mut users: BTreeMap<String, (u64, BTreeSet<String>, BTreeMap<String, u64>)> =
        BTreeMap::new();

    for file in &valid_files {
        let (user_key, listing_key) = file.name.group_key();
        groups
            .entry((user_key.clone(), listing_key.clone()))
            .or_default()
            .push(file.name.sequence);

        let (count, listings, by_ext) = users.entry(user_key).or_default();
        *count += 1;
        listings.insert(listing_key);
        *by_ext
            .entry(file.name.extension.to_ascii_lowercase())
            .or_default() += 1;

        report.total_bytes += file.size;
    }

    if !valid_files.is_empty() {
        report.average_bytes = report.total_bytes / valid_files.len() as u64;
    }

    for ((user_id_hex, listing_code), mut sequence) in groups {
        sequence.sort_unstable();
        let missing = missing_numbers(&sequence);
        let contiguous =
            missing.is_empty() && sequence.iter().copied().eq(1..=sequence.len() as u32);
        report.groups.push(GroupReport {
            user_id_hex,
            listing_code,
            sequence,
            missing,
            contiguous,
        });
    }

    for (user_id_hex, (total_images, listings, by_extension)) in users {
        report.users.push(UserReport {
            user_id_hex,
            total_images,
            listing_count: listings.len() as u64,
            by_extension,
        });
    }

    Ok(report)
}

fn missing_numbers(sorted: &[u32]) -> Vec<u32> {
    let Some(&max) = sorted.last() else {
        return Vec::new();
    };
    (1..=max).filter(|n| !sorted.contains(n)).collect()
}

/// Renumber one listing's images into a contiguous 1..=N run.
///
/// Files are ordered by their current sequence number, ties broken by
/// filename, then rewritten under the new numbering through a scratch
/// directory: copy everything to the scratch under the new names, delete
/// the originals, copy back, remove the scratch. Old and new name sets may
/// overlap, which is exactly why the direct rename is off the table.
///
/// Running it again on an already-contiguous group yields byte-identical
/// filenames. Any failure aborts the whole operation; if the process dies
/// between the phases, the scratch directory holds the complete renamed
/// set and must be copied back by the operator before repairing again.
pub fn repair(dir: &Path, user_id_hex: &str, listing_code: &str) -> Result<RepairOutcome> {
    let scratch = dir.join(SCRATCH_DIR);
    if scratch.exists() {
        let leftover = fs::read_dir(&scratch)
            .with_context(|| format!("inspecting scratch directory {}", scratch.display()))?
            .count();
        if leftover > 0 {
            bail!(
                "scratch directory {} holds {leftover} file(s) from an interrupted repair; \
                 copy them back into {} before running repair again",
                scratch.display(),
                dir.display()
            );
        }
        fs::remove_dir(&scratch)
            .with_context(|| format!("removing empty scratch {}", scratch.display()))?;
    }

    let mut files: Vec<(ImageName, String)> = Vec::new();
    let entries =
        fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))?;
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let filename = entry.file_name().to_string_lossy().into_owned();
        if let Some(name) = ImageName::decode(&filename) {
            if name.user_id_hex.eq_ignore_ascii_case(user_id_hex)
                && name.listing_code.eq_ignore_ascii_case(listing_code)
            {
                files.push((name, filename));
            }
        }
    }

    if files.is_empty() {
        return Ok(RepairOutcome {
            renames: Vec::new(),
            changed: 0,
        });
    }
    if files.len() as u32 > MAX_SEQUENCE {
        bail!(
            "group {user_id_hex}/{listing_code} has {} files; the two-digit sequence field caps at {MAX_SEQUENCE}",
            files.len()
        );
    }

    files.sort_by(|a, b| {
        a.0.sequence
            .cmp(&b.0.sequence)
            .then_with(|| a.1.cmp(&b.1))
    });

    fs::create_dir_all(&scratch)
        .with_context(|| format!("creating scratch directory {}", scratch.display()))?;

    // Phase 1: copy into the scratch under the new numbering.
    let mut renames = Vec::with_capacity(files.len());
    for (index, (name, filename)) in files.iter().enumerate() {
        let renumbered = ImageName {
            sequence: index as u32 + 1,
            ..name.clone()
        };
        let new_filename = renumbered.to_string();
        fs::copy(dir.join(filename), scratch.join(&new_filename))
            .with_context(|| format!("copying {filename} to scratch as {new_filename}"))?;
        renames.push((filename.clone(), new_filename));
    }

    // Phase 2: drop the originals. From here until the copy-back completes,
    // the scratch directory is the only full copy of the group.
    for (_, filename) in &files {
        fs::remove_file(dir.join(filename))
            .with_context(|| format!("removing original {filename}"))?;
    }

    // Phase 3: copy back and clean up.
    for (_, new_filename) in &renames {
        fs::copy(scratch.join(new_filename), dir.join(new_filename))
            .with_context(|| format!("restoring {new_filename} from scratch"))?;
        fs::remove_file(scratch.join(new_filename))
            .with_context(|| format!("cleaning scratch copy of {new_filename}"))?;
    }
    fs::remove_dir(&scratch)
        .with_context(|| format!("removing scratch directory {}", scratch.display()))?;

    let changed = renames.iter().filter(|(old, new)| old != new).count();
    Ok(RepairOutcome { renames, changed })
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["Bytes", "KB", "MB", "GB", "TB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let exp = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exp as i32);
    let rendered = format!("{value:.2}");
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{rendered} {}", UNITS[exp])
}

impl fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Listing Images Analysis ===")?;
        writeln!(f, "Scanned: {}", self.directory.display())?;
        writeln!(
            f,
            "Found {} entries: {} valid, {} invalid",
            self.total_entries,
            self.valid,
            self.invalid.len()
        )?;

        writeln!(f, "\n=== User Statistics ===")?;
        for user in &self.users {
            writeln!(f, "User ID: {}", user.user_id_hex)?;
            writeln!(f, "  Total Images: {}", user.total_images)?;
            writeln!(f, "  Listings: {}", user.listing_count)?;
            writeln!(f, "  File types:")?;
            for (ext, count) in &user.by_extension {
                writeln!(f, "    {ext}: {count}")?;
            }
        }

        writeln!(f, "\n=== Listing Statistics ===")?;
        for group in &self.groups {
            writeln!(
                f,
                "Listing: {} (User: {})",
                group.listing_code, group.user_id_hex
            )?;
            writeln!(f, "  Image Count: {}", group.sequence.len())?;
            writeln!(
                f,
                "  Sequence Integrity: {}",
                if group.contiguous { "OK" } else { "BROKEN" }
            )?;
            if !group.contiguous {
                let seq: Vec<String> = group.sequence.iter().map(u32::to_string).collect();
                writeln!(f, "  Actual Sequence: {}", seq.join(", "))?;
                let missing: Vec<String> = group.missing.iter().map(u32::to_string).collect();
                let missing = if missing.is_empty() {
                    "none".to_string()
                } else {
                    missing.join(", ")
                };
                writeln!(f, "  Missing Numbers: {missing}")?;
            }
        }

        if !self.invalid.is_empty() {
            writeln!(f, "\n=== Invalid Files ===")?;
            for name in &self.invalid {
                writeln!(f, "  {name}")?;
            }
        }

        writeln!(f, "\n=== Storage Summary ===")?;
        writeln!(f, "Total disk usage: {}", format_bytes(self.total_bytes))?;
        writeln!(f, "Average file size: {}", format_bytes(self.average_bytes))?;
        Ok(())
    }
}
