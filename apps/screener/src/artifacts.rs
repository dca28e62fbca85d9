//! Artifact Writer — serializes the ranked results to tabular, narrative,
//! and full-fidelity JSON forms, then bundles the output tree into a zip.
//!
//! Layout inside the run root:
//! ```text
//! output/
//!   summary.csv         all results, full fidelity columns
//!   report.md           top_k results, narrative
//!   full_results.json   all results + resolved paths
//!   raw/                per-chunk raw model responses (debug capture)
//! <root>/resume_screen_outputs.zip
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::assessment::{Assessment, ScoredResume};
use crate::errors::ScreenError;

pub const ARCHIVE_NAME: &str = "resume_screen_outputs.zip";

const SUMMARY_COLUMNS: [&str; 10] = [
    "rank",
    "pdf_file",
    "name",
    "email",
    "phone",
    "score",
    "verdict",
    "strengths",
    "gaps",
    "reasoning",
];

/// One entry of `full_results.json`: file identity plus the flattened
/// assessment fields.
#[derive(Serialize)]
struct FullResult<'a> {
    pdf_file: String,
    absolute_path: String,
    #[serde(flatten)]
    assessment: &'a Assessment,
}

/// Writes all three artifacts into `output_dir`. `ranked` must already be in
/// rank order; an empty sequence still produces headed/labelled artifacts.
pub fn write_artifacts(
    ranked: &[ScoredResume],
    output_dir: &Path,
    top_k: usize,
) -> Result<(), ScreenError> {
    fs::create_dir_all(output_dir)?;
    write_summary_csv(ranked, &output_dir.join("summary.csv"))?;
    write_report_md(ranked, &output_dir.join("report.md"), top_k)?;
    write_full_json(ranked, &output_dir.join("full_results.json"))?;
    info!("wrote artifacts for {} result(s) to {}", ranked.len(), output_dir.display());
    Ok(())
}

fn write_summary_csv(ranked: &[ScoredResume], path: &Path) -> Result<(), ScreenError> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(SUMMARY_COLUMNS)?;
    for (idx, result) in ranked.iter().enumerate() {
        let a = &result.assessment;
        writer.write_record([
            (idx + 1).to_string(),
            file_name(&result.path),
            a.name.clone(),
            a.email.clone(),
            a.phone.clone(),
            a.score.to_string(),
            a.verdict.as_label().to_string(),
            a.strengths.join("; "),
            a.gaps.join("; "),
            a.reasoning.clone(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn write_report_md(
    ranked: &[ScoredResume],
    path: &Path,
    top_k: usize,
) -> Result<(), ScreenError> {
    let mut lines: Vec<String> = vec!["# Resume Screening Report".to_string(), String::new()];

    if ranked.is_empty() {
        lines.push("_No resumes scored._".to_string());
    } else {
        for (idx, result) in ranked.iter().take(top_k).enumerate() {
            let a = &result.assessment;
            let file = file_name(&result.path);
            let heading = if a.name.is_empty() { &file } else { &a.name };

            lines.push(format!("## {}. {heading}", idx + 1));
            lines.push(format!("- **File**: `{file}`"));
            lines.push(format!("- **Score**: {}", a.score));
            lines.push(format!("- **Verdict**: {}", a.verdict.as_label()));
            let contact: Vec<&str> = [a.email.as_str(), a.phone.as_str()]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect();
            if !contact.is_empty() {
                lines.push(format!("- **Contact**: {}", contact.join(", ")));
            }
            if !a.strengths.is_empty() {
                lines.push("- **Strengths:**".to_string());
                lines.extend(a.strengths.iter().map(|s| format!("  - {s}")));
            }
            if !a.gaps.is_empty() {
                lines.push("- **Gaps:**".to_string());
                lines.extend(a.gaps.iter().map(|g| format!("  - {g}")));
            }
            if !a.reasoning.is_empty() {
                lines.push(format!("- **Reasoning:** {}", a.reasoning));
            }
            lines.push(String::new());
        }
    }

    fs::write(path, lines.join("\n") + "\n")?;
    Ok(())
}

fn write_full_json(ranked: &[ScoredResume], path: &Path) -> Result<(), ScreenError> {
    let entries: Vec<FullResult<'_>> = ranked
        .iter()
        .map(|result| FullResult {
            pdf_file: file_name(&result.path),
            absolute_path: result
                .path
                .canonicalize()
                .unwrap_or_else(|_| result.path.clone())
                .display()
                .to_string(),
            assessment: &result.assessment,
        })
        .collect();
    fs::write(path, serde_json::to_string_pretty(&entries)?)?;
    Ok(())
}

/// Bundles the whole `output/` tree into `<root>/resume_screen_outputs.zip`,
/// preserving paths relative to the root.
pub fn bundle_outputs(root: &Path, output_dir: &Path) -> Result<PathBuf, ScreenError> {
    let archive_path = root.join(ARCHIVE_NAME);
    let file = fs::File::create(&archive_path)?;
    let mut archive = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(output_dir).sort_by_file_name() {
        let entry = entry.map_err(walk_error)?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| walk_outside_root(entry.path()))?;
        let name = relative.to_string_lossy().replace('\\', "/");

        if entry.file_type().is_dir() {
            archive.add_directory(name, options)?;
        } else {
            archive.start_file(name, options)?;
            let mut source = fs::File::open(entry.path())?;
            io::copy(&mut source, &mut archive)?;
        }
    }

    archive.finish()?;
    info!("bundled outputs into {}", archive_path.display());
    Ok(archive_path)
}

fn walk_error(e: walkdir::Error) -> ScreenError {
    ScreenError::Io(
        e.into_io_error()
            .unwrap_or_else(|| io::Error::other("filesystem loop while walking output dir")),
    )
}

fn walk_outside_root(path: &Path) -> ScreenError {
    ScreenError::Io(io::Error::other(format!(
        "walked entry {} escapes output root",
        path.display()
    )))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::Verdict;

    fn scored(file: &str, score: i64, name: &str) -> ScoredResume {
        ScoredResume {
            path: PathBuf::from(format!("/resumes/{file}")),
            assessment: Assessment {
                name: name.to_string(),
                email: format!("{name}@example.com"),
                phone: "555-0100".to_string(),
                score,
                strengths: vec!["rust".to_string(), "distributed systems".to_string()],
                gaps: vec!["kubernetes".to_string()],
                verdict: Verdict::GoodFit,
                reasoning: "Solid backend profile.".to_string(),
            },
        }
    }

    #[test]
    fn test_empty_run_still_writes_headed_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(&[], dir.path(), 10).unwrap();

        let csv = fs::read_to_string(dir.path().join("summary.csv")).unwrap();
        assert_eq!(
            csv.trim(),
            "rank,pdf_file,name,email,phone,score,verdict,strengths,gaps,reasoning"
        );

        let report = fs::read_to_string(dir.path().join("report.md")).unwrap();
        assert!(report.contains("_No resumes scored._"));

        let json = fs::read_to_string(dir.path().join("full_results.json")).unwrap();
        assert_eq!(json.trim(), "[]");
    }

    #[test]
    fn test_summary_csv_covers_all_results_in_rank_order() {
        let dir = tempfile::tempdir().unwrap();
        let ranked = vec![
            scored("alice.pdf", 90, "Alice"),
            scored("bob.pdf", 70, "Bob"),
            scored("carol.pdf", 10, "Carol"),
        ];
        write_artifacts(&ranked, dir.path(), 1).unwrap();

        let csv = fs::read_to_string(dir.path().join("summary.csv")).unwrap();
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows.len(), 4);
        assert!(rows[1].starts_with("1,alice.pdf,Alice"));
        assert!(rows[3].starts_with("3,carol.pdf,Carol"));
        assert!(rows[1].contains("rust; distributed systems"));
    }

    #[test]
    fn test_report_honors_top_k_bound() {
        let dir = tempfile::tempdir().unwrap();
        let ranked = vec![
            scored("alice.pdf", 90, "Alice"),
            scored("bob.pdf", 70, "Bob"),
            scored("carol.pdf", 10, "Carol"),
        ];
        write_artifacts(&ranked, dir.path(), 2).unwrap();

        let report = fs::read_to_string(dir.path().join("report.md")).unwrap();
        assert!(report.contains("## 1. Alice"));
        assert!(report.contains("## 2. Bob"));
        assert!(!report.contains("Carol"));
        assert!(report.contains("- **Contact**: Alice@example.com, 555-0100"));
    }

    #[test]
    fn test_report_falls_back_to_file_name_when_name_missing() {
        let dir = tempfile::tempdir().unwrap();
        let ranked = vec![ScoredResume {
            path: PathBuf::from("/resumes/mystery.pdf"),
            assessment: Assessment::error("Pipeline failed: unreadable"),
        }];
        write_artifacts(&ranked, dir.path(), 5).unwrap();

        let report = fs::read_to_string(dir.path().join("report.md")).unwrap();
        assert!(report.contains("## 1. mystery.pdf"));
        assert!(report.contains("- **Verdict**: Error"));
        assert!(report.contains("- **Reasoning:** Pipeline failed: unreadable"));
        // No contact line for an all-defaults error record.
        assert!(!report.contains("**Contact**"));
    }

    #[test]
    fn test_full_json_carries_all_fields_and_paths() {
        let dir = tempfile::tempdir().unwrap();
        let ranked = vec![scored("alice.pdf", 90, "Alice")];
        write_artifacts(&ranked, dir.path(), 10).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("full_results.json")).unwrap())
                .unwrap();
        let entry = &json.as_array().unwrap()[0];
        assert_eq!(entry["pdf_file"], "alice.pdf");
        assert_eq!(entry["absolute_path"], "/resumes/alice.pdf");
        assert_eq!(entry["score"], 90);
        assert_eq!(entry["verdict"], "Good Fit");
        assert_eq!(entry["strengths"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_bundle_preserves_relative_paths() {
        let root = tempfile::tempdir().unwrap();
        let output_dir = root.path().join("output");
        fs::create_dir_all(output_dir.join("raw")).unwrap();
        fs::write(output_dir.join("summary.csv"), "rank\n").unwrap();
        fs::write(output_dir.join("raw").join("alice.part1.txt"), "{}").unwrap();

        let archive_path = bundle_outputs(root.path(), &output_dir).unwrap();
        assert_eq!(archive_path, root.path().join(ARCHIVE_NAME));

        let mut archive =
            zip::ZipArchive::new(fs::File::open(&archive_path).unwrap()).unwrap();
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        assert!(names.iter().any(|n| n == "output/summary.csv"));
        assert!(names.iter().any(|n| n == "output/raw/alice.part1.txt"));
    }
}
