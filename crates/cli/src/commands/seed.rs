use std::path::{Path, PathBuf};

use requestdesk_store::{seed_data_dir, SeedDataset};

use crate::commands::{load_config, runtime, CommandResult};

pub fn run(config_path: Option<&Path>, with_sample_requests: bool) -> CommandResult {
    let config = match load_config("seed", config_path) {
        Ok(config) => config,
        Err(failure) => return failure,
    };
    let runtime = match runtime("seed") {
        Ok(runtime) => runtime,
        Err(failure) => return failure,
    };

    let dataset = SeedDataset::standard();
    let result = runtime.block_on(seed_data_dir(
        &config.storage.data_dir,
        &dataset,
        with_sample_requests,
    ));

    match result {
        Ok(report) => CommandResult::success(
            "seed",
            render_summary(&config.storage.data_dir, &report.written, &report.skipped),
        ),
        Err(error) => CommandResult::failure("seed", "seed_execution", error.to_string(), 5),
    }
}

fn render_summary(data_dir: &Path, written: &[PathBuf], skipped: &[PathBuf]) -> String {
    let mut lines = vec![format!("data directory `{}` seeded:", data_dir.display())];
    lines.extend(written.iter().map(|path| format!("  - written: {}", file_name(path))));
    lines.extend(
        skipped.iter().map(|path| format!("  - skipped (already present): {}", file_name(path))),
    );
    lines.join("\n")
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::render_summary;

    #[test]
    fn summary_lists_written_then_skipped_files() {
        let summary = render_summary(
            Path::new("data"),
            &[PathBuf::from("data/products.json")],
            &[PathBuf::from("data/requests.json")],
        );

        assert_eq!(
            summary,
            "data directory `data` seeded:\n  - written: products.json\n  - skipped (already present): requests.json"
        );
    }

    #[test]
    fn summary_without_changes_still_names_the_directory() {
        let summary = render_summary(Path::new("/srv/requestdesk"), &[], &[]);

        assert_eq!(summary, "data directory `/srv/requestdesk` seeded:");
    }
}
